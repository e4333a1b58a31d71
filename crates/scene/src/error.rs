use crate::material::{MaterialKind, UniformType};

/// Errors from scene construction and uniform writes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("invalid scene config: {0}")]
    InvalidConfig(String),
    #[error("no shader program registered for the {0} material")]
    MaterialNotRegistered(MaterialKind),
    #[error("{material} material has no uniform named {name:?}")]
    UnknownUniform {
        material: MaterialKind,
        name: String,
    },
    #[error("{material}.{name} is a {expected} uniform, got {got}")]
    UniformType {
        material: MaterialKind,
        name: &'static str,
        expected: UniformType,
        got: UniformType,
    },
}
