//! Shader materials: fixed uniform schemas, per-instance uniform sets, and the
//! registry that maps each material to its program sources.

use crate::error::SceneError;
use glam::{Vec2, Vec3, Vec4};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// The materials a scene can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaterialKind {
    Video,
    Squares,
    Particles,
    Lines,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [Self::Video, Self::Squares, Self::Particles, Self::Lines];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Squares => "squares",
            Self::Particles => "particles",
            Self::Lines => "lines",
        }
    }

    /// Declared uniforms, in binding order.
    pub fn schema(&self) -> &'static [UniformDecl] {
        match self {
            Self::Video => VIDEO_SCHEMA,
            Self::Squares => SQUARES_SCHEMA,
            Self::Particles => PARTICLES_SCHEMA,
            Self::Lines => LINES_SCHEMA,
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    /// A sampled texture bound by the renderer.
    Texture,
}

impl fmt::Display for UniformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Texture => "texture",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Whether a texture is currently bound to the slot.
    Texture(bool),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Texture(_) => UniformType::Texture,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

/// One entry of a material's uniform schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub default: UniformValue,
}

const VIDEO_SCHEMA: &[UniformDecl] = &[
    UniformDecl {
        name: "image",
        default: UniformValue::Texture(false),
    },
    UniformDecl {
        name: "resolution",
        default: UniformValue::Vec4(Vec4::ZERO),
    },
];

const SQUARES_SCHEMA: &[UniformDecl] = &[
    UniformDecl {
        name: "mouse",
        default: UniformValue::Vec3(Vec3::ZERO),
    },
    UniformDecl {
        name: "size",
        default: UniformValue::Vec2(Vec2::ZERO),
    },
    UniformDecl {
        name: "time",
        default: UniformValue::Float(0.0),
    },
];

const PARTICLES_SCHEMA: &[UniformDecl] = &[
    UniformDecl {
        name: "time",
        default: UniformValue::Float(0.0),
    },
    UniformDecl {
        name: "pointSize",
        default: UniformValue::Float(0.012),
    },
];

const LINES_SCHEMA: &[UniformDecl] = &[
    UniformDecl {
        name: "color",
        default: UniformValue::Vec3(Vec3::ONE),
    },
    UniformDecl {
        name: "opacity",
        default: UniformValue::Float(0.1),
    },
];

/// Name→value uniforms owned by one material instance.
///
/// Every write is checked against the material's schema, so a set always
/// holds exactly the declared uniforms with their declared types.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSet {
    material: MaterialKind,
    values: BTreeMap<&'static str, UniformValue>,
}

impl UniformSet {
    /// A set initialized to the schema defaults.
    pub fn new(material: MaterialKind) -> Self {
        let values = material
            .schema()
            .iter()
            .map(|decl| (decl.name, decl.default))
            .collect();
        Self { material, values }
    }

    pub fn material(&self) -> MaterialKind {
        self.material
    }

    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), SceneError> {
        let value = value.into();
        let decl = self
            .material
            .schema()
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SceneError::UnknownUniform {
                material: self.material,
                name: name.to_string(),
            })?;
        if decl.default.ty() != value.ty() {
            return Err(SceneError::UniformType {
                material: self.material,
                name: decl.name,
                expected: decl.default.ty(),
                got: value.ty(),
            });
        }
        self.values.insert(decl.name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    pub fn vec2(&self, name: &str) -> Vec2 {
        match self.get(name) {
            Some(UniformValue::Vec2(v)) => v,
            _ => Vec2::ZERO,
        }
    }

    pub fn vec3(&self, name: &str) -> Vec3 {
        match self.get(name) {
            Some(UniformValue::Vec3(v)) => v,
            _ => Vec3::ZERO,
        }
    }

    pub fn vec4(&self, name: &str) -> Vec4 {
        match self.get(name) {
            Some(UniformValue::Vec4(v)) => v,
            _ => Vec4::ZERO,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, UniformValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Vertex and fragment sources for one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderProgram {
    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Programs for each material, handed explicitly to whoever builds a scene
/// or a renderer.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    programs: BTreeMap<MaterialKind, ShaderProgram>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the program for `kind`.
    pub fn register(&mut self, kind: MaterialKind, program: ShaderProgram) -> &mut Self {
        tracing::debug!(material = %kind, "registered shader program");
        self.programs.insert(kind, program);
        self
    }

    pub fn program(&self, kind: MaterialKind) -> Result<&ShaderProgram, SceneError> {
        self.programs
            .get(&kind)
            .ok_or(SceneError::MaterialNotRegistered(kind))
    }

    pub fn contains(&self, kind: MaterialKind) -> bool {
        self.programs.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = MaterialKind> + '_ {
        self.programs.keys().copied()
    }
}
