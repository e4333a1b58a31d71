//! Scene configuration, loadable from YAML.

use crate::camera::fov_for;
use crate::layout::GridLayout;
use crate::settings::default_settings;
use backdrop_panel::SettingsDescription;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which composition to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Video, squares, particles and grid lines, with pointer parallax.
    #[default]
    Full,
    /// Video and squares only, no parallax.
    Minimal,
}

impl Variant {
    /// Height of the slab the camera keeps in view. The full variant zooms
    /// in a little so parallax rotation never reveals the plane edges.
    pub fn virtual_height(&self) -> f32 {
        match self {
            Self::Full => 0.8,
            Self::Minimal => 1.0,
        }
    }

    pub fn has_overlays(&self) -> bool {
        matches!(self, Self::Full)
    }

    pub fn has_parallax(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl std::str::FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "minimal" => Ok(Self::Minimal),
            other => Err(ConfigError::Invalid(format!("unknown variant {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: usize,
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 40,
            cell_size: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Field of view before the first layout, in degrees.
    pub fov: f32,
    /// Overrides the variant's virtual height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_height: Option<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 2.0],
            fov: 70.0,
            virtual_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Directory of frames. `None` plays the built-in test pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub fps: f32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            path: None,
            fps: 30.0,
        }
    }
}

/// Everything needed to build a [`crate::Scene`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub variant: Variant,
    pub grid: GridConfig,
    pub camera: CameraConfig,
    pub video: VideoConfig,
    /// Seed for per-square random values.
    pub seed: u64,
    /// Overrides and additions to the built-in debug settings.
    #[serde(skip_serializing_if = "SettingsDescription::is_empty")]
    pub settings: SettingsDescription,
}

/// Errors from loading or validating a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SceneConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), variant = ?config.variant, "loaded scene config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.size == 0 {
            return Err(ConfigError::Invalid("grid.size must be positive".into()));
        }
        if !positive(self.grid.cell_size) {
            return Err(ConfigError::Invalid("grid.cell_size must be positive".into()));
        }
        if !positive(self.video.fps) {
            return Err(ConfigError::Invalid("video.fps must be positive".into()));
        }
        if self.camera_distance() <= f32::EPSILON {
            return Err(ConfigError::Invalid(
                "camera.position must not be at the origin".into(),
            ));
        }
        if !(0.0..180.0).contains(&self.camera.fov) {
            return Err(ConfigError::Invalid("camera.fov must be in 0..180".into()));
        }
        if let Some(h) = self.camera.virtual_height {
            if !positive(h) {
                return Err(ConfigError::Invalid(
                    "camera.virtual_height must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout::new(self.grid.size, self.grid.cell_size)
    }

    pub fn virtual_height(&self) -> f32 {
        self.camera
            .virtual_height
            .unwrap_or_else(|| self.variant.virtual_height())
    }

    pub fn camera_distance(&self) -> f32 {
        let [x, y, z] = self.camera.position;
        glam::Vec3::new(x, y, z).length()
    }

    /// Field of view the camera settles on after its first layout.
    pub fn settled_fov(&self) -> f32 {
        fov_for(self.virtual_height(), self.camera_distance())
    }

    /// Built-in settings with this config's overrides applied.
    pub fn settings(&self) -> SettingsDescription {
        default_settings().merged(&self.settings)
    }
}

/// False for zero, negatives and NaN.
fn positive(v: f32) -> bool {
    v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_panel::SettingValue;

    #[test]
    fn empty_yaml_is_the_default_scene() {
        let config = SceneConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.layout(), GridLayout::new(40, 0.08));
        assert_eq!(config.virtual_height(), 0.8);
        assert_eq!(config.camera_distance(), 2.0);
    }

    #[test]
    fn parses_partial_config() {
        let yaml = r##"
variant: minimal
grid:
  size: 10
video:
  path: ./frames
  fps: 24
settings:
  timeScale:
    value: 2.0
    min: 0
    max: 8
"##;
        let config = SceneConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.variant, Variant::Minimal);
        assert_eq!(config.grid.size, 10);
        assert_eq!(config.grid.cell_size, 0.08);
        assert_eq!(config.video.path.as_deref(), Some(Path::new("./frames")));
        assert_eq!(config.virtual_height(), 1.0);

        let settings = config.settings();
        assert_eq!(
            settings.get("timeScale").unwrap().value,
            SettingValue::Number(2.0)
        );
        assert!(settings.get("clearColor").is_some());
    }

    #[test]
    fn rejects_invalid_values() {
        for yaml in [
            "grid: { size: 0 }",
            "grid: { cell_size: -1.0 }",
            "video: { fps: 0 }",
            "camera: { position: [0, 0, 0] }",
            "camera: { virtual_height: 0 }",
        ] {
            let err = SceneConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}: {err}");
        }
        assert!(matches!(
            SceneConfig::from_yaml_str("variant: sideways"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_reads_file_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        let config = SceneConfig {
            variant: Variant::Minimal,
            seed: 9,
            ..SceneConfig::default()
        };
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();

        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let missing = SceneConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn variant_from_str() {
        assert_eq!("FULL".parse::<Variant>().unwrap(), Variant::Full);
        assert_eq!("minimal".parse::<Variant>().unwrap(), Variant::Minimal);
        assert!("other".parse::<Variant>().is_err());
    }
}
