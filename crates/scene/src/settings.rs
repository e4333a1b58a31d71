//! Names and defaults of the settings the scene understands.

use backdrop_panel::{Setting, SettingsDescription};

pub const TIME_SCALE: &str = "timeScale";
pub const PARALLAX: &str = "parallax";
pub const LINE_OPACITY: &str = "lineOpacity";
pub const POINT_SIZE: &str = "pointSize";
pub const CLEAR_COLOR: &str = "clearColor";

/// Settings exposed on the debug panel unless a config overrides them.
pub fn default_settings() -> SettingsDescription {
    SettingsDescription::new()
        .with(
            TIME_SCALE,
            Setting::number(1.0).with_range(0.0, 4.0).with_step(0.01),
        )
        .with(
            PARALLAX,
            Setting::number(0.1).with_range(0.0, 0.5).with_step(0.01),
        )
        .with(
            LINE_OPACITY,
            Setting::number(0.1).with_range(0.0, 1.0).with_step(0.01),
        )
        .with(
            POINT_SIZE,
            Setting::number(0.012).with_range(0.0, 0.05).with_step(0.001),
        )
        .with(CLEAR_COLOR, Setting::color("#000000"))
}
