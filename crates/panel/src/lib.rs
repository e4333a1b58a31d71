//! Debug Panel: live tuning of scene settings, independent of any GUI toolkit.
//!
//! A [`SettingsDescription`] declares each tunable value together with the
//! kind of control that edits it. A [`DebugPanel`] turns that description into
//! a set of [`Control`]s, holds the backing values, and reports every edit as a
//! [`SettingChange`] for the renderer to apply.
//!
//! # Invariants
//! - The panel instance is rebuilt only when the description changes by value.
//! - Edits never bypass the change queue; consumers see every accepted edit.

mod panel;
mod settings;

pub use panel::{Control, DebugPanel, PanelError, SettingChange};
pub use settings::{
    Setting, SettingKind, SettingValue, SettingsDescription, format_hex_color, parse_hex_color,
};

pub fn crate_info() -> &'static str {
    "backdrop-panel v0.1.0"
}
