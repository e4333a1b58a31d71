use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which family of control edits a setting.
///
/// Only colors need an explicit kind; every other control is chosen from the
/// value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    #[default]
    Value,
    Color,
}

/// Current value of a setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a `#rrggbb` text value into linear 0..1 channels.
    pub fn as_color(&self) -> Option<[f32; 3]> {
        self.as_text().and_then(parse_hex_color)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
        }
    }
}

/// One tunable entry: its value plus the bounds of the control editing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub value: SettingValue,
    #[serde(default)]
    pub kind: SettingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl Setting {
    pub fn number(value: f64) -> Self {
        Self {
            value: SettingValue::Number(value),
            kind: SettingKind::Value,
            min: None,
            max: None,
            step: None,
        }
    }

    pub fn toggle(value: bool) -> Self {
        Self {
            value: SettingValue::Bool(value),
            ..Self::number(0.0)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: SettingValue::Text(value.into()),
            ..Self::number(0.0)
        }
    }

    /// A color setting holding a `#rrggbb` string.
    pub fn color(hex: impl Into<String>) -> Self {
        Self {
            value: SettingValue::Text(hex.into()),
            kind: SettingKind::Color,
            ..Self::number(0.0)
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

/// Named settings, ordered by name so panels lay out deterministically.
///
/// Equality is structural: two descriptions built separately with the same
/// entries compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDescription {
    entries: BTreeMap<String, Setting>,
}

impl SettingsDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, setting: Setting) -> Self {
        self.insert(name, setting);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, setting: Setting) -> Option<Setting> {
        self.entries.insert(name.into(), setting)
    }

    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merged(&self, other: &SettingsDescription) -> Self {
        let mut entries = self.entries.clone();
        for (k, v) in &other.entries {
            entries.insert(k.clone(), v.clone());
        }
        Self { entries }
    }
}

/// Parse `#rrggbb` or `#rgb` (leading `#` optional) into 0..1 channels.
pub fn parse_hex_color(s: &str) -> Option<[f32; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |h: &str| u8::from_str_radix(h, 16).ok().map(|v| v as f32 / 255.0);
    match hex.len() {
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ]),
        3 => {
            let mut out = [0.0; 3];
            for (i, c) in hex.chars().enumerate() {
                let doubled: String = [c, c].iter().collect();
                out[i] = channel(&doubled)?;
            }
            Some(out)
        }
        _ => None,
    }
}

/// Format 0..1 channels as lowercase `#rrggbb`.
pub fn format_hex_color(rgb: [f32; 3]) -> String {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(rgb[0]),
        to_byte(rgb[1]),
        to_byte(rgb[2])
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_six_and_three_digit_hex() {
        assert_eq!(parse_hex_color("#ffffff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("000000"), Some([0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#f00"), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn multibyte_input_is_rejected_not_sliced() {
        // Six bytes, five chars: would split 'é' if sliced by byte offsets.
        assert_eq!(parse_hex_color("aé000"), None);
        assert_eq!(parse_hex_color("#aé000"), None);
        assert_eq!(parse_hex_color("#é0"), None);
        assert_eq!(Setting::color("aé000").value.as_color(), None);
    }

    #[test]
    fn format_round_trips_through_parse() {
        let hex = format_hex_color([1.0, 0.5, 0.0]);
        assert_eq!(hex, "#ff8000");
        assert_eq!(format_hex_color(parse_hex_color("#3366cc").unwrap()), "#3366cc");
    }

    #[test]
    fn descriptions_compare_by_value() {
        let a = SettingsDescription::new()
            .with("speed", Setting::number(1.0).with_range(0.0, 2.0))
            .with("tint", Setting::color("#ff0000"));
        let b = SettingsDescription::new()
            .with("tint", Setting::color("#ff0000"))
            .with("speed", Setting::number(1.0).with_range(0.0, 2.0));
        assert_eq!(a, b);

        let c = b.clone().with("speed", Setting::number(1.5).with_range(0.0, 2.0));
        assert_ne!(a, c);
    }

    #[test]
    fn merged_prefers_overrides() {
        let base = SettingsDescription::new()
            .with("a", Setting::number(1.0))
            .with("b", Setting::toggle(true));
        let overrides = SettingsDescription::new().with("a", Setting::number(5.0));
        let merged = base.merged(&overrides);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("a").unwrap().value, SettingValue::Number(5.0));
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r##"
timeScale:
  value: 1.0
  min: 0.0
  max: 4.0
  step: 0.01
clearColor:
  value: "#000000"
  kind: color
label:
  value: hello
enabled:
  value: true
"##;
        let desc: SettingsDescription = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(desc.len(), 4);
        let clear = desc.get("clearColor").unwrap();
        assert_eq!(clear.kind, SettingKind::Color);
        assert_eq!(clear.value.as_color(), Some([0.0, 0.0, 0.0]));
        assert_eq!(desc.get("timeScale").unwrap().step, Some(0.01));
        assert_eq!(desc.get("enabled").unwrap().value, SettingValue::Bool(true));
        assert_eq!(desc.get("label").unwrap().value.as_text(), Some("hello"));
    }
}
