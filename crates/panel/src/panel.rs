use crate::settings::{Setting, SettingKind, SettingValue, SettingsDescription, format_hex_color};
use std::collections::BTreeMap;

/// A widget the panel asks its host toolkit to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    ColorPicker {
        key: String,
    },
    Checkbox {
        key: String,
    },
    /// Bounded number.
    Slider {
        key: String,
        min: f64,
        max: f64,
        step: Option<f64>,
    },
    /// Number missing at least one bound.
    DragValue {
        key: String,
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
    },
    TextField {
        key: String,
    },
}

impl Control {
    fn for_setting(key: &str, setting: &Setting) -> Self {
        let key = key.to_string();
        if setting.kind == SettingKind::Color {
            return Self::ColorPicker { key };
        }
        match (&setting.value, setting.min, setting.max) {
            (SettingValue::Bool(_), _, _) => Self::Checkbox { key },
            (SettingValue::Number(_), Some(min), Some(max)) => Self::Slider {
                key,
                min,
                max,
                step: setting.step,
            },
            (SettingValue::Number(_), min, max) => Self::DragValue {
                key,
                min,
                max,
                step: setting.step,
            },
            (SettingValue::Text(_), _, _) => Self::TextField { key },
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::ColorPicker { key }
            | Self::Checkbox { key }
            | Self::Slider { key, .. }
            | Self::DragValue { key, .. }
            | Self::TextField { key } => key,
        }
    }
}

/// An accepted edit, or a value re-announced after a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub value: SettingValue,
}

/// Errors from panel edits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PanelError {
    #[error("no panel instance is mounted")]
    NotMounted,
    #[error("unknown setting: {0}")]
    UnknownSetting(String),
    #[error("setting {key} expects a {expected} value, got {got}")]
    KindMismatch {
        key: String,
        expected: &'static str,
        got: &'static str,
    },
    #[error("setting {key}: {value:?} is not a #rrggbb color")]
    InvalidColor { key: String, value: String },
}

/// One mounted panel: its controls and the backing values they edit.
#[derive(Debug)]
struct PanelInstance {
    id: u64,
    controls: Vec<Control>,
    values: BTreeMap<String, SettingValue>,
}

impl PanelInstance {
    fn build(id: u64, description: &SettingsDescription) -> Self {
        let mut controls = Vec::with_capacity(description.len());
        let mut values = BTreeMap::new();
        for (key, setting) in description.iter() {
            controls.push(Control::for_setting(key, setting));
            values.insert(key.to_string(), setting.value.clone());
        }
        Self {
            id,
            controls,
            values,
        }
    }
}

/// Debug panel adapter.
///
/// Call [`DebugPanel::sync`] with the current description as often as you like
/// (every frame is fine): the instance is only torn down and rebuilt when the
/// description differs by value from the one it was built from. Toolkit code
/// draws [`DebugPanel::controls`] and reports edits through
/// [`DebugPanel::edit`]; the renderer drains [`SettingChange`]s.
#[derive(Debug, Default)]
pub struct DebugPanel {
    description: Option<SettingsDescription>,
    instance: Option<PanelInstance>,
    next_instance_id: u64,
    changes: Vec<SettingChange>,
}

impl DebugPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount or rebuild the panel for `description`. Returns whether a new
    /// instance was created.
    ///
    /// A rebuild resets every value to the description's value and queues a
    /// change for each one.
    pub fn sync(&mut self, description: &SettingsDescription) -> bool {
        if self.description.as_ref() == Some(description) {
            return false;
        }

        self.unmount();

        let instance = PanelInstance::build(self.next_instance_id, description);
        self.next_instance_id += 1;
        self.changes
            .extend(instance.values.iter().map(|(key, value)| SettingChange {
                key: key.clone(),
                value: value.clone(),
            }));
        tracing::info!(
            instance = instance.id,
            controls = instance.controls.len(),
            "debug panel created"
        );
        self.instance = Some(instance);
        self.description = Some(description.clone());
        true
    }

    /// Destroy the mounted instance, if any.
    pub fn unmount(&mut self) {
        if let Some(old) = self.instance.take() {
            tracing::debug!(instance = old.id, "debug panel destroyed");
        }
        self.description = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    pub fn instance_id(&self) -> Option<u64> {
        self.instance.as_ref().map(|i| i.id)
    }

    pub fn controls(&self) -> &[Control] {
        self.instance
            .as_ref()
            .map(|i| i.controls.as_slice())
            .unwrap_or(&[])
    }

    pub fn value(&self, key: &str) -> Option<&SettingValue> {
        self.instance.as_ref().and_then(|i| i.values.get(key))
    }

    /// Apply an edit from the host toolkit.
    ///
    /// Numbers are snapped to the setting's step and clamped to its bounds;
    /// colors are normalized to lowercase `#rrggbb`. Returns `Ok(true)` when
    /// the stored value changed and a [`SettingChange`] was queued.
    pub fn edit(&mut self, key: &str, value: SettingValue) -> Result<bool, PanelError> {
        let description = self.description.as_ref().ok_or(PanelError::NotMounted)?;
        let instance = self.instance.as_mut().ok_or(PanelError::NotMounted)?;
        let setting = description
            .get(key)
            .ok_or_else(|| PanelError::UnknownSetting(key.to_string()))?;

        let normalized = normalize(key, setting, value)?;
        let slot = instance
            .values
            .get_mut(key)
            .ok_or_else(|| PanelError::UnknownSetting(key.to_string()))?;
        if *slot == normalized {
            return Ok(false);
        }

        *slot = normalized.clone();
        tracing::debug!(key, value = ?normalized, "setting edited");
        self.changes.push(SettingChange {
            key: key.to_string(),
            value: normalized,
        });
        Ok(true)
    }

    /// Take every queued change, oldest first.
    pub fn drain_changes(&mut self) -> Vec<SettingChange> {
        std::mem::take(&mut self.changes)
    }
}

fn normalize(key: &str, setting: &Setting, value: SettingValue) -> Result<SettingValue, PanelError> {
    if setting.kind == SettingKind::Color {
        let text = match &value {
            SettingValue::Text(t) => t,
            other => {
                return Err(PanelError::KindMismatch {
                    key: key.to_string(),
                    expected: "color",
                    got: other.type_name(),
                });
            }
        };
        let rgb = crate::parse_hex_color(text).ok_or_else(|| PanelError::InvalidColor {
            key: key.to_string(),
            value: text.clone(),
        })?;
        return Ok(SettingValue::Text(format_hex_color(rgb)));
    }

    let expected = setting.value.type_name();
    if expected != value.type_name() {
        return Err(PanelError::KindMismatch {
            key: key.to_string(),
            expected,
            got: value.type_name(),
        });
    }

    match value {
        SettingValue::Number(n) => Ok(SettingValue::Number(constrain(
            n,
            setting.min,
            setting.max,
            setting.step,
        ))),
        other => Ok(other),
    }
}

/// Clamp to bounds, then snap to the nearest multiple of `step`.
fn constrain(value: f64, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> f64 {
    let clamp = |v: f64| {
        let v = min.map_or(v, |m| v.max(m));
        max.map_or(v, |m| v.min(m))
    };
    let mut v = clamp(value);
    if let Some(step) = step.filter(|s| *s > 0.0) {
        let factor = 10f64.powi(decimals(step) as i32);
        v = ((v / step).round() * step * factor).round() / factor;
        v = clamp(v);
    }
    v
}

/// Number of fractional digits in `step` as written, e.g. 0.01 -> 2.
fn decimals(step: f64) -> usize {
    let text = format!("{step}");
    text.split_once('.').map_or(0, |(_, frac)| frac.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description() -> SettingsDescription {
        SettingsDescription::new()
            .with(
                "timeScale",
                Setting::number(1.0).with_range(0.0, 4.0).with_step(0.01),
            )
            .with("radius", Setting::number(0.5).with_step(0.1))
            .with("clearColor", Setting::color("#000000"))
            .with("paused", Setting::toggle(false))
            .with("title", Setting::text("backdrop"))
    }

    #[test]
    fn controls_follow_kind_and_bounds() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        let controls = panel.controls();
        assert_eq!(controls.len(), 5);

        let find = |k: &str| controls.iter().find(|c| c.key() == k).unwrap().clone();
        assert_eq!(
            find("clearColor"),
            Control::ColorPicker {
                key: "clearColor".into()
            }
        );
        assert!(matches!(find("timeScale"), Control::Slider { min, max, .. } if min == 0.0 && max == 4.0));
        assert!(matches!(find("radius"), Control::DragValue { min: None, max: None, step: Some(_), .. }));
        assert!(matches!(find("paused"), Control::Checkbox { .. }));
        assert!(matches!(find("title"), Control::TextField { .. }));
    }

    #[test]
    fn rebuilds_only_on_deep_change() {
        let mut panel = DebugPanel::new();
        assert!(panel.sync(&description()));
        let first = panel.instance_id();

        // Same value, different allocation: no rebuild.
        assert!(!panel.sync(&description()));
        assert!(!panel.sync(&description().clone()));
        assert_eq!(panel.instance_id(), first);

        let changed = description().with("radius", Setting::number(0.75).with_step(0.1));
        assert!(panel.sync(&changed));
        assert_ne!(panel.instance_id(), first);
        assert_eq!(panel.value("radius"), Some(&SettingValue::Number(0.75)));
    }

    #[test]
    fn rebuild_announces_every_value() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        let changes = panel.drain_changes();
        assert_eq!(changes.len(), 5);
        assert!(panel.drain_changes().is_empty());

        panel.sync(&description());
        assert!(panel.drain_changes().is_empty());
    }

    #[test]
    fn rebuild_discards_edits() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        panel.edit("timeScale", SettingValue::Number(2.0)).unwrap();

        let changed = description().with("title", Setting::text("other"));
        panel.sync(&changed);
        assert_eq!(panel.value("timeScale"), Some(&SettingValue::Number(1.0)));
    }

    #[test]
    fn numeric_edits_are_snapped_and_clamped() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        panel.drain_changes();

        assert!(panel.edit("timeScale", SettingValue::Number(9.0)).unwrap());
        assert_eq!(panel.value("timeScale"), Some(&SettingValue::Number(4.0)));

        panel.edit("timeScale", SettingValue::Number(1.23456)).unwrap();
        assert_eq!(panel.value("timeScale"), Some(&SettingValue::Number(1.23)));

        panel.edit("radius", SettingValue::Number(0.27)).unwrap();
        assert_eq!(panel.value("radius"), Some(&SettingValue::Number(0.3)));

        let changes = panel.drain_changes();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].key, "timeScale");
    }

    #[test]
    fn unchanged_edit_queues_nothing() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        panel.drain_changes();
        assert!(!panel.edit("paused", SettingValue::Bool(false)).unwrap());
        assert!(panel.drain_changes().is_empty());
    }

    #[test]
    fn colors_are_validated_and_normalized() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        panel
            .edit("clearColor", SettingValue::Text("#F00".into()))
            .unwrap();
        assert_eq!(
            panel.value("clearColor"),
            Some(&SettingValue::Text("#ff0000".into()))
        );

        let err = panel
            .edit("clearColor", SettingValue::Text("red".into()))
            .unwrap_err();
        assert!(matches!(err, PanelError::InvalidColor { .. }));
        let err = panel
            .edit("clearColor", SettingValue::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, PanelError::KindMismatch { expected: "color", .. }));
    }

    #[test]
    fn rejects_unknown_and_mismatched_edits() {
        let mut panel = DebugPanel::new();
        assert_eq!(
            panel.edit("timeScale", SettingValue::Number(1.0)),
            Err(PanelError::NotMounted)
        );
        panel.sync(&description());
        assert!(matches!(
            panel.edit("nope", SettingValue::Number(1.0)),
            Err(PanelError::UnknownSetting(_))
        ));
        assert!(matches!(
            panel.edit("timeScale", SettingValue::Bool(true)),
            Err(PanelError::KindMismatch { .. })
        ));
    }

    #[test]
    fn unmount_then_sync_rebuilds() {
        let mut panel = DebugPanel::new();
        panel.sync(&description());
        panel.unmount();
        assert!(!panel.is_mounted());
        assert!(panel.controls().is_empty());
        assert!(panel.sync(&description()));
    }

    #[test]
    fn step_decimals() {
        assert_eq!(decimals(0.01), 2);
        assert_eq!(decimals(1.0), 0);
        assert_eq!(decimals(0.001), 3);
        assert_eq!(constrain(0.30000000000000004, None, None, Some(0.1)), 0.3);
    }
}
