//! egui view of the debug panel.

use backdrop_panel::{Control, DebugPanel, SettingValue, format_hex_color};
use egui::Context as EguiContext;

/// Read-only facts shown under the controls.
pub struct Status {
    pub variant: String,
    pub time: f32,
    pub fov: f32,
    pub distance: f32,
    pub layers: String,
}

/// Draw one widget per control. Edits go through [`DebugPanel::edit`], which
/// queues them for the scene.
pub fn settings_window(ctx: &EguiContext, panel: &mut DebugPanel, status: &Status) {
    egui::Window::new("Settings")
        .default_pos([12.0, 12.0])
        .default_width(260.0)
        .resizable(false)
        .show(ctx, |ui| {
            if !panel.is_mounted() {
                ui.label("No settings");
                return;
            }
            for control in panel.controls().to_vec() {
                if let Some(value) = control_row(ui, panel, &control) {
                    if let Err(e) = panel.edit(control.key(), value) {
                        tracing::warn!("rejected edit: {e}");
                    }
                }
            }

            ui.separator();
            ui.label(format!("Variant: {}", status.variant));
            ui.label(format!("Time: {:.2}s", status.time));
            ui.label(format!(
                "Camera: fov {:.1}°  distance {:.2}",
                status.fov, status.distance
            ));
            ui.label(format!("Layers: {}", status.layers));
            ui.separator();
            ui.small("F1: Toggle Panel | F5: Reload Config | LMB: Orbit | Wheel: Zoom");
        });
}

/// Draw the widget for `control`; returns the new value if the user changed it.
fn control_row(ui: &mut egui::Ui, panel: &DebugPanel, control: &Control) -> Option<SettingValue> {
    let key = control.key();
    let current = panel.value(key)?;
    match control {
        Control::ColorPicker { .. } => {
            let rgb = current.as_color().unwrap_or([0.0; 3]);
            let mut bytes = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            let changed = ui
                .horizontal(|ui| {
                    let changed = ui.color_edit_button_srgb(&mut bytes).changed();
                    ui.label(key);
                    changed
                })
                .inner;
            changed.then(|| SettingValue::Text(format_hex_color(bytes.map(|b| b as f32 / 255.0))))
        }
        Control::Checkbox { .. } => {
            let mut on = current.as_bool()?;
            ui.checkbox(&mut on, key)
                .changed()
                .then_some(SettingValue::Bool(on))
        }
        Control::Slider {
            min, max, step, ..
        } => {
            let mut v = current.as_number()?;
            let mut slider = egui::Slider::new(&mut v, *min..=*max).text(key);
            if let Some(step) = step {
                slider = slider.step_by(*step);
            }
            ui.add(slider)
                .changed()
                .then_some(SettingValue::Number(v))
        }
        Control::DragValue {
            min, max, step, ..
        } => {
            let mut v = current.as_number()?;
            let range = min.unwrap_or(f64::NEG_INFINITY)..=max.unwrap_or(f64::INFINITY);
            ui.horizontal(|ui| {
                let changed = ui
                    .add(
                        egui::DragValue::new(&mut v)
                            .speed(step.unwrap_or(0.01))
                            .range(range),
                    )
                    .changed();
                ui.label(key);
                changed
            })
            .inner
            .then_some(SettingValue::Number(v))
        }
        Control::TextField { .. } => {
            let mut text = current.as_text()?.to_string();
            ui.horizontal(|ui| {
                let changed = ui.text_edit_singleline(&mut text).changed();
                ui.label(key);
                changed
            })
            .inner
            .then_some(SettingValue::Text(text))
        }
    }
}

/// Centered placeholder shown until the video can play.
pub fn loading(ctx: &EguiContext) {
    egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Loading…").heading().color(egui::Color32::WHITE));
        });
}
