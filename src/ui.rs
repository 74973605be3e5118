use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::control::ControlState;
use crate::frame_loop::{LoopState, Tint};
use crate::projector::DepthMode;
use crate::sim::{SimStats, Simulation, StarSettings};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin).add_systems(
            Update,
            (
                panel_toggle,
                tuning_panel.run_if(in_state(LoopState::Running)),
            ),
        );
    }
}

fn panel_toggle(mut settings: ResMut<StarSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_panel = !settings.show_panel;
    }
}

/// Slider over a per-frame rate shown in degrees.
fn rate_slider(ui: &mut egui::Ui, rate: &mut f64, label: &str) {
    let mut degrees = rate.to_degrees();
    if ui
        .add(
            egui::Slider::new(&mut degrees, -5.0..=5.0)
                .clamping(egui::SliderClamping::Never)
                .text(label),
        )
        .changed()
    {
        *rate = degrees.to_radians();
    }
}

/// The slider ranges are only for dragging. Keys keep scale and distance
/// unbounded, so values outside the range are left alone.
fn control_sliders(ui: &mut egui::Ui, control: &mut ControlState) {
    rate_slider(ui, &mut control.yaw, "Yaw (deg/frame)");
    rate_slider(ui, &mut control.pitch, "Pitch (deg/frame)");
    rate_slider(ui, &mut control.roll, "Roll (deg/frame)");
    ui.add(
        egui::Slider::new(&mut control.scale, 0.0..=2000.0)
            .clamping(egui::SliderClamping::Never)
            .text("Scale"),
    );
    ui.add(
        egui::Slider::new(&mut control.distance, -1000.0..=10000.0)
            .clamping(egui::SliderClamping::Never)
            .text("Distance"),
    );
}

fn tuning_panel(
    mut contexts: EguiContexts,
    settings: Res<StarSettings>,
    mut sim: ResMut<Simulation>,
    stats: Res<SimStats>,
    diagnostics: Res<DiagnosticsStore>,
) {
    if !settings.show_panel {
        return;
    }

    egui::Window::new("Starfield").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("Stars: {}", sim.field().len()));
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        ui.label(format!(
            "Frame {}  drawn {}  skipped {}",
            stats.frame, stats.projection.drawn, stats.projection.skipped
        ));
        if !sim.depth.is_empty() {
            ui.label(format!("Depth: {:.0} .. {:.0}", sim.depth.min, sim.depth.max));
        }

        ui.separator();

        let control = &mut sim.control;
        control_sliders(ui, control);

        ui.horizontal(|ui| {
            if ui.button("Freeze").clicked() {
                control.freeze();
            }
            if ui.button("Regenerate").clicked() {
                control.regenerate = true;
            }
        });

        ui.separator();

        let config = &mut sim.config;
        egui::ComboBox::from_label("Tint")
            .selected_text(format!("{:?}", config.tint))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut config.tint, Tint::Grayscale, "Grayscale");
                ui.selectable_value(&mut config.tint, Tint::Amber, "Amber");
            });

        let mode = &mut config.projector.mode;
        let mut decaying = matches!(mode, DepthMode::Decaying { .. });
        if ui.checkbox(&mut decaying, "Decaying depth range").changed() {
            *mode = if decaying {
                DepthMode::Decaying { rate: 0.05 }
            } else {
                DepthMode::Cumulative
            };
        }
        if let DepthMode::Decaying { rate } = mode {
            ui.add(egui::Slider::new(rate, 0.0..=1.0).text("Decay rate"));
        }

        ui.separator();
        ui.label("Arrows: pitch/yaw   Q/E: roll");
        ui.label("+/-: scale   PgUp/PgDn: distance");
        ui.label("Space: freeze   R: regenerate   H: panel   Esc: quit");
    });
}
