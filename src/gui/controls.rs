//! View controls module.
//!
//! This module handles the rendering and interaction of the bottom panel:
//! zoom buttons and presets, fit-to-data, gap collapse tuning, and a summary
//! of the current segmentation.

use eframe::egui;

use crate::core::config::LayoutSettings;
use crate::core::view::{ViewState, ZOOM_OPTIONS};

/// Percent of the view width moved by one keyboard pan step.
pub const PAN_STEP_PERCENT: f64 = 10.0;

/// User actions that can be triggered from the controls panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Zoom in one step
    ZoomIn,
    /// Zoom out one step
    ZoomOut,
    /// Jump to a preset zoom level
    SetZoom(f64),
    /// Shift the view by a percentage of its width
    PanBy(f64),
    /// Reset zoom and pan so all events fit
    FitToData,
    /// Apply edited layout constants
    SetLayout(LayoutSettings),
}

/// Segmentation numbers shown next to the controls.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimelineStats {
    pub events: usize,
    pub scheduled: usize,
    pub segments: usize,
    pub collapsed: usize,
    pub collapsible: usize,
    /// First and last scheduled time
    pub covered_span: Option<(i64, i64)>,
    pub data_range: f64,
    pub adjusted_range: f64,
}

/// Renders view controls and returns any actions triggered by user interaction.
pub struct ControlsRenderer<'a> {
    /// Whether controls should be enabled
    enabled: bool,
    view: &'a ViewState,
    layout: LayoutSettings,
    stats: TimelineStats,
}

impl<'a> ControlsRenderer<'a> {
    pub fn new(
        enabled: bool,
        view: &'a ViewState,
        layout: LayoutSettings,
        stats: TimelineStats,
    ) -> Self {
        Self {
            enabled,
            view,
            layout,
            stats,
        }
    }

    /// Render the controls and return any triggered action.
    pub fn render(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.vertical(|ui| {
            ui.horizontal(|ui| {
                action = self.render_zoom_buttons(ui).or(action);
                ui.separator();
                action = self.render_zoom_presets(ui).or(action);
                ui.separator();
                self.render_view_readout(ui);
            });

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                action = self.render_layout_tuning(ui).or(action);
                ui.separator();
                self.render_stats(ui);
            });
        });

        action
    }

    fn render_zoom_buttons(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            if ui.button("◀").on_hover_text("Pan left (←)").clicked() {
                action = Some(ControlAction::PanBy(PAN_STEP_PERCENT));
            }
            if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
                action = Some(ControlAction::ZoomOut);
            }
            if ui
                .button("⛶ Fit")
                .on_hover_text("Fit all events (0)")
                .clicked()
            {
                action = Some(ControlAction::FitToData);
            }
            if ui.button("+").on_hover_text("Zoom in (+)").clicked() {
                action = Some(ControlAction::ZoomIn);
            }
            if ui.button("▶").on_hover_text("Pan right (→)").clicked() {
                action = Some(ControlAction::PanBy(-PAN_STEP_PERCENT));
            }
        });

        action
    }

    fn render_zoom_presets(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut action: Option<ControlAction> = None;

        ui.add_enabled_ui(self.enabled, |ui| {
            ui.label("Zoom:");
            let current = self.view.zoom_level;
            egui::ComboBox::from_id_salt("zoom_combo")
                .selected_text(format!("{:.2}x", current))
                .width(70.0)
                .show_ui(ui, |ui| {
                    for &zoom in ZOOM_OPTIONS {
                        if ui
                            .selectable_label((current - zoom).abs() < 1e-6, format!("{}x", zoom))
                            .clicked()
                        {
                            action = Some(ControlAction::SetZoom(zoom));
                        }
                    }
                });
        });

        action
    }

    fn render_view_readout(&self, ui: &mut egui::Ui) {
        ui.label(format!("Pan: {:+.1}%", self.view.pan_offset));
        if self.view.is_fit() {
            ui.weak("(fit)");
        }
    }

    fn render_layout_tuning(&self, ui: &mut egui::Ui) -> Option<ControlAction> {
        let mut layout = self.layout;

        ui.add_enabled_ui(self.enabled, |ui| {
            ui.label("Collapse above:");
            ui.add(
                egui::DragValue::new(&mut layout.collapse_threshold_multiplier)
                    .range(1.0..=100.0)
                    .speed(0.1)
                    .suffix("× avg"),
            )
            .on_hover_text("Gaps longer than this multiple of the neighbouring durations collapse");
            ui.label("Gap width:");
            ui.add(
                egui::DragValue::new(&mut layout.collapsed_width_px)
                    .range(10.0..=400.0)
                    .speed(1.0)
                    .suffix(" px"),
            );
        });

        (layout != self.layout).then_some(ControlAction::SetLayout(layout))
    }

    fn render_stats(&self, ui: &mut egui::Ui) {
        let stats = &self.stats;
        ui.label(format!(
            "Events: {} ({} scheduled) | Segments: {} | Collapsed gaps: {} / {}",
            stats.events, stats.scheduled, stats.segments, stats.collapsed, stats.collapsible
        ));
        if let Some((start, end)) = stats.covered_span {
            ui.separator();
            ui.label(format!("Span: {} → {}", start, end));
        }
        ui.separator();
        ui.label(format!(
            "Range: {:.0} → {:.0} shown",
            stats.data_range, stats.adjusted_range
        ));
    }
}
