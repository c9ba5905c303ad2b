//! Main application state and GUI logic.
//!
//! This module defines the main application struct and implements the eframe::App trait
//! to provide the core GUI functionality for the timeline viewer.

use eframe::egui;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::collapse::CollapseEngine;
use crate::core::config::AppSettings;
use crate::core::error::{self, AppError};
use crate::core::event::EventTimeline;
use crate::core::label::{self, LabelFormatter};
use crate::core::layout::LayoutCache;
use crate::core::parser;
use crate::core::view::ViewState;

use super::controls::{ControlAction, ControlsRenderer, PAN_STEP_PERCENT, TimelineStats};
use super::dialogs::{ErrorDialogAction, ErrorDialogRenderer, ErrorDialogState};
use super::timeline::{TimelineAction, TimelineRenderer};

/// Application state indicating the current loading status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AppState {
    /// No file has been loaded yet (initial state)
    #[default]
    NoFileLoaded,
    /// A timeline is loaded and shown
    Ready,
}

impl AppState {
    /// Returns true if view controls should be enabled.
    pub fn controls_enabled(&self) -> bool {
        matches!(self, AppState::Ready)
    }
}

/// Kind of status message to display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusKind {
    /// Success message (shown in green)
    Success,
    /// Error message (shown in red)
    Error,
}

/// A status message with its kind and timestamp.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    /// When the message was created (for auto-dismiss)
    pub created_at: std::time::Instant,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: std::time::Instant::now(),
        }
    }

    /// Duration to show status messages before auto-dismissing.
    const DISPLAY_DURATION: std::time::Duration = std::time::Duration::from_secs(5);

    pub fn is_visible(&self) -> bool {
        self.created_at.elapsed() < Self::DISPLAY_DURATION
    }
}

/// Main application state and GUI logic.
pub struct TimelineViewerApp {
    state: AppState,
    /// Loaded document (Some when state is Ready)
    timeline: Option<EventTimeline>,
    loaded_file_path: Option<PathBuf>,
    /// Path to reload when the error dialog's retry is pressed
    retry_path: Option<PathBuf>,
    status_message: Option<StatusMessage>,
    settings: AppSettings,
    engine: CollapseEngine,
    view: ViewState,
    layout_cache: LayoutCache,
    formatter: Box<dyn LabelFormatter>,
    error_dialog: ErrorDialogState,
    /// Last observed window size, persisted with the settings
    window_size: Option<egui::Vec2>,
}

impl TimelineViewerApp {
    /// Create a new application instance.
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let formatter = label::formatter_for(settings.parsed_base_date());
        Self {
            state: AppState::NoFileLoaded,
            timeline: None,
            loaded_file_path: None,
            retry_path: None,
            status_message: None,
            engine: CollapseEngine::new(settings.layout),
            view: ViewState::new(),
            layout_cache: LayoutCache::new(),
            formatter,
            error_dialog: ErrorDialogState::new(),
            window_size: None,
            settings,
        }
    }

    /// Open a file dialog and load the selected event file.
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline JSON", error::SUPPORTED_EXTENSIONS)
            .set_title("Open Timeline File")
            .pick_file()
        {
            self.load_file(path);
        }
    }

    /// Load an event file, reporting failures through the error dialog.
    fn load_file(&mut self, path: PathBuf) {
        match read_timeline(&path) {
            Ok(timeline) => self.apply_timeline(path, timeline),
            Err(e) => {
                warn!(path = %path.display(), error = %e.brief_description(), "Failed to load timeline");
                self.retry_path = e.file_path().cloned();
                self.set_error(e);
            }
        }
    }

    /// Install a freshly parsed timeline and reset the view.
    fn apply_timeline(&mut self, path: PathBuf, timeline: EventTimeline) {
        let event_count = timeline.events.len();
        let scheduled = timeline.scheduled_count();

        self.formatter =
            label::formatter_for(timeline.base_date.or(self.settings.parsed_base_date()));
        self.view.reset();
        self.engine.set_zoom_level(self.view.zoom_level);
        self.engine.set_events(timeline.events.clone());
        self.layout_cache.invalidate();

        info!(
            path = %path.display(),
            events = event_count,
            scheduled,
            collapsed = self.engine.collapsed_segments().count(),
            "Loaded timeline"
        );

        self.status_message = Some(StatusMessage::new(
            format!(
                "Loaded: {} ({} events, {} scheduled)",
                file_label(&path),
                event_count,
                scheduled
            ),
            StatusKind::Success,
        ));
        self.timeline = Some(timeline);
        self.loaded_file_path = Some(path.clone());
        self.retry_path = None;
        self.state = AppState::Ready;

        self.settings.add_recent_file(path);
        self.save_settings();
    }

    fn save_settings(&mut self) {
        if let Some(size) = self.window_size {
            self.settings.set_window_size(size.x, size.y);
        }
        if let Err(e) = self.settings.save() {
            warn!(error = %e.brief_description(), "Could not save settings");
            self.status_message = Some(StatusMessage::new(e.brief_description(), StatusKind::Error));
        }
    }

    /// Show an error in the dialog and the status bar.
    fn set_error(&mut self, error: AppError) {
        self.status_message = Some(StatusMessage::new(error.brief_description(), StatusKind::Error));
        self.error_dialog.show(error);
    }

    fn stats(&self) -> TimelineStats {
        let viewport = self.engine.viewport();
        TimelineStats {
            events: self.engine.events().len(),
            scheduled: self
                .timeline
                .as_ref()
                .map(|t| t.scheduled_count())
                .unwrap_or(0),
            segments: self.engine.segments().len(),
            collapsed: self.engine.collapsed_segments().count(),
            collapsible: self.engine.collapsible_count(),
            covered_span: self.engine.covered_span(),
            data_range: viewport.range(),
            adjusted_range: self.engine.adjusted_viewport_range(),
        }
    }
}

/// Read and parse an event file from disk.
fn read_timeline(path: &Path) -> Result<EventTimeline, AppError> {
    error::check_extension(path)?;
    let content =
        std::fs::read_to_string(path).map_err(|e| error::from_io_error(path.to_path_buf(), e))?;
    parser::parse_json(&content).map_err(|e| error::from_parse_error(Some(path.to_path_buf()), &e))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

impl eframe::App for TimelineViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.window_size = Some(ctx.input(|i| i.viewport_rect().size()));

        // Files dropped onto the window
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.load_file(path);
        }

        if let Some(action) = self.handle_keyboard_shortcuts(ctx) {
            self.handle_control_action(action);
        }

        self.render_toolbar(ctx);
        self.render_controls(ctx);
        self.render_timeline(ctx);
        self.render_error_dialog(ctx);
    }
}

impl TimelineViewerApp {
    /// Handle keyboard shortcuts for view control.
    fn handle_keyboard_shortcuts(&self, ctx: &egui::Context) -> Option<ControlAction> {
        if !self.state.controls_enabled() || self.error_dialog.is_open() {
            return None;
        }

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals) {
                return Some(ControlAction::ZoomIn);
            }
            if i.key_pressed(egui::Key::Minus) {
                return Some(ControlAction::ZoomOut);
            }
            if i.key_pressed(egui::Key::Num0) || i.key_pressed(egui::Key::Home) {
                return Some(ControlAction::FitToData);
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                return Some(ControlAction::PanBy(PAN_STEP_PERCENT));
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                return Some(ControlAction::PanBy(-PAN_STEP_PERCENT));
            }
            None
        })
    }

    /// Render the top toolbar section.
    fn render_toolbar(&mut self, ctx: &egui::Context) {
        let mut recent_choice: Option<PathBuf> = None;
        let mut clear_recent = false;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Event Timeline Viewer");
                ui.separator();

                if ui.button("📂 Open File").clicked() {
                    self.open_file_dialog();
                }

                ui.add_enabled_ui(!self.settings.recent_files.is_empty(), |ui| {
                    egui::ComboBox::from_id_salt("recent_combo")
                        .selected_text("Recent")
                        .show_ui(ui, |ui| {
                            for path in &self.settings.recent_files {
                                if ui
                                    .selectable_label(false, file_label(path))
                                    .on_hover_text(path.display().to_string())
                                    .clicked()
                                {
                                    recent_choice = Some(path.clone());
                                }
                            }
                            ui.separator();
                            if ui.selectable_label(false, "Clear recent files").clicked() {
                                clear_recent = true;
                            }
                        });
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_status_message(ui);
                });
            });
        });

        if clear_recent {
            self.settings.clear_recent_files();
            self.save_settings();
        }
        if let Some(path) = recent_choice {
            self.load_file(path);
        }
    }

    /// Render the status message if one is active.
    fn render_status_message(&mut self, ui: &mut egui::Ui) {
        if self
            .status_message
            .as_ref()
            .is_some_and(|msg| !msg.is_visible())
        {
            self.status_message = None;
            return;
        }

        let Some(msg) = &self.status_message else {
            return;
        };
        let color = match msg.kind {
            StatusKind::Success => self.settings.colors.status_success_color(),
            StatusKind::Error => self.settings.colors.status_error_color(),
        };
        let text = msg.text.clone();

        let mut dismiss_clicked = false;
        ui.horizontal(|ui| {
            if ui.small_button("✕").clicked() {
                dismiss_clicked = true;
            }
            ui.colored_label(color, text);
        });

        if dismiss_clicked {
            self.status_message = None;
        }
    }

    /// Render the bottom controls section.
    fn render_controls(&mut self, ctx: &egui::Context) {
        let stats = self.stats();
        let mut action: Option<ControlAction> = None;

        egui::TopBottomPanel::bottom("controls")
            .min_height(60.0)
            .show(ctx, |ui| {
                let renderer = ControlsRenderer::new(
                    self.state.controls_enabled(),
                    &self.view,
                    self.settings.layout,
                    stats,
                );
                action = renderer.render(ui);
            });

        if let Some(action) = action {
            self.handle_control_action(action);
        }
    }

    /// Handle a control action triggered by user interaction.
    fn handle_control_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::ZoomIn => self.view.zoom_in(),
            ControlAction::ZoomOut => self.view.zoom_out(),
            ControlAction::SetZoom(zoom) => self.view.set_zoom(zoom),
            ControlAction::PanBy(percent) => self.view.pan_offset += percent,
            ControlAction::FitToData => self.view.reset(),
            ControlAction::SetLayout(layout) => {
                self.engine.set_settings(layout);
                self.settings.layout = *self.engine.settings();
                self.save_settings();
            }
        }
        self.engine.set_zoom_level(self.view.zoom_level);
    }

    /// Handle pointer interaction on the timeline canvas.
    fn handle_timeline_action(&mut self, action: TimelineAction, pixel_width: f64) {
        match action {
            TimelineAction::ToggleSegment(id) => self.engine.toggle_segment_collapse(&id),
            TimelineAction::Pan(delta) => self.view.pan_by_pixels(delta, pixel_width),
            TimelineAction::ZoomAt {
                anchor_percent,
                factor,
            } => {
                self.view.zoom_at(anchor_percent, factor);
                self.engine.set_zoom_level(self.view.zoom_level);
            }
        }
    }

    /// Render the center timeline section.
    fn render_timeline(&mut self, ctx: &egui::Context) {
        let mut action: Option<(TimelineAction, f64)> = None;

        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            AppState::NoFileLoaded => render_no_file_placeholder(ui),
            AppState::Ready => {
                self.render_timeline_header(ui);
                ui.separator();
                ui.add_space(5.0);

                let width = ui.available_width();
                let layout = self.layout_cache.get_or_compute(
                    &self.engine,
                    self.view.pan_offset,
                    width as f64,
                    self.formatter.as_ref(),
                );
                let renderer =
                    TimelineRenderer::new(layout, &self.settings.colors, self.formatter.as_ref());
                action = renderer
                    .render(ui, width)
                    .map(|action| (action, width as f64));
            }
        });

        if let Some((action, width)) = action {
            self.handle_timeline_action(action, width);
            ctx.request_repaint();
        }
    }

    /// File information line above the timeline.
    fn render_timeline_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("📊 Timeline");
            ui.separator();

            if let Some(title) = self.timeline.as_ref().and_then(|t| t.title.as_deref()) {
                ui.label(title);
                ui.separator();
            }
            if let Some(ref path) = self.loaded_file_path {
                ui.label(format!("File: {}", file_label(path)));
            }
            ui.label(
                egui::RichText::new("Click a collapsed gap to expand it")
                    .color(self.settings.colors.text_dim_color()),
            );
        });
    }

    fn render_error_dialog(&mut self, ctx: &egui::Context) {
        let action = ErrorDialogRenderer::new(&mut self.error_dialog, &self.settings.colors)
            .render(ctx);

        if action == Some(ErrorDialogAction::Retry)
            && let Some(path) = self.retry_path.take()
        {
            self.load_file(path);
        }
    }
}

/// Render the placeholder view when no file is loaded.
fn render_no_file_placeholder(ui: &mut egui::Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading("📁 No Timeline Loaded");
        ui.add_space(10.0);
        ui.label("Drag and drop a timeline file (.json) to get started.");
        ui.label("Or use the \"Open File\" button in the toolbar.");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_controls() {
        assert!(!AppState::NoFileLoaded.controls_enabled());
        assert!(AppState::Ready.controls_enabled());
        assert_eq!(AppState::default(), AppState::NoFileLoaded);
    }

    #[test]
    fn test_status_message_visible_when_new() {
        let msg = StatusMessage::new("Loaded", StatusKind::Success);
        assert!(msg.is_visible());
        assert_eq!(msg.kind, StatusKind::Success);
    }

    #[test]
    fn test_read_timeline_rejects_extension() {
        let error = read_timeline(Path::new("/nonexistent/world.txt")).unwrap_err();
        assert!(matches!(error, AppError::UnsupportedFileType { .. }));
    }

    #[test]
    fn test_read_timeline_missing_file() {
        let error = read_timeline(Path::new("/nonexistent/world.json")).unwrap_err();
        assert!(matches!(error, AppError::FileNotFound { .. }));
    }

    #[test]
    fn test_read_timeline_sample() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/sample_timeline.json");
        let timeline = read_timeline(&path).unwrap();
        assert_eq!(timeline.events.len(), 8);
    }
}
