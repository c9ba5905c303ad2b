//! Dialog components for the timeline viewer.
//!
//! Currently a single modal error dialog with copy, retry and close actions.

use eframe::egui;

use crate::core::config::ColorSettings;
use crate::core::error::AppError;

/// How long the "copied" confirmation stays visible.
const COPY_FEEDBACK_DURATION: std::time::Duration = std::time::Duration::from_secs(2);

/// Actions that can be triggered from the error dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDialogAction {
    /// User wants to retry the failed operation
    Retry,
    /// User dismissed the dialog
    Close,
}

/// State for managing the error dialog.
#[derive(Debug, Clone, Default)]
pub struct ErrorDialogState {
    /// The error being shown; `None` when the dialog is closed
    error: Option<AppError>,
    /// When the details were last copied to the clipboard
    copied_at: Option<std::time::Instant>,
}

impl ErrorDialogState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog for `error`, replacing any error already shown.
    pub fn show(&mut self, error: AppError) {
        self.error = Some(error);
        self.copied_at = None;
    }

    pub fn close(&mut self) {
        self.error = None;
        self.copied_at = None;
    }

    pub fn is_open(&self) -> bool {
        self.error.is_some()
    }

    fn copy_feedback_visible(&self) -> bool {
        self.copied_at
            .is_some_and(|at| at.elapsed() < COPY_FEEDBACK_DURATION)
    }
}

/// Renderer for the error dialog.
pub struct ErrorDialogRenderer<'a> {
    state: &'a mut ErrorDialogState,
    colors: &'a ColorSettings,
}

impl<'a> ErrorDialogRenderer<'a> {
    pub fn new(state: &'a mut ErrorDialogState, colors: &'a ColorSettings) -> Self {
        Self { state, colors }
    }

    /// Render the error dialog and return the action taken.
    pub fn render(&mut self, ctx: &egui::Context) -> Option<ErrorDialogAction> {
        let error = self.state.error.clone()?;
        let detailed = error.detailed_info();
        let mut action: Option<ErrorDialogAction> = None;

        // Dim everything behind the dialog
        let screen_rect = ctx.input(|i| i.viewport_rect());
        ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("error_dialog_overlay"),
        ))
        .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(150));

        egui::Window::new(format!("⚠ {}", error.dialog_title()))
            .id(egui::Id::new("error_dialog"))
            .collapsible(false)
            .resizable(true)
            .default_width(450.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new(error.brief_description()).size(14.0));
                ui.add_space(8.0);

                egui::CollapsingHeader::new("Details")
                    .id_salt("error_dialog_details")
                    .default_open(false)
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new(&detailed).monospace());
                    });

                if self.state.copy_feedback_visible() {
                    ui.colored_label(self.colors.status_success_color(), "Copied to clipboard!");
                    ctx.request_repaint();
                }

                ui.separator();

                ui.horizontal(|ui| {
                    if ui
                        .button("📋 Copy Error")
                        .on_hover_text("Copy error details to clipboard")
                        .clicked()
                    {
                        ui.ctx().copy_text(detailed.clone());
                        self.state.copied_at = Some(std::time::Instant::now());
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if error.is_recoverable() && ui.button("Close").clicked() {
                            action = Some(ErrorDialogAction::Close);
                        }
                        if error.supports_retry()
                            && ui
                                .button("🔄 Retry")
                                .on_hover_text("Load the file again")
                                .clicked()
                        {
                            action = Some(ErrorDialogAction::Retry);
                        }
                    });
                });
            });

        if action.is_some() {
            self.state.close();
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_dialog_state_new() {
        let state = ErrorDialogState::new();
        assert!(!state.is_open());
        assert!(!state.copy_feedback_visible());
    }

    #[test]
    fn test_error_dialog_show_and_close() {
        let mut state = ErrorDialogState::new();
        state.show(AppError::FileNotFound {
            path: PathBuf::from("/test/world.json"),
        });
        assert!(state.is_open());

        state.copied_at = Some(std::time::Instant::now());
        assert!(state.copy_feedback_visible());

        state.close();
        assert!(!state.is_open());
        assert!(!state.copy_feedback_visible());
    }

    #[test]
    fn test_show_replaces_previous_error() {
        let mut state = ErrorDialogState::new();
        state.show(AppError::FileNotFound {
            path: PathBuf::from("/a.json"),
        });
        state.show(AppError::SettingsSaveError {
            reason: "read-only".to_string(),
        });
        assert!(matches!(
            state.error,
            Some(AppError::SettingsSaveError { .. })
        ));
    }
}
