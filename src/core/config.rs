//! Configuration and settings module.
//!
//! This module handles persistent settings including the layout engine
//! constants, color customization, and saving/loading configuration to disk.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use super::error::AppError;

/// Settings filename for persistence.
const SETTINGS_FILENAME: &str = "config.json";

/// Application directory under the user's config directory.
const APP_DIR_NAME: &str = "event-timeline-viewer";

/// Maximum number of recent files to track.
const MAX_RECENT_FILES: usize = 10;

/// Tunable constants of the timeline layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// A gap collapses when longer than this many average neighbour durations
    pub collapse_threshold_multiplier: f64,
    /// On-screen width of a collapsed gap, in pixels of the reference width
    pub collapsed_width_px: f64,
    /// Timeline width the collapsed width is measured against
    pub reference_width_px: f64,
    /// Minimum distance between event-anchored ticks
    pub min_tick_spacing_px: f64,
    /// Approximate tick count for evenly spaced ticks
    pub static_tick_target: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            collapse_threshold_multiplier: 3.0,
            collapsed_width_px: 80.0,
            reference_width_px: 1000.0,
            min_tick_spacing_px: 80.0,
            static_tick_target: 15,
        }
    }
}

impl LayoutSettings {
    /// Replace non-positive or non-finite values with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        Self {
            collapse_threshold_multiplier: positive(
                self.collapse_threshold_multiplier,
                defaults.collapse_threshold_multiplier,
            ),
            collapsed_width_px: positive(self.collapsed_width_px, defaults.collapsed_width_px),
            reference_width_px: positive(self.reference_width_px, defaults.reference_width_px),
            min_tick_spacing_px: positive(self.min_tick_spacing_px, defaults.min_tick_spacing_px),
            static_tick_target: self.static_tick_target.max(1),
        }
    }
}

/// Color settings for the timeline UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    // Event colors
    /// Fill for events with a duration
    pub event_span: [u8; 3],
    /// Fill for point events
    pub event_point: [u8; 3],
    /// Hovered event outline
    pub hover: [u8; 3],

    // Gap colors
    /// Collapsed gap marker
    pub collapsed_marker: [u8; 3],
    /// Outline of a collapsible gap the user expanded
    pub expanded_gap: [u8; 3],

    // Axis colors
    /// Tick line color
    pub tick: [u8; 3],
    /// Tick label color
    pub tick_label: [u8; 3],

    // Background colors
    pub background: [u8; 3],
    pub header_background: [u8; 3],

    // Text colors
    pub text_label: [u8; 3],
    pub text_dim: [u8; 3],

    // Status colors
    pub status_success: [u8; 3],
    pub status_error: [u8; 3],
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            event_span: [66, 133, 244],  // Blue
            event_point: [255, 193, 7],  // Amber
            hover: [255, 255, 255],      // White

            collapsed_marker: [150, 100, 200], // Purple
            expanded_gap: [100, 100, 110],     // Gray

            tick: [60, 60, 65],
            tick_label: [128, 128, 128],

            background: [30, 30, 35],
            header_background: [40, 40, 45],

            text_label: [211, 211, 211],
            text_dim: [105, 105, 105],

            status_success: [76, 175, 80], // Green
            status_error: [244, 67, 54],   // Red
        }
    }
}

impl ColorSettings {
    /// Convert a color array to egui Color32.
    #[inline]
    pub fn to_color32(color: [u8; 3]) -> Color32 {
        Color32::from_rgb(color[0], color[1], color[2])
    }

    /// Convert a color array to egui Color32 with alpha.
    #[inline]
    pub fn to_color32_alpha(color: [u8; 3], alpha: u8) -> Color32 {
        Color32::from_rgba_unmultiplied(color[0], color[1], color[2], alpha)
    }

    pub fn event_span_color(&self) -> Color32 {
        Self::to_color32(self.event_span)
    }

    pub fn event_point_color(&self) -> Color32 {
        Self::to_color32(self.event_point)
    }

    pub fn hover_color(&self) -> Color32 {
        Self::to_color32(self.hover)
    }

    /// Collapsed marker fill, translucent so ticks show through.
    pub fn collapsed_marker_color_alpha(&self, alpha: u8) -> Color32 {
        Self::to_color32_alpha(self.collapsed_marker, alpha)
    }

    pub fn collapsed_marker_color(&self) -> Color32 {
        Self::to_color32(self.collapsed_marker)
    }

    pub fn expanded_gap_color(&self) -> Color32 {
        Self::to_color32(self.expanded_gap)
    }

    pub fn tick_color(&self) -> Color32 {
        Self::to_color32(self.tick)
    }

    pub fn tick_label_color(&self) -> Color32 {
        Self::to_color32(self.tick_label)
    }

    pub fn background_color(&self) -> Color32 {
        Self::to_color32(self.background)
    }

    pub fn header_background_color(&self) -> Color32 {
        Self::to_color32(self.header_background)
    }

    pub fn text_label_color(&self) -> Color32 {
        Self::to_color32(self.text_label)
    }

    pub fn text_dim_color(&self) -> Color32 {
        Self::to_color32(self.text_dim)
    }

    pub fn status_success_color(&self) -> Color32 {
        Self::to_color32(self.status_success)
    }

    pub fn status_error_color(&self) -> Color32 {
        Self::to_color32(self.status_error)
    }
}

/// Application settings including layout constants and user preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Layout engine constants.
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Color customization settings.
    #[serde(default)]
    pub colors: ColorSettings,

    /// Fallback epoch (`YYYY-MM-DD`) for files that do not declare one.
    #[serde(default)]
    pub base_date: Option<String>,

    /// Recently opened files (most recent first).
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,

    /// Window size to restore on startup (width, height).
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
}

impl AppSettings {
    /// Get the settings file path in the user's config directory.
    fn get_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(APP_DIR_NAME);
            path.push(SETTINGS_FILENAME);
            path
        })
    }

    /// Load settings from disk, returning defaults if loading fails.
    pub fn load() -> Self {
        let settings = Self::get_settings_path()
            .and_then(|path| std::fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str::<Self>(&content).ok());

        match settings {
            Some(mut settings) => {
                settings.layout = settings.layout.sanitized();
                settings
            }
            None => {
                debug!("No usable settings file, using defaults");
                Self::default()
            }
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<(), AppError> {
        let path = Self::get_settings_path().ok_or_else(|| AppError::SettingsSaveError {
            reason: "Could not determine config directory".to_string(),
        })?;

        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::SettingsSaveError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| AppError::SettingsSaveError {
                reason: format!("Failed to serialize settings: {}", e),
            })?;

        std::fs::write(&path, content).map_err(|e| AppError::SettingsSaveError {
            reason: format!("Failed to write settings file: {}", e),
        })?;

        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Parsed fallback base date, if set and valid.
    pub fn parsed_base_date(&self) -> Option<chrono::NaiveDate> {
        self.base_date
            .as_deref()
            .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Add a file to the recent files list.
    ///
    /// The file is moved to the front of the list. If it already exists, it is
    /// moved to the front. The list is capped at MAX_RECENT_FILES entries.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }

    /// Clear the recent files list.
    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
    }

    /// Set the window size.
    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.window_size = Some((width, height));
    }
}
