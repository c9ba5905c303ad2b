//! Zoom and pan state for the timeline view.
//!
//! This module provides the ViewState structure that tracks how far the
//! timeline is magnified and how far it has been dragged sideways.

/// Default zoom level (1.0 = whole data range fits the view).
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;

/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 1000.0;

/// Multiplier applied by a single zoom in/out step.
pub const ZOOM_STEP: f64 = 1.25;

/// Available zoom presets for the UI.
pub const ZOOM_OPTIONS: &[f64] = &[0.5, 1.0, 2.0, 5.0, 10.0, 50.0, 100.0];

/// Magnification and horizontal offset of the timeline view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Magnification factor, clamped to [MIN_ZOOM, MAX_ZOOM].
    pub zoom_level: f64,

    /// Signed shift in percent of the zoomed range.
    /// Positive values move the content to the right.
    pub pan_offset: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    /// Create a view that fits the whole data range.
    pub fn new() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM,
            pan_offset: 0.0,
        }
    }

    /// Set the zoom level, clamping to the valid range.
    pub fn set_zoom(&mut self, zoom_level: f64) {
        if zoom_level.is_finite() {
            self.zoom_level = zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Zoom in one step around the center of the view.
    pub fn zoom_in(&mut self) {
        self.zoom_at(50.0, ZOOM_STEP);
    }

    /// Zoom out one step around the center of the view.
    pub fn zoom_out(&mut self) {
        self.zoom_at(50.0, 1.0 / ZOOM_STEP);
    }

    /// Multiply the zoom by `factor`, keeping the time under `anchor_percent` in place.
    ///
    /// # Arguments
    /// * `anchor_percent` - Position across the view, 0 at the left edge and 100 at the right.
    /// * `factor` - Values above 1 zoom in, below 1 zoom out.
    pub fn zoom_at(&mut self, anchor_percent: f64, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let old_zoom = self.zoom_level;
        self.set_zoom(old_zoom * factor);
        let ratio = self.zoom_level / old_zoom;
        self.pan_offset = anchor_percent - (anchor_percent - self.pan_offset) * ratio;
    }

    /// Shift the view by a horizontal drag distance.
    pub fn pan_by_pixels(&mut self, delta_px: f64, pixel_width: f64) {
        if pixel_width > 0.0 {
            self.pan_offset += delta_px / pixel_width * 100.0;
        }
    }

    /// Return to the fit-to-data view.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether the view shows exactly the fit-to-data range.
    pub fn is_fit(&self) -> bool {
        self.zoom_level == DEFAULT_ZOOM && self.pan_offset == 0.0
    }
}
