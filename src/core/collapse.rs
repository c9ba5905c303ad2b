//! Gap collapse engine.
//!
//! Owns the event list and the set of manually expanded gaps, keeps the
//! segment list current, and exposes the mapping from absolute time to
//! adjusted (compressed) time used by every position calculation.

use std::collections::HashSet;

use tracing::debug;

use super::config::LayoutSettings;
use super::event::{TimelineEvent, Viewport};
use super::segments::{self, CollapsedSegment, TimeSegment};

/// Mapping between absolute time and adjusted time.
pub trait TimeAdjust {
    /// Map an absolute time to its adjusted position.
    fn adjust(&self, time: f64) -> f64;

    /// Map an adjusted position back to absolute time.
    ///
    /// The default is the identity, which is only correct for mappings
    /// without compression.
    fn unadjust(&self, adjusted: f64) -> f64 {
        adjusted
    }
}

/// The identity mapping, for timelines without collapsed gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl TimeAdjust for Identity {
    fn adjust(&self, time: f64) -> f64 {
        time
    }
}

/// Walk collapsed segments in time order and compress `time`.
fn adjust_over<'a>(
    collapsed: impl Iterator<Item = &'a CollapsedSegment>,
    fixed_units: f64,
    time: f64,
) -> f64 {
    let mut saved = 0.0;

    for segment in collapsed {
        let start = segment.start_time as f64;
        let end = segment.end_time as f64;
        let duration = segment.duration.max(1) as f64;

        if time > start && time <= end {
            let progress = (time - start) / duration;
            return start - saved + progress * fixed_units;
        }
        if time > end {
            saved += (duration - fixed_units).max(0.0);
        }
    }

    time - saved
}

/// Snapshot of the compression applied by a segment list.
///
/// Built from the current segments and never updated in place; a new map
/// is taken whenever the engine changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionMap {
    collapsed: Vec<CollapsedSegment>,
    fixed_units: f64,
}

impl PositionMap {
    /// Build a map from a segment list and the width of a collapsed gap in time units.
    pub fn new(segments: &[TimeSegment], fixed_units: f64) -> Self {
        let collapsed = segments
            .iter()
            .filter_map(|s| match s {
                TimeSegment::Collapsed(gap) => Some(gap.clone()),
                _ => None,
            })
            .collect();

        Self {
            collapsed,
            fixed_units,
        }
    }

    /// Whether no gap is compressed.
    pub fn is_identity(&self) -> bool {
        self.collapsed.is_empty()
    }
}

impl TimeAdjust for PositionMap {
    fn adjust(&self, time: f64) -> f64 {
        adjust_over(self.collapsed.iter(), self.fixed_units, time)
    }

    /// Piecewise-linear inverse of [`PositionMap::adjust`].
    fn unadjust(&self, adjusted: f64) -> f64 {
        let mut saved = 0.0;

        for segment in &self.collapsed {
            let start = segment.start_time as f64;
            let duration = segment.duration.max(1) as f64;
            let adjusted_start = start - saved;

            if adjusted <= adjusted_start {
                break;
            }
            if adjusted <= adjusted_start + self.fixed_units {
                if self.fixed_units <= 0.0 {
                    return start;
                }
                let progress = (adjusted - adjusted_start) / self.fixed_units;
                return start + progress * duration;
            }
            saved += (duration - self.fixed_units).max(0.0);
        }

        adjusted + saved
    }
}

/// Segmentation and collapse state for one timeline.
#[derive(Debug, Clone)]
pub struct CollapseEngine {
    events: Vec<TimelineEvent>,
    /// Collapsible gaps the user switched away from the collapsed default
    expanded_segment_ids: HashSet<String>,
    settings: LayoutSettings,
    viewport: Viewport,
    zoom_level: f64,
    segments: Vec<TimeSegment>,
    revision: u64,
}

impl Default for CollapseEngine {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl CollapseEngine {
    /// Create an empty engine with no expanded gaps.
    pub fn new(settings: LayoutSettings) -> Self {
        Self {
            events: Vec::new(),
            expanded_segment_ids: HashSet::new(),
            settings: settings.sanitized(),
            viewport: Viewport::default(),
            zoom_level: 1.0,
            segments: Vec::new(),
            revision: 0,
        }
    }

    /// Replace the event list. The viewport is re-derived from the new events.
    pub fn set_events(&mut self, events: Vec<TimelineEvent>) {
        self.viewport = Viewport::from_events(&events);
        self.events = events;
        self.recompute();
    }

    /// Override the data viewport.
    #[cfg(test)]
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.bump();
        }
    }

    /// Set the zoom level that determines the width of collapsed gaps.
    pub fn set_zoom_level(&mut self, zoom_level: f64) {
        if self.zoom_level != zoom_level {
            self.zoom_level = zoom_level;
            self.bump();
        }
    }

    /// Replace the layout constants.
    pub fn set_settings(&mut self, settings: LayoutSettings) {
        let settings = settings.sanitized();
        if self.settings != settings {
            self.settings = settings;
            self.recompute();
        }
    }

    /// Flip a collapsible gap between collapsed and expanded.
    ///
    /// Unknown identifiers are still recorded; they take effect if a gap with
    /// that identifier appears later.
    pub fn toggle_segment_collapse(&mut self, segment_id: &str) {
        if !self.expanded_segment_ids.remove(segment_id) {
            self.expanded_segment_ids.insert(segment_id.to_string());
        }
        debug!(
            segment_id,
            expanded = self.is_expanded(segment_id),
            "Toggled segment"
        );
        self.recompute();
    }

    /// Whether the user has expanded this gap.
    pub fn is_expanded(&self, segment_id: &str) -> bool {
        self.expanded_segment_ids.contains(segment_id)
    }

    /// Segment an arbitrary event list under the current toggle state.
    pub fn compute_segments(&self, events: &[TimelineEvent]) -> Vec<TimeSegment> {
        segments::compute_segments(
            events,
            &self.expanded_segment_ids,
            self.settings.collapse_threshold_multiplier,
        )
    }

    /// Width of a collapsed gap expressed in time units at the current zoom.
    pub fn fixed_collapsed_time_units(&self) -> f64 {
        let zoom = if self.zoom_level > 0.0 {
            self.zoom_level
        } else {
            1.0
        };
        let visible_range = self.viewport.safe_range() / zoom;
        self.settings.collapsed_width_px / self.settings.reference_width_px * visible_range
    }

    /// Map an absolute time to adjusted time using the current segments.
    pub fn adjust(&self, time: f64) -> f64 {
        adjust_over(
            self.collapsed_segments(),
            self.fixed_collapsed_time_units(),
            time,
        )
    }

    /// Snapshot of the current mapping for handing to a calculator.
    pub fn position_map(&self) -> PositionMap {
        PositionMap::new(&self.segments, self.fixed_collapsed_time_units())
    }

    /// Viewport range after collapsed gaps inside it are compressed.
    pub fn adjusted_viewport_range(&self) -> f64 {
        let fixed_units = self.fixed_collapsed_time_units();
        let min = self.viewport.min_time;
        let max = self.viewport.max_time;

        let saved: f64 = self
            .collapsed_segments()
            .map(|segment| {
                let overlap =
                    (segment.end_time as f64).min(max) - (segment.start_time as f64).max(min);
                if overlap > 0.0 {
                    (overlap - fixed_units).max(0.0)
                } else {
                    0.0
                }
            })
            .sum();

        (max - min) - saved
    }

    /// Gaps currently shown collapsed, in time order.
    pub fn collapsed_segments(&self) -> impl Iterator<Item = &CollapsedSegment> {
        self.segments.iter().filter_map(|s| match s {
            TimeSegment::Collapsed(gap) => Some(gap),
            _ => None,
        })
    }

    /// Number of gaps that qualify for collapsing, collapsed or not.
    pub fn collapsible_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.collapsible().is_some())
            .count()
    }

    /// First and last time covered by the segment list.
    pub fn covered_span(&self) -> Option<(i64, i64)> {
        let first = self.segments.first()?;
        let last = self.segments.last()?;
        Some((first.start_time(), last.end_time()))
    }

    pub fn segments(&self) -> &[TimeSegment] {
        &self.segments
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Counter bumped on every input change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rebuild the segment list from scratch.
    fn recompute(&mut self) {
        self.segments = self.compute_segments(&self.events);
        self.bump();
        debug!(
            events = self.events.len(),
            segments = self.segments.len(),
            collapsed = self.collapsed_segments().count(),
            revision = self.revision,
            "Recomputed timeline segments"
        );
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
