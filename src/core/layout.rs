//! Memoized timeline layout.
//!
//! Layout is recomputed as a whole whenever any input changes and reused
//! unchanged otherwise. The engine revision stands in for the event list,
//! toggle state, viewport and zoom.

use tracing::trace;

use super::calculator::{CollapsedSegmentPosition, PositionedEvent, Tick, TimelineCalculator};
use super::collapse::{CollapseEngine, PositionMap};
use super::config::LayoutSettings;
use super::event::Viewport;
use super::label::LabelFormatter;

/// Inputs a layout was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutKey {
    revision: u64,
    zoom_bits: u64,
    pan_bits: u64,
    width_bits: u64,
}

impl LayoutKey {
    fn new(engine: &CollapseEngine, pan_offset: f64, pixel_width: f64) -> Self {
        Self {
            revision: engine.revision(),
            zoom_bits: engine.zoom_level().to_bits(),
            pan_bits: pan_offset.to_bits(),
            width_bits: pixel_width.to_bits(),
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct TimelineLayout {
    pub events: Vec<PositionedEvent>,
    pub collapsed: Vec<CollapsedSegmentPosition>,
    pub expanded: Vec<CollapsedSegmentPosition>,
    pub ticks: Vec<Tick>,
    /// Viewport range after compression
    pub adjusted_range: f64,
    position_map: PositionMap,
    viewport: Viewport,
    zoom_level: f64,
    pan_offset: f64,
    pixel_width: f64,
    settings: LayoutSettings,
}

impl TimelineLayout {
    /// Compute a fresh layout from the engine's current state.
    pub fn compute(
        engine: &CollapseEngine,
        pan_offset: f64,
        pixel_width: f64,
        formatter: &dyn LabelFormatter,
    ) -> Self {
        let position_map = engine.position_map();
        let settings = *engine.settings();

        let (events, collapsed, expanded, ticks) = {
            let calc = TimelineCalculator::new(
                engine.viewport(),
                engine.zoom_level(),
                pan_offset,
                pixel_width,
                &position_map,
                formatter,
            )
            .with_tick_settings(&settings);

            (
                calc.calculate_event_positions(engine.events()),
                calc.calculate_collapsed_segment_positions(engine.segments()),
                calc.calculate_expanded_gap_positions(engine.segments()),
                calc.generate_ticks(engine.events()),
            )
        };

        Self {
            events,
            collapsed,
            expanded,
            ticks,
            adjusted_range: engine.adjusted_viewport_range(),
            position_map,
            viewport: engine.viewport(),
            zoom_level: engine.zoom_level(),
            pan_offset,
            pixel_width,
            settings,
        }
    }

    /// A calculator for the same view, for pointer hit-testing.
    pub fn calculator<'a>(&'a self, formatter: &'a dyn LabelFormatter) -> TimelineCalculator<'a> {
        TimelineCalculator::new(
            self.viewport,
            self.zoom_level,
            self.pan_offset,
            self.pixel_width,
            &self.position_map,
            formatter,
        )
        .with_tick_settings(&self.settings)
    }
}

/// Caches the last computed layout together with its inputs.
#[derive(Debug, Default)]
pub struct LayoutCache {
    key: Option<LayoutKey>,
    layout: TimelineLayout,
    computations: u64,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached layout, recomputing it if any input changed.
    pub fn get_or_compute(
        &mut self,
        engine: &CollapseEngine,
        pan_offset: f64,
        pixel_width: f64,
        formatter: &dyn LabelFormatter,
    ) -> &TimelineLayout {
        let key = LayoutKey::new(engine, pan_offset, pixel_width);
        if self.key != Some(key) {
            self.layout = TimelineLayout::compute(engine, pan_offset, pixel_width, formatter);
            self.key = Some(key);
            self.computations += 1;
            trace!(
                revision = key.revision,
                computations = self.computations,
                compressed = !self.layout.position_map.is_identity(),
                events = self.layout.events.len(),
                ticks = self.layout.ticks.len(),
                "Recomputed timeline layout"
            );
        }
        &self.layout
    }

    /// Drop the cached layout, e.g. after the label formatter changed.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// How many times a layout has been computed.
    #[cfg(test)]
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
