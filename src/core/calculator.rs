//! Coordinate mapping and tick generation.
//!
//! A [`TimelineCalculator`] is built for one combination of viewport, zoom,
//! pan and surface width. It converts times to percentage and pixel
//! positions through the adjusted-time mapping and lays out axis ticks.

use std::cmp::Ordering;

use super::collapse::TimeAdjust;
use super::config::LayoutSettings;
use super::event::{MIN_RANGE, TimelineEvent, Viewport};
use super::label::LabelFormatter;
use super::segments::{CollapsedSegment, TimeSegment};

/// Elements this far (in percent) past either edge are still laid out.
pub const VISIBILITY_MARGIN: f64 = 10.0;

/// Narrowest width, in percent, an element is given.
pub const MIN_WIDTH_PERCENT: f64 = 0.5;

/// Smallest surface width used as a divisor.
pub const MIN_PIXEL_WIDTH: f64 = 1.0;

/// Upper bound on evenly spaced ticks, in case of a pathological interval.
const MAX_STATIC_TICKS: usize = 10_000;

/// Horizontal extent of an element on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Left edge, percent of the surface width
    pub left: f64,
    /// Width, percent of the surface width
    pub width: f64,
    pub left_pixel: f64,
    pub width_pixel: f64,
    /// Whether any part falls inside the render margin
    pub visible: bool,
}

/// An event paired with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedEvent {
    pub event: TimelineEvent,
    pub position: Position,
}

/// A collapsible gap paired with the position of its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedSegmentPosition {
    pub segment: CollapsedSegment,
    pub position: Position,
}

/// A labelled axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Absolute time the tick marks
    pub time_value: f64,
    /// Percent of the surface width
    pub position: f64,
    pub pixel: f64,
    pub label: String,
}

/// Snap an interval up to the next 1, 2 or 5 times a power of ten.
pub fn nice_interval(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Converts between time, percentage and pixel space for one view.
pub struct TimelineCalculator<'a> {
    pixel_width: f64,
    adjust: &'a dyn TimeAdjust,
    formatter: &'a dyn LabelFormatter,
    min_tick_spacing_px: f64,
    static_tick_target: u32,

    // Derived once from the inputs above
    zoomed_range: f64,
    zoomed_start: f64,
    adjusted_start: f64,
    adjusted_range: f64,
}

impl<'a> TimelineCalculator<'a> {
    /// Create a calculator for the given view.
    ///
    /// # Arguments
    /// * `viewport` - Full data range
    /// * `zoom_level` - Magnification, 1 fits the data
    /// * `pan_offset` - Signed shift in percent of the zoomed range
    /// * `pixel_width` - Width of the rendering surface
    /// * `adjust` - Absolute to adjusted time mapping
    /// * `formatter` - Produces tick labels
    pub fn new(
        viewport: Viewport,
        zoom_level: f64,
        pan_offset: f64,
        pixel_width: f64,
        adjust: &'a dyn TimeAdjust,
        formatter: &'a dyn LabelFormatter,
    ) -> Self {
        let defaults = LayoutSettings::default();
        let zoom_level = if zoom_level.is_finite() && zoom_level > 0.0 {
            zoom_level
        } else {
            1.0
        };
        let pan_offset = if pan_offset.is_finite() {
            pan_offset
        } else {
            0.0
        };

        let zoomed_range = viewport.safe_range() / zoom_level;
        let zoomed_start = viewport.min_time - pan_offset * zoomed_range / 100.0;
        let adjusted_start = adjust.adjust(zoomed_start);
        let adjusted_end = adjust.adjust(zoomed_start + zoomed_range);

        Self {
            pixel_width: pixel_width.max(MIN_PIXEL_WIDTH),
            adjust,
            formatter,
            min_tick_spacing_px: defaults.min_tick_spacing_px,
            static_tick_target: defaults.static_tick_target,
            zoomed_range,
            zoomed_start,
            adjusted_start,
            adjusted_range: (adjusted_end - adjusted_start).max(MIN_RANGE),
        }
    }

    /// Use the tick spacing and density from `settings`.
    pub fn with_tick_settings(mut self, settings: &LayoutSettings) -> Self {
        let settings = settings.sanitized();
        self.min_tick_spacing_px = settings.min_tick_spacing_px;
        self.static_tick_target = settings.static_tick_target;
        self
    }

    /// First absolute time of the zoomed and panned window.
    pub fn zoomed_start(&self) -> f64 {
        self.zoomed_start
    }

    /// Length of the zoomed window in absolute time.
    pub fn zoomed_range(&self) -> f64 {
        self.zoomed_range
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    pub fn time_to_percentage(&self, time: f64) -> f64 {
        (self.adjust.adjust(time) - self.adjusted_start) / self.adjusted_range * 100.0
    }

    /// Linear inverse of [`Self::time_to_percentage`] in adjusted time.
    ///
    /// Inside a collapsed gap this does not recover the absolute time; use
    /// [`Self::pixel_to_time_exact`] where that matters.
    pub fn percentage_to_time(&self, percentage: f64) -> f64 {
        self.adjusted_start + percentage / 100.0 * self.adjusted_range
    }

    pub fn time_to_pixel(&self, time: f64) -> f64 {
        self.time_to_percentage(time) / 100.0 * self.pixel_width
    }

    pub fn pixel_to_time(&self, pixel: f64) -> f64 {
        self.percentage_to_time(pixel / self.pixel_width * 100.0)
    }

    /// Absolute time under a pixel, undoing gap compression.
    pub fn pixel_to_time_exact(&self, pixel: f64) -> f64 {
        self.adjust.unadjust(self.pixel_to_time(pixel))
    }

    /// Extent of a span, or of a point when `end` is `None`.
    pub fn calculate_position(&self, start: f64, end: Option<f64>) -> Position {
        let left = self.time_to_percentage(start);
        let right = self.time_to_percentage(end.unwrap_or(start));
        let width = (right - left).max(MIN_WIDTH_PERCENT);

        Position {
            left,
            width,
            left_pixel: self.time_to_pixel(start),
            width_pixel: width / 100.0 * self.pixel_width,
            visible: left < 100.0 + VISIBILITY_MARGIN
                && left + width > -VISIBILITY_MARGIN
                && width > 0.0,
        }
    }

    /// Position every scheduled event. Unscheduled events are skipped.
    pub fn calculate_event_positions(&self, events: &[TimelineEvent]) -> Vec<PositionedEvent> {
        events
            .iter()
            .filter_map(|event| {
                let start = event.time_start?;
                let position = self.calculate_position(start as f64, event.time_end.map(|e| e as f64));
                Some(PositionedEvent {
                    event: event.clone(),
                    position,
                })
            })
            .collect()
    }

    /// Marker positions for the collapsed gaps in `segments`.
    pub fn calculate_collapsed_segment_positions(
        &self,
        segments: &[TimeSegment],
    ) -> Vec<CollapsedSegmentPosition> {
        segments
            .iter()
            .filter_map(|s| match s {
                TimeSegment::Collapsed(gap) => Some(self.gap_position(gap)),
                _ => None,
            })
            .collect()
    }

    /// Positions of collapsible gaps the user has expanded.
    pub fn calculate_expanded_gap_positions(
        &self,
        segments: &[TimeSegment],
    ) -> Vec<CollapsedSegmentPosition> {
        segments
            .iter()
            .filter_map(|s| match s {
                TimeSegment::Gap {
                    collapsible: Some(gap),
                    ..
                } => Some(self.gap_position(gap)),
                _ => None,
            })
            .collect()
    }

    fn gap_position(&self, gap: &CollapsedSegment) -> CollapsedSegmentPosition {
        CollapsedSegmentPosition {
            segment: gap.clone(),
            position: self.calculate_position(gap.start_time as f64, Some(gap.end_time as f64)),
        }
    }

    /// Axis ticks for the current view.
    ///
    /// Anchored to event boundaries when any event is scheduled, evenly
    /// spaced otherwise. May be empty.
    pub fn generate_ticks(&self, events: &[TimelineEvent]) -> Vec<Tick> {
        if events.iter().any(|e| e.time_start.is_some()) {
            self.event_anchored_ticks(events)
        } else {
            self.static_ticks()
        }
    }

    fn make_tick(&self, time_value: f64, position: &Position) -> Tick {
        Tick {
            time_value,
            position: position.left,
            pixel: position.left_pixel,
            label: self.formatter.format(time_value),
        }
    }

    fn static_ticks(&self) -> Vec<Tick> {
        let interval = nice_interval(self.zoomed_range / f64::from(self.static_tick_target));
        let zoomed_end = self.zoomed_start + self.zoomed_range;
        let first = (self.zoomed_start / interval).ceil() * interval;
        let tolerance = interval * 1e-9;

        (0..MAX_STATIC_TICKS)
            .map(|i| first + i as f64 * interval)
            .take_while(|&time| time <= zoomed_end + tolerance)
            .filter_map(|time| {
                let position = self.calculate_position(time, None);
                position.visible.then(|| self.make_tick(time, &position))
            })
            .collect()
    }

    fn event_anchored_ticks(&self, events: &[TimelineEvent]) -> Vec<Tick> {
        let mut candidates = Vec::new();

        for event in events {
            let (Some(start), Some(end)) = (event.time_start, event.effective_end()) else {
                continue;
            };
            let (start, end) = (start as f64, end as f64);
            candidates.push(start);

            let duration = end - start;
            if duration > 0.0 {
                candidates.extend([
                    end,
                    start + duration / 2.0,
                    end + duration,
                    end + 2.0 * duration,
                ]);
            }
        }

        candidates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        candidates.dedup();

        let mut ticks: Vec<Tick> = Vec::new();
        for time in candidates {
            let position = self.calculate_position(time, None);
            if !position.visible {
                continue;
            }
            let far_enough = ticks
                .iter()
                .all(|kept| (kept.pixel - position.left_pixel).abs() >= self.min_tick_spacing_px);
            if far_enough {
                ticks.push(self.make_tick(time, &position));
            }
        }

        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collapse::{CollapseEngine, Identity};
    use crate::core::label::OffsetFormatter;

    fn calculator<'a>(
        viewport: Viewport,
        zoom: f64,
        pan: f64,
        width: f64,
        adjust: &'a dyn TimeAdjust,
    ) -> TimelineCalculator<'a> {
        TimelineCalculator::new(viewport, zoom, pan, width, adjust, &OffsetFormatter)
    }

    #[test]
    fn test_nice_interval() {
        assert_eq!(nice_interval(6.67), 10.0);
        assert_eq!(nice_interval(1.0), 1.0);
        assert_eq!(nice_interval(1.5), 2.0);
        assert_eq!(nice_interval(3.0), 5.0);
        assert!((nice_interval(0.031) - 0.05).abs() < 1e-12);
        assert!((nice_interval(420.0) - 500.0).abs() < 1e-9);
        assert_eq!(nice_interval(0.0), 1.0);
        assert_eq!(nice_interval(f64::NAN), 1.0);
    }

    #[test]
    fn test_static_ticks_scenario() {
        let calc = calculator(Viewport::new(0.0, 100.0), 1.0, 0.0, 1000.0, &Identity);
        let ticks = calc.generate_ticks(&[]);

        assert_eq!(ticks.len(), 11);
        for (i, tick) in ticks.iter().enumerate() {
            assert!((tick.time_value - i as f64 * 10.0).abs() < 1e-9);
            assert!((tick.position - i as f64 * 10.0).abs() < 1e-9);
            assert_eq!(tick.label, format!("{}", i * 10));
        }
    }

    #[test]
    fn test_static_ticks_on_single_interval() {
        let calc = calculator(Viewport::new(-37.0, 1234.0), 3.0, -25.0, 800.0, &Identity);
        let ticks = calc.generate_ticks(&[TimelineEvent::unscheduled("x")]);
        assert!(!ticks.is_empty());

        let interval = nice_interval(calc.zoomed_range() / 15.0);
        for tick in &ticks {
            let steps = tick.time_value / interval;
            assert!((steps - steps.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_time_percentage_pixel_mapping() {
        let calc = calculator(Viewport::new(0.0, 200.0), 1.0, 0.0, 500.0, &Identity);
        assert_eq!(calc.time_to_percentage(50.0), 25.0);
        assert_eq!(calc.time_to_pixel(50.0), 125.0);
        assert_eq!(calc.percentage_to_time(25.0), 50.0);
        assert_eq!(calc.pixel_to_time(125.0), 50.0);
        assert_eq!(calc.pixel_to_time_exact(125.0), 50.0);
    }

    #[test]
    fn test_zoom_and_pan() {
        // Zoom 2 halves the window; pan -50 moves it half a window right
        let calc = calculator(Viewport::new(0.0, 100.0), 2.0, -50.0, 1000.0, &Identity);
        assert_eq!(calc.zoomed_range(), 50.0);
        assert_eq!(calc.zoomed_start(), 25.0);
        assert_eq!(calc.time_to_percentage(25.0), 0.0);
        assert_eq!(calc.time_to_percentage(75.0), 100.0);
    }

    #[test]
    fn test_position_floor_and_visibility() {
        let calc = calculator(Viewport::new(0.0, 100.0), 1.0, 0.0, 1000.0, &Identity);

        let point = calc.calculate_position(40.0, None);
        assert_eq!(point.width, MIN_WIDTH_PERCENT);
        assert_eq!(point.width_pixel, 5.0);
        assert!(point.visible);

        let span = calc.calculate_position(10.0, Some(30.0));
        assert_eq!(span.left, 10.0);
        assert_eq!(span.width, 20.0);
        assert_eq!(span.left_pixel, 100.0);
        assert_eq!(span.width_pixel, 200.0);

        let reversed = calc.calculate_position(30.0, Some(10.0));
        assert_eq!(reversed.width, MIN_WIDTH_PERCENT);

        // Inside the margin on the right, outside beyond it
        assert!(calc.calculate_position(105.0, None).visible);
        assert!(!calc.calculate_position(111.0, None).visible);
        // Partially offscreen on the left stays visible
        assert!(calc.calculate_position(-20.0, Some(5.0)).visible);
        assert!(!calc.calculate_position(-30.0, Some(-15.0)).visible);
    }

    #[test]
    fn test_position_width_never_below_floor() {
        let calc = calculator(Viewport::new(-50.0, 50.0), 7.5, 13.0, 333.0, &Identity);
        for i in -100..100 {
            let start = i as f64 * 1.7;
            let position = calc.calculate_position(start, Some(start + (i % 5) as f64));
            assert!(position.width >= MIN_WIDTH_PERCENT);
        }
    }

    #[test]
    fn test_degenerate_inputs_stay_finite() {
        let calc = calculator(Viewport::new(10.0, 10.0), 0.0, f64::NAN, 0.0, &Identity);
        let position = calc.calculate_position(10.0, Some(11.0));
        assert!(position.left.is_finite());
        assert!(position.width.is_finite());
        assert!(position.left_pixel.is_finite());
        assert_eq!(calc.pixel_width(), MIN_PIXEL_WIDTH);
    }

    #[test]
    fn test_event_positions_skip_unscheduled() {
        let calc = calculator(Viewport::new(0.0, 100.0), 1.0, 0.0, 1000.0, &Identity);
        let events = vec![
            TimelineEvent::new("a", 10, Some(20)),
            TimelineEvent::unscheduled("b"),
            TimelineEvent::new("c", 50, None),
        ];
        let positioned = calc.calculate_event_positions(&events);
        assert_eq!(positioned.len(), 2);
        assert_eq!(positioned[0].event.id, "a");
        assert_eq!(positioned[0].position.width, 10.0);
        assert_eq!(positioned[1].event.id, "c");
        assert_eq!(positioned[1].position.width, MIN_WIDTH_PERCENT);
    }

    #[test]
    fn test_event_anchored_ticks_respect_spacing() {
        let events: Vec<_> = (0..40)
            .map(|i| TimelineEvent::new(format!("e{}", i), i * 7, Some(i * 7 + 3)))
            .collect();
        let calc = calculator(Viewport::new(0.0, 300.0), 1.0, 0.0, 1000.0, &Identity);
        let ticks = calc.generate_ticks(&events);

        assert!(!ticks.is_empty());
        assert_eq!(ticks[0].time_value, 0.0);
        for (i, a) in ticks.iter().enumerate() {
            for b in &ticks[i + 1..] {
                assert!((a.pixel - b.pixel).abs() >= 80.0);
            }
        }
        // Ascending time order
        assert!(ticks.windows(2).all(|w| w[0].time_value < w[1].time_value));
    }

    #[test]
    fn test_event_anchored_spacing_across_collapsed_gap() {
        let events: Vec<_> = (0..10)
            .flat_map(|i| {
                [
                    TimelineEvent::new(format!("early{}", i), i * 7, Some(i * 7 + 3)),
                    TimelineEvent::new(format!("late{}", i), 5000 + i * 7, Some(5000 + i * 7 + 3)),
                ]
            })
            .collect();
        let mut engine = CollapseEngine::default();
        engine.set_events(events.clone());
        engine.set_viewport(Viewport::new(0.0, 6000.0));
        let map = engine.position_map();
        assert!(!map.is_identity());

        let calc = calculator(engine.viewport(), 1.0, 0.0, 1000.0, &map);
        let ticks = calc.generate_ticks(&events);

        // 4934 units of gap shrink to 480, so 5000 lands at 546 / 1546 of the width
        let times: Vec<f64> = ticks.iter().map(|t| t.time_value).collect();
        assert_eq!(times, vec![0.0, 5000.0]);
        assert!((ticks[1].pixel - 546.0 / 1546.0 * 1000.0).abs() < 1e-6);
        for (i, a) in ticks.iter().enumerate() {
            for b in &ticks[i + 1..] {
                assert!((a.pixel - b.pixel).abs() >= 80.0);
            }
        }
    }

    #[test]
    fn test_event_anchored_candidates() {
        let events = [TimelineEvent::new("a", 100, Some(200))];
        let calc = calculator(Viewport::new(0.0, 1000.0), 1.0, 0.0, 10000.0, &Identity);
        let times: Vec<f64> = calc
            .generate_ticks(&events)
            .iter()
            .map(|t| t.time_value)
            .collect();
        assert_eq!(times, vec![100.0, 150.0, 200.0, 300.0, 400.0]);
    }

    #[test]
    fn test_event_anchored_ticks_can_be_empty() {
        let events = [TimelineEvent::new("far", 1_000_000, None)];
        let calc = calculator(Viewport::new(0.0, 100.0), 1.0, 0.0, 1000.0, &Identity);
        assert!(calc.generate_ticks(&events).is_empty());
    }

    #[test]
    fn test_tick_spacing_is_configurable() {
        let events = [TimelineEvent::new("a", 100, Some(200))];
        let settings = LayoutSettings {
            min_tick_spacing_px: 2000.0,
            ..LayoutSettings::default()
        };
        let calc = calculator(Viewport::new(0.0, 1000.0), 1.0, 0.0, 10000.0, &Identity)
            .with_tick_settings(&settings);
        let times: Vec<f64> = calc
            .generate_ticks(&events)
            .iter()
            .map(|t| t.time_value)
            .collect();
        assert_eq!(times, vec![100.0, 300.0]);
    }

    #[test]
    fn test_collapsed_gap_positions_use_adjusted_time() {
        let mut engine = CollapseEngine::default();
        engine.set_events(vec![
            TimelineEvent::new("a", 0, Some(10)),
            TimelineEvent::new("b", 15, Some(20)),
            TimelineEvent::new("c", 400, Some(410)),
        ]);
        engine.set_viewport(Viewport::new(0.0, 1000.0));
        let map = engine.position_map();
        let calc = calculator(engine.viewport(), 1.0, 0.0, 1000.0, &map);

        let collapsed = calc.calculate_collapsed_segment_positions(engine.segments());
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].segment.id, "gap_20_400");

        // Whole viewport adjusts to 700 units; the gap spans 80 of them
        let expected_width = 80.0 / 700.0 * 100.0;
        assert!((collapsed[0].position.width - expected_width).abs() < 1e-9);
        assert!(calc.calculate_expanded_gap_positions(engine.segments()).is_empty());

        // Exact inverse recovers absolute time inside the gap
        let pixel = calc.time_to_pixel(210.0);
        assert!((calc.pixel_to_time_exact(pixel) - 210.0).abs() < 1e-6);
        assert!((calc.pixel_to_time(pixel) - 60.0).abs() < 1e-6);

        engine.toggle_segment_collapse("gap_20_400");
        let map = engine.position_map();
        let calc = calculator(engine.viewport(), 1.0, 0.0, 1000.0, &map);
        assert!(calc.calculate_collapsed_segment_positions(engine.segments()).is_empty());
        let expanded = calc.calculate_expanded_gap_positions(engine.segments());
        assert_eq!(expanded.len(), 1);
        assert!((expanded[0].position.width - 38.0).abs() < 1e-9);
    }
}
