//! Timeline event data structures.
//!
//! This module defines the events consumed by the layout engine and the
//! data-driven viewport that spans them.

use serde::{Deserialize, Serialize};

/// Fraction of the data span added on each side of the viewport.
const VIEWPORT_PADDING_RATIO: f64 = 0.05;

/// Smallest range used as a divisor.
pub const MIN_RANGE: f64 = 1e-6;

/// Viewport used when there is nothing to span.
const EMPTY_VIEWPORT: Viewport = Viewport {
    min_time: 0.0,
    max_time: 100.0,
};

/// A single event on the abstract time axis.
///
/// Times are integer offsets from the project epoch. An event without a
/// `time_start` is kept in the document but excluded from layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Unique event identifier
    pub id: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Start offset, if resolved
    #[serde(default)]
    pub time_start: Option<i64>,
    /// End offset; absent means a point event at `time_start`
    #[serde(default)]
    pub time_end: Option<i64>,
    /// Parent event, for nested events
    #[serde(default)]
    pub parent_event_id: Option<String>,
}

impl TimelineEvent {
    /// Create a point or span event.
    pub fn new(id: impl Into<String>, time_start: i64, time_end: Option<i64>) -> Self {
        Self {
            id: id.into(),
            title: None,
            time_start: Some(time_start),
            time_end,
            parent_event_id: None,
        }
    }

    /// Create an event whose time has not been resolved yet.
    #[cfg(test)]
    pub fn unscheduled(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            time_start: None,
            time_end: None,
            parent_event_id: None,
        }
    }

    /// Effective end of the event (the start for point events).
    pub fn effective_end(&self) -> Option<i64> {
        self.time_start.map(|start| self.time_end.unwrap_or(start))
    }

    /// Title to show, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// The full data-driven time range, before zoom and pan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub min_time: f64,
    pub max_time: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        EMPTY_VIEWPORT
    }
}

impl Viewport {
    pub fn new(min_time: f64, max_time: f64) -> Self {
        Self { min_time, max_time }
    }

    /// Length of the range. May be zero or negative for a degenerate viewport.
    pub fn range(&self) -> f64 {
        self.max_time - self.min_time
    }

    /// Range clamped to `MIN_RANGE`, safe to divide by.
    pub fn safe_range(&self) -> f64 {
        self.range().max(MIN_RANGE)
    }

    /// Build a padded viewport around every scheduled event.
    ///
    /// Returns the default `0..100` viewport when no event has a start time.
    pub fn from_events(events: &[TimelineEvent]) -> Self {
        let mut bounds: Option<(i64, i64)> = None;

        for event in events {
            let (Some(start), Some(end)) = (event.time_start, event.effective_end()) else {
                continue;
            };
            let (lo, hi) = (start.min(end), start.max(end));
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(lo), max.max(hi)),
                None => (lo, hi),
            });
        }

        let Some((min, max)) = bounds else {
            return EMPTY_VIEWPORT;
        };

        let span = max as f64 - min as f64;
        let padding = (span * VIEWPORT_PADDING_RATIO).max(1.0);
        Self {
            min_time: min as f64 - padding,
            max_time: max as f64 + padding,
        }
    }
}

/// A loaded collection of events with document metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventTimeline {
    /// Optional document title
    #[serde(default)]
    pub title: Option<String>,
    /// Epoch the time axis is measured from
    #[serde(default)]
    pub base_date: Option<chrono::NaiveDate>,
    /// All events in document order
    pub events: Vec<TimelineEvent>,
}

impl EventTimeline {
    /// Number of events that take part in layout.
    pub fn scheduled_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.time_start.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_end_point_event() {
        let event = TimelineEvent::new("a", 5, None);
        assert_eq!(event.effective_end(), Some(5));

        let event = TimelineEvent::new("b", 5, Some(9));
        assert_eq!(event.effective_end(), Some(9));

        assert_eq!(TimelineEvent::unscheduled("c").effective_end(), None);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut event = TimelineEvent::new("founding", 0, None);
        assert_eq!(event.display_name(), "founding");
        event.title = Some("Founding of the City".to_string());
        assert_eq!(event.display_name(), "Founding of the City");
    }

    #[test]
    fn test_viewport_from_events_padded() {
        let events = vec![
            TimelineEvent::new("a", 0, Some(10)),
            TimelineEvent::new("b", 190, Some(200)),
            TimelineEvent::unscheduled("c"),
        ];
        let viewport = Viewport::from_events(&events);
        assert_eq!(viewport.min_time, -10.0);
        assert_eq!(viewport.max_time, 210.0);
    }

    #[test]
    fn test_viewport_from_extreme_times() {
        let events = vec![
            TimelineEvent::new("dawn", -9_000_000_000_000_000_000, None),
            TimelineEvent::new("dusk", 9_000_000_000_000_000_000, None),
        ];
        let viewport = Viewport::from_events(&events);
        assert!(viewport.range().is_finite());
        assert!(viewport.min_time < -9.0e18);
        assert!(viewport.max_time > 9.0e18);
    }

    #[test]
    fn test_viewport_single_point_has_range() {
        let viewport = Viewport::from_events(&[TimelineEvent::new("a", 42, None)]);
        assert!(viewport.range() > 0.0);
        assert_eq!(viewport.min_time, 41.0);
        assert_eq!(viewport.max_time, 43.0);
    }

    #[test]
    fn test_viewport_without_events() {
        assert_eq!(Viewport::from_events(&[]), Viewport::new(0.0, 100.0));
        let unscheduled = [TimelineEvent::unscheduled("x")];
        assert_eq!(Viewport::from_events(&unscheduled), Viewport::default());
    }

    #[test]
    fn test_degenerate_viewport_safe_range() {
        let viewport = Viewport::new(5.0, 5.0);
        assert_eq!(viewport.range(), 0.0);
        assert_eq!(viewport.safe_range(), MIN_RANGE);
    }

    #[test]
    fn test_scheduled_count() {
        let timeline = EventTimeline {
            events: vec![
                TimelineEvent::new("a", 0, None),
                TimelineEvent::unscheduled("b"),
            ],
            ..Default::default()
        };
        assert_eq!(timeline.scheduled_count(), 1);
    }
}
