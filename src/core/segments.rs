//! Time segmentation of a sorted event list.
//!
//! Events are walked in time order and the axis is partitioned into event
//! spans and the gaps between consecutive events. A gap that is long
//! relative to its neighbours becomes collapsible, and is shown collapsed
//! unless its identifier is in the expanded set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::event::TimelineEvent;

/// Multiplier applied to the average neighbouring event duration.
pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 3.0;

/// A gap that qualifies for collapsing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollapsedSegment {
    /// Stable identifier derived from the gap bounds
    pub id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
    /// Minimum duration this gap had to exceed
    pub collapse_threshold: f64,
}

impl CollapsedSegment {
    /// Identifier for the gap spanning `start..end`.
    pub fn id_for(start_time: i64, end_time: i64) -> String {
        format!("gap_{}_{}", start_time, end_time)
    }
}

/// One contiguous piece of the time axis.
#[derive(Clone, Debug, PartialEq)]
pub enum TimeSegment {
    /// Span covered by a single event.
    Event {
        start_time: i64,
        end_time: i64,
        duration: i64,
        event_ids: Vec<String>,
    },
    /// Gap shown at full length, either short or manually expanded.
    Gap {
        start_time: i64,
        end_time: i64,
        duration: i64,
        /// Set when the gap is collapsible but the user expanded it
        collapsible: Option<CollapsedSegment>,
    },
    /// Gap compressed to a fixed on-screen width.
    Collapsed(CollapsedSegment),
}

impl TimeSegment {
    pub fn start_time(&self) -> i64 {
        match self {
            Self::Event { start_time, .. } | Self::Gap { start_time, .. } => *start_time,
            Self::Collapsed(segment) => segment.start_time,
        }
    }

    pub fn end_time(&self) -> i64 {
        match self {
            Self::Event { end_time, .. } | Self::Gap { end_time, .. } => *end_time,
            Self::Collapsed(segment) => segment.end_time,
        }
    }

    pub fn duration(&self) -> i64 {
        match self {
            Self::Event { duration, .. } | Self::Gap { duration, .. } => *duration,
            Self::Collapsed(segment) => segment.duration,
        }
    }

    /// The collapse descriptor, if this segment is collapsible at all.
    pub fn collapsible(&self) -> Option<&CollapsedSegment> {
        match self {
            Self::Collapsed(segment) => Some(segment),
            Self::Gap { collapsible, .. } => collapsible.as_ref(),
            Self::Event { .. } => None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self, Self::Collapsed(_))
    }
}

/// Duration used for layout math; never below one unit.
pub fn span_duration(start: i64, end: i64) -> i64 {
    end.saturating_sub(start).max(1)
}

/// Scheduled events sorted by start time.
///
/// Unscheduled events are dropped. The sort is stable, so events sharing a
/// start time keep their input order.
pub fn sorted_scheduled(events: &[TimelineEvent]) -> Vec<&TimelineEvent> {
    let mut scheduled: Vec<&TimelineEvent> =
        events.iter().filter(|e| e.time_start.is_some()).collect();
    scheduled.sort_by_key(|e| e.time_start);
    scheduled
}

/// Partition the time axis covered by `events` into segments.
///
/// # Arguments
/// * `events` - Events in any order; unscheduled ones are ignored
/// * `expanded_ids` - Collapsible gaps the user has expanded
/// * `threshold_multiplier` - Factor applied to the average neighbour duration
pub fn compute_segments(
    events: &[TimelineEvent],
    expanded_ids: &HashSet<String>,
    threshold_multiplier: f64,
) -> Vec<TimeSegment> {
    let scheduled = sorted_scheduled(events);
    let mut segments = Vec::with_capacity(scheduled.len() * 2);

    for (index, event) in scheduled.iter().enumerate() {
        let (Some(start), Some(end)) = (event.time_start, event.effective_end()) else {
            continue;
        };

        segments.push(TimeSegment::Event {
            start_time: start,
            end_time: end,
            duration: span_duration(start, end),
            event_ids: vec![event.id.clone()],
        });

        let Some(next) = scheduled.get(index + 1) else {
            continue;
        };
        let (Some(next_start), Some(next_end)) = (next.time_start, next.effective_end()) else {
            continue;
        };

        let gap_duration = next_start.saturating_sub(end);
        if gap_duration <= 0 {
            continue;
        }

        let average =
            (span_duration(start, end) as f64 + span_duration(next_start, next_end) as f64) / 2.0;
        let threshold = threshold_multiplier * average;

        if (gap_duration as f64) > threshold {
            let descriptor = CollapsedSegment {
                id: CollapsedSegment::id_for(end, next_start),
                start_time: end,
                end_time: next_start,
                duration: gap_duration,
                collapse_threshold: threshold,
            };
            if expanded_ids.contains(&descriptor.id) {
                segments.push(TimeSegment::Gap {
                    start_time: end,
                    end_time: next_start,
                    duration: gap_duration,
                    collapsible: Some(descriptor),
                });
            } else {
                segments.push(TimeSegment::Collapsed(descriptor));
            }
        } else {
            segments.push(TimeSegment::Gap {
                start_time: end,
                end_time: next_start,
                duration: gap_duration,
                collapsible: None,
            });
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_events() -> Vec<TimelineEvent> {
        vec![
            TimelineEvent::new("a", 0, Some(10)),
            TimelineEvent::new("b", 15, Some(20)),
            TimelineEvent::new("c", 400, Some(410)),
        ]
    }

    fn none() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_empty_event_list() {
        assert!(compute_segments(&[], &none(), DEFAULT_THRESHOLD_MULTIPLIER).is_empty());
    }

    #[test]
    fn test_single_event_has_no_gaps() {
        let events = [TimelineEvent::new("a", 3, Some(8))];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 1);
        assert!(matches!(
            &segments[0],
            TimeSegment::Event { start_time: 3, end_time: 8, duration: 5, .. }
        ));
    }

    #[test]
    fn test_extreme_times_saturate() {
        let events = [
            TimelineEvent::new("dawn", -9_000_000_000_000_000_000, None),
            TimelineEvent::new("dusk", 9_000_000_000_000_000_000, None),
        ];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 3);
        assert!(segments[1].is_collapsed());
        assert_eq!(segments[1].duration(), i64::MAX);

        let wide = [
            TimelineEvent::new("age", i64::MIN, Some(i64::MAX)),
            TimelineEvent::new("after", i64::MAX, None),
        ];
        let segments = compute_segments(&wide, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].duration(), i64::MAX);
    }

    #[test]
    fn test_zero_length_event_gets_unit_duration() {
        let events = [TimelineEvent::new("a", 7, None)];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments[0].duration(), 1);
    }

    #[test]
    fn test_scenario_short_gap_kept_long_gap_collapsed() {
        let segments = compute_segments(&scenario_events(), &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 5);

        match &segments[1] {
            TimeSegment::Gap {
                start_time,
                end_time,
                duration,
                collapsible,
            } => {
                assert_eq!((*start_time, *end_time, *duration), (10, 15, 5));
                assert!(collapsible.is_none());
            }
            other => panic!("Expected plain gap, got {:?}", other),
        }

        match &segments[3] {
            TimeSegment::Collapsed(gap) => {
                assert_eq!(gap.id, "gap_20_400");
                assert_eq!(gap.duration, 380);
                assert!((gap.collapse_threshold - 22.5).abs() < 1e-9);
            }
            other => panic!("Expected collapsed gap, got {:?}", other),
        }
    }

    #[test]
    fn test_expanded_gap_is_plain_gap() {
        let mut expanded = HashSet::new();
        expanded.insert("gap_20_400".to_string());
        let segments = compute_segments(&scenario_events(), &expanded, DEFAULT_THRESHOLD_MULTIPLIER);

        assert!(segments.iter().all(|s| !s.is_collapsed()));
        let gap = segments[3].collapsible().expect("still collapsible");
        assert_eq!(gap.id, "gap_20_400");
    }

    #[test]
    fn test_stale_expanded_id_has_no_effect() {
        let mut expanded = HashSet::new();
        expanded.insert("gap_1_2".to_string());
        let with_stale = compute_segments(&scenario_events(), &expanded, DEFAULT_THRESHOLD_MULTIPLIER);
        let without = compute_segments(&scenario_events(), &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(with_stale, without);
    }

    #[test]
    fn test_threshold_invariant_holds() {
        let events = vec![
            TimelineEvent::new("a", 0, Some(4)),
            TimelineEvent::new("b", 10, Some(12)),
            TimelineEvent::new("c", 13, None),
            TimelineEvent::new("d", 100, Some(140)),
            TimelineEvent::new("e", 150, Some(152)),
            TimelineEvent::new("f", 1000, Some(1001)),
        ];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);

        for (index, segment) in segments.iter().enumerate() {
            if matches!(segment, TimeSegment::Event { .. }) {
                continue;
            }
            let prev = segments[index - 1].duration() as f64;
            let next = segments[index + 1].duration() as f64;
            let threshold = 3.0 * (prev + next) / 2.0;
            let gap = segment.duration() as f64;
            if segment.is_collapsed() {
                assert!(gap > threshold, "collapsed gap {} <= {}", gap, threshold);
            } else {
                assert!(gap <= threshold, "plain gap {} > {}", gap, threshold);
            }
        }
    }

    #[test]
    fn test_uniform_spacing_never_collapses() {
        let events: Vec<_> = (0..10)
            .map(|i| TimelineEvent::new(format!("e{}", i), i * 20, Some(i * 20 + 10)))
            .collect();
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 19);
        assert!(segments.iter().all(|s| !s.is_collapsed()));
    }

    #[test]
    fn test_unscheduled_events_ignored_and_order_stable() {
        let events = vec![
            TimelineEvent::new("late", 50, None),
            TimelineEvent::unscheduled("floating"),
            TimelineEvent::new("first", 0, None),
            TimelineEvent::new("second", 0, None),
        ];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        let ids: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                TimeSegment::Event { event_ids, .. } => Some(event_ids[0].as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_overlapping_events_emit_no_gap() {
        let events = vec![
            TimelineEvent::new("a", 0, Some(20)),
            TimelineEvent::new("b", 10, Some(30)),
        ];
        let segments = compute_segments(&events, &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_multiplier_is_configurable() {
        let segments = compute_segments(&scenario_events(), &none(), 100.0);
        assert!(segments.iter().all(|s| !s.is_collapsed()));
    }

    #[test]
    fn test_compute_segments_is_deterministic() {
        let first = compute_segments(&scenario_events(), &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        let second = compute_segments(&scenario_events(), &none(), DEFAULT_THRESHOLD_MULTIPLIER);
        assert_eq!(first, second);
    }
}
