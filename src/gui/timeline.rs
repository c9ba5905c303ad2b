//! Timeline rendering module.
//!
//! This module draws a computed [`TimelineLayout`]: the tick header, event
//! bars stacked into lanes, and markers for collapsed and expanded gaps.
//! Pointer input on the canvas is turned into [`TimelineAction`]s.

use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke};

use crate::core::calculator::{CollapsedSegmentPosition, PositionedEvent};
use crate::core::config::ColorSettings;
use crate::core::label::LabelFormatter;
use crate::core::layout::TimelineLayout;

/// Height of the tick label header.
const HEADER_HEIGHT: f32 = 24.0;

/// Height of each event lane.
const LANE_HEIGHT: f32 = 26.0;

/// Vertical padding inside a lane.
const LANE_PADDING: f32 = 3.0;

/// Horizontal space kept free between events sharing a lane.
const LANE_GAP_PX: f64 = 4.0;

/// Minimum number of lanes drawn, so an empty timeline still has a body.
const MIN_LANES: usize = 3;

/// Height of the strip below the lanes holding the hover read-out.
const FOOTER_HEIGHT: f32 = 18.0;

/// Zoom sensitivity per scrolled point.
const SCROLL_ZOOM_RATE: f64 = 0.002;

/// User interactions on the timeline canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineAction {
    /// Collapse or expand a gap
    ToggleSegment(String),
    /// Drag the view sideways by this many pixels
    Pan(f64),
    /// Zoom by `factor` around a point given in percent of the width
    ZoomAt { anchor_percent: f64, factor: f64 },
}

/// Assign each event a lane so that events in one lane do not overlap.
///
/// Returns one lane index per entry of `events`, in the same order.
pub fn assign_lanes(events: &[PositionedEvent]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        events[a]
            .position
            .left_pixel
            .total_cmp(&events[b].position.left_pixel)
    });

    let mut lane_ends: Vec<f64> = Vec::new();
    let mut lanes = vec![0; events.len()];

    for index in order {
        let position = &events[index].position;
        let right = position.left_pixel + position.width_pixel;

        let lane = match lane_ends
            .iter()
            .position(|&end| end + LANE_GAP_PX <= position.left_pixel)
        {
            Some(lane) => lane,
            None => {
                lane_ends.push(f64::NEG_INFINITY);
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = right;
        lanes[index] = lane;
    }

    lanes
}

/// Draws one frame of the timeline.
pub struct TimelineRenderer<'a> {
    layout: &'a TimelineLayout,
    colors: &'a ColorSettings,
    formatter: &'a dyn LabelFormatter,
    /// Lane per entry of `layout.events`
    lanes: Vec<usize>,
}

impl<'a> TimelineRenderer<'a> {
    pub fn new(
        layout: &'a TimelineLayout,
        colors: &'a ColorSettings,
        formatter: &'a dyn LabelFormatter,
    ) -> Self {
        Self {
            layout,
            colors,
            formatter,
            lanes: assign_lanes(&layout.events),
        }
    }

    fn lane_count(&self) -> usize {
        self.lanes
            .iter()
            .map(|lane| lane + 1)
            .max()
            .unwrap_or(0)
            .max(MIN_LANES)
    }

    /// Total height needed for the timeline.
    pub fn calculate_height(&self) -> f32 {
        HEADER_HEIGHT + self.lane_count() as f32 * LANE_HEIGHT + FOOTER_HEIGHT
    }

    /// Render the timeline into `width` pixels and return any triggered action.
    pub fn render(&self, ui: &mut egui::Ui, width: f32) -> Option<TimelineAction> {
        let height = self.calculate_height().min(ui.available_height().max(HEADER_HEIGHT));
        let (response, painter) =
            ui.allocate_painter(egui::vec2(width, height), egui::Sense::click_and_drag());

        let rect = response.rect;
        let painter = painter.with_clip_rect(rect);

        self.draw_background(&painter, rect);
        self.draw_ticks(&painter, rect);
        self.draw_expanded_gaps(&painter, rect);
        self.draw_events(&painter, rect, response.hover_pos());
        self.draw_collapsed_markers(&painter, rect);
        self.draw_window_readout(&painter, rect);
        if let Some(pointer) = response.hover_pos() {
            self.draw_hover_readout(&painter, rect, pointer);
        }

        self.handle_input(ui, &response, rect)
    }

    fn handle_input(
        &self,
        ui: &egui::Ui,
        response: &egui::Response,
        rect: Rect,
    ) -> Option<TimelineAction> {
        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(id) = self.gap_at(rect, pointer)
        {
            return Some(TimelineAction::ToggleSegment(id));
        }

        if response.dragged() {
            let dx = response.drag_delta().x;
            if dx != 0.0 {
                return Some(TimelineAction::Pan(dx as f64));
            }
        }

        if response.hovered()
            && let Some(pointer) = response.hover_pos()
        {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                let anchor_percent = ((pointer.x - rect.left()) / rect.width()) as f64 * 100.0;
                return Some(TimelineAction::ZoomAt {
                    anchor_percent,
                    factor: (scroll as f64 * SCROLL_ZOOM_RATE).exp(),
                });
            }
        }

        None
    }

    /// Identifier of the collapsed or expanded gap under `pointer`.
    ///
    /// Collapsed markers span the whole body; expanded gaps are only
    /// clickable in the header.
    fn gap_at(&self, rect: Rect, pointer: Pos2) -> Option<String> {
        let hit = |gap: &CollapsedSegmentPosition, top: f32, bottom: f32| {
            gap.position.visible && gap_rect(rect, gap, top, bottom).contains(pointer)
        };

        self.layout
            .collapsed
            .iter()
            .find(|gap| hit(gap, rect.top(), rect.bottom()))
            .or_else(|| {
                self.layout
                    .expanded
                    .iter()
                    .find(|gap| hit(gap, rect.top(), rect.top() + HEADER_HEIGHT))
            })
            .map(|gap| gap.segment.id.clone())
    }

    fn draw_background(&self, painter: &Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, self.colors.background_color());

        let header_rect = Rect::from_min_max(
            rect.min,
            Pos2::new(rect.right(), rect.top() + HEADER_HEIGHT),
        );
        painter.rect_filled(header_rect, 0.0, self.colors.header_background_color());

        painter.line_segment(
            [
                Pos2::new(rect.left(), rect.top() + HEADER_HEIGHT),
                Pos2::new(rect.right(), rect.top() + HEADER_HEIGHT),
            ],
            Stroke::new(1.0, Color32::DARK_GRAY),
        );
        painter.rect_stroke(
            rect,
            0.0,
            Stroke::new(1.0, Color32::DARK_GRAY),
            egui::StrokeKind::Inside,
        );
    }

    fn draw_ticks(&self, painter: &Painter, rect: Rect) {
        for tick in &self.layout.ticks {
            let x = rect.left() + tick.pixel as f32;

            painter.line_segment(
                [
                    Pos2::new(x, rect.top() + HEADER_HEIGHT),
                    Pos2::new(x, rect.bottom() - FOOTER_HEIGHT),
                ],
                Stroke::new(0.5, self.colors.tick_color()),
            );
            painter.text(
                Pos2::new(x + 3.0, rect.top() + HEADER_HEIGHT / 2.0),
                egui::Align2::LEFT_CENTER,
                &tick.label,
                egui::FontId::proportional(10.0),
                self.colors.tick_label_color(),
            );
        }
    }

    fn draw_events(&self, painter: &Painter, rect: Rect, hover: Option<Pos2>) {
        for (positioned, &lane) in self.layout.events.iter().zip(&self.lanes) {
            let position = &positioned.position;
            if !position.visible {
                continue;
            }

            let top = rect.top() + HEADER_HEIGHT + lane as f32 * LANE_HEIGHT + LANE_PADDING;
            let event_rect = Rect::from_min_size(
                Pos2::new(rect.left() + position.left_pixel as f32, top),
                egui::vec2(
                    (position.width_pixel as f32).max(2.0),
                    LANE_HEIGHT - LANE_PADDING * 2.0,
                ),
            );

            let is_point = positioned
                .event
                .time_end
                .is_none_or(|end| Some(end) == positioned.event.time_start);
            let fill = if is_point {
                self.colors.event_point_color()
            } else {
                self.colors.event_span_color()
            };
            painter.rect_filled(event_rect, 2.0, fill);

            if hover.is_some_and(|p| event_rect.contains(p)) {
                painter.rect_stroke(
                    event_rect,
                    2.0,
                    Stroke::new(1.5, self.colors.hover_color()),
                    egui::StrokeKind::Outside,
                );
            }

            painter.text(
                Pos2::new(event_rect.left() + 4.0, event_rect.center().y),
                egui::Align2::LEFT_CENTER,
                positioned.event.display_name(),
                egui::FontId::proportional(11.0),
                self.colors.text_label_color(),
            );
        }
    }

    fn draw_collapsed_markers(&self, painter: &Painter, rect: Rect) {
        for gap in self.layout.collapsed.iter().filter(|g| g.position.visible) {
            let marker = gap_rect(rect, gap, rect.top() + HEADER_HEIGHT, rect.bottom() - FOOTER_HEIGHT);
            painter.rect_filled(marker, 0.0, self.colors.collapsed_marker_color_alpha(60));

            // Break lines on both edges
            for x in [marker.left(), marker.right()] {
                painter.line_segment(
                    [Pos2::new(x, marker.top()), Pos2::new(x, marker.bottom())],
                    Stroke::new(1.5, self.colors.collapsed_marker_color()),
                );
            }

            painter.text(
                marker.center(),
                egui::Align2::CENTER_CENTER,
                format!("≈ {}", gap.segment.duration),
                egui::FontId::proportional(11.0),
                self.colors.text_label_color(),
            );
        }
    }

    fn draw_expanded_gaps(&self, painter: &Painter, rect: Rect) {
        for gap in self.layout.expanded.iter().filter(|g| g.position.visible) {
            let bracket = gap_rect(rect, gap, rect.top() + 2.0, rect.top() + HEADER_HEIGHT - 2.0);
            painter.rect_stroke(
                bracket,
                2.0,
                Stroke::new(1.0, self.colors.expanded_gap_color()),
                egui::StrokeKind::Inside,
            );
        }
    }

    /// Absolute time window shown, in the footer's right corner.
    fn draw_window_readout(&self, painter: &Painter, rect: Rect) {
        let calc = self.layout.calculator(self.formatter);
        let start = calc.zoomed_start();
        let end = start + calc.zoomed_range();

        painter.text(
            Pos2::new(rect.right() - 4.0, rect.bottom() - FOOTER_HEIGHT / 2.0),
            egui::Align2::RIGHT_CENTER,
            format!("{} to {}", self.formatter.format(start), self.formatter.format(end)),
            egui::FontId::monospace(10.0),
            self.colors.text_dim_color(),
        );
    }

    fn draw_hover_readout(&self, painter: &Painter, rect: Rect, pointer: Pos2) {
        let calc = self.layout.calculator(self.formatter);
        let x = ((pointer.x - rect.left()) as f64).clamp(0.0, calc.pixel_width());
        let time = calc.pixel_to_time_exact(x);

        painter.line_segment(
            [
                Pos2::new(pointer.x, rect.top() + HEADER_HEIGHT),
                Pos2::new(pointer.x, rect.bottom() - FOOTER_HEIGHT),
            ],
            Stroke::new(0.5, self.colors.text_dim_color()),
        );
        painter.text(
            Pos2::new(pointer.x + 4.0, rect.bottom() - FOOTER_HEIGHT / 2.0),
            egui::Align2::LEFT_CENTER,
            self.formatter.format(time),
            egui::FontId::monospace(10.0),
            self.colors.text_dim_color(),
        );
    }
}

/// Screen rectangle of a gap between `top` and `bottom`.
fn gap_rect(rect: Rect, gap: &CollapsedSegmentPosition, top: f32, bottom: f32) -> Rect {
    let left = rect.left() + gap.position.left_pixel as f32;
    Rect::from_min_max(
        Pos2::new(left, top),
        Pos2::new(left + gap.position.width_pixel as f32, bottom),
    )
}
