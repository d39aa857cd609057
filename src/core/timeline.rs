//! One timeline instance: playback state, axis, derived model and the render
//! engine that draws them.

use thiserror::Error;

use super::axis::AxisMapper;
use super::interaction::{
    self, InteractionController, PointerPosition, SeekRequest, TooltipUpdate,
};
use super::model::{Segment, TimelineEntry, TimelineModel};
use super::render::{
    CircleShape, Easing, ElementId, HitTarget, Layer, LineShape, MarkerKey, OverlayShape,
    Primitive, ReconcileStats, RectShape, RenderBackend, RenderEngine, TextShape,
    Transition, VisualState,
};
use crate::constants::*;

const TOOLTIP_KEY: &str = "tooltip";
const PROGRESS_KEY: &str = "progress";

const MARKER_TRANSITION: Transition = Transition {
    duration_ms: MARKER_TRANSITION_MS,
    easing: Easing::CubicInOut,
};

const PROGRESS_TRANSITION: Transition = Transition {
    duration_ms: PROGRESS_TRANSITION_MS,
    easing: Easing::Linear,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("timeline container {0:?} is missing")]
    MissingElement(String),
    #[error("timeline container {id:?} is too narrow ({width}px)")]
    ContainerTooNarrow { id: String, width: f64 },
    #[error("video duration must be positive, got {0}")]
    InvalidDuration(f64),
}

/// Measured container the timeline draws into.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    /// Outer width in pixels; `None` when the element was not found.
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub current_seconds: f64,
    pub video_duration_seconds: f64,
}

impl PlaybackState {
    pub fn classify(&self, marker_seconds: u32) -> VisualState {
        VisualState::classify(marker_seconds, self.current_seconds)
    }
}

pub struct Timeline<B> {
    model: TimelineModel,
    segments: Vec<Segment>,
    axis: AxisMapper,
    playback: PlaybackState,
    engine: RenderEngine<B>,
    interaction: InteractionController,
    hovered: Option<MarkerKey>,
}

impl<B: RenderBackend> Timeline<B> {
    /// Build and draw. `duration_seconds` must already be resolved.
    pub fn new(
        model: TimelineModel,
        duration_seconds: f64,
        container: &Container,
        backend: B,
    ) -> Result<Self, TimelineError> {
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(TimelineError::InvalidDuration(duration_seconds));
        }
        let outer_width = container
            .width
            .ok_or_else(|| TimelineError::MissingElement(container.id.clone()))?;
        let plot_width = outer_width - TIMELINE_MARGIN_LEFT - TIMELINE_MARGIN_RIGHT;
        if plot_width <= 0.0 {
            return Err(TimelineError::ContainerTooNarrow {
                id: container.id.clone(),
                width: outer_width,
            });
        }

        let segments = model.segments(duration_seconds);
        let mut timeline = Self {
            model,
            segments,
            axis: AxisMapper::new(duration_seconds, plot_width),
            playback: PlaybackState {
                current_seconds: 0.0,
                video_duration_seconds: duration_seconds,
            },
            engine: RenderEngine::new(backend),
            interaction: InteractionController::new(),
            hovered: None,
        };
        timeline.update_vis();
        Ok(timeline)
    }

    pub fn model(&self) -> &TimelineModel {
        &self.model
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn axis(&self) -> &AxisMapper {
        &self.axis
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn engine(&self) -> &RenderEngine<B> {
        &self.engine
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.engine.backend_mut()
    }

    /// Full redraw of every layer.
    pub fn update_vis(&mut self) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let segments = self.segment_elements();
        let axis = self.axis_elements();
        let ticks = self.tick_elements();
        let markers = self.marker_elements();
        let labels = self.label_elements();
        stats.absorb(self.engine.reconcile(Layer::Segments, segments, None));
        stats.absorb(self.engine.reconcile(Layer::Axis, axis, None));
        stats.absorb(self.engine.reconcile(Layer::Ticks, ticks, None));
        stats.absorb(self.engine.reconcile(Layer::Markers, markers, Some(MARKER_TRANSITION)));
        stats.absorb(self.engine.reconcile(Layer::Labels, labels, None));
        stats.absorb(self.draw_progress());
        let overlay = self.overlay_elements();
        stats.absorb(self.engine.reconcile(Layer::Overlay, overlay, None));
        stats
    }

    /// Move the playback position and restyle what that changes.
    pub fn set_current_seconds(&mut self, seconds: f64) -> ReconcileStats {
        let previous = self.playback.current_seconds;
        self.playback.current_seconds = seconds;
        self.refresh_playback(previous)
    }

    /// Cheap path after a position change: restyles only the markers whose
    /// past/future state flipped between `previous` and now, then moves the
    /// progress line.
    pub fn refresh_playback(&mut self, previous: f64) -> ReconcileStats {
        let current = self.playback.current_seconds;
        let (low, high) = if previous <= current {
            (previous, current)
        } else {
            (current, previous)
        };
        let flipped: Vec<(String, Primitive)> = self
            .model
            .entries()
            .iter()
            .filter(|entry| {
                let seconds = entry.seconds() as f64;
                seconds > low && seconds <= high
            })
            .map(|entry| self.marker_element(entry))
            .collect();

        let mut stats = ReconcileStats::default();
        for (key, primitive) in flipped {
            let id = ElementId::new(Layer::Markers, key);
            stats.absorb(self.engine.put(&id, primitive, Some(MARKER_TRANSITION)));
        }
        stats.absorb(self.draw_progress());
        stats
    }

    /// Click on the axis background at plot x.
    pub fn click_axis(&mut self, x: f64) -> Option<SeekRequest> {
        let seek = interaction::resolve_axis_click(&self.model, &self.axis, x)?;
        self.playback.current_seconds = seek.seconds as f64;
        self.update_vis();
        Some(seek)
    }

    pub fn click_marker(&mut self, key: MarkerKey) -> Option<SeekRequest> {
        let seek = interaction::resolve_marker_click(&self.model, key)?;
        self.set_current_seconds(seek.seconds as f64);
        Some(seek)
    }

    pub fn click_table_row(&mut self, row: usize) -> Option<SeekRequest> {
        let seek = interaction::resolve_table_click(&self.model, row)?;
        self.set_current_seconds(seek.seconds as f64);
        Some(seek)
    }

    pub fn hover_axis(&mut self, x: f64, pointer: PointerPosition) -> ReconcileStats {
        let mut stats = self.set_hovered(None);
        let update = self
            .interaction
            .hover_axis(&self.model, &self.axis, x, pointer);
        stats.absorb(self.apply_tooltip(update));
        stats
    }

    pub fn hover_marker(&mut self, key: MarkerKey, pointer: PointerPosition) -> ReconcileStats {
        let mut stats = self.set_hovered(Some(key));
        let update = self.interaction.hover_marker(&self.model, key, pointer);
        stats.absorb(self.apply_tooltip(update));
        stats
    }

    pub fn pointer_out(&mut self) -> ReconcileStats {
        let mut stats = self.set_hovered(None);
        let update = self.interaction.pointer_out();
        stats.absorb(self.apply_tooltip(update));
        stats
    }

    fn set_hovered(&mut self, key: Option<MarkerKey>) -> ReconcileStats {
        if self.hovered == key {
            return ReconcileStats::default();
        }
        let touched: Vec<MarkerKey> = self.hovered.into_iter().chain(key).collect();
        self.hovered = key;
        let mut stats = ReconcileStats::default();
        for marker in touched {
            let row = match marker {
                MarkerKey::Point(row) | MarkerKey::Boundary(row) => row,
            };
            let Some(entry) = self.model.find(row) else {
                continue;
            };
            let (key, primitive) = self.marker_element(entry);
            let id = ElementId::new(Layer::Markers, key);
            stats.absorb(self.engine.put(&id, primitive, Some(MARKER_TRANSITION)));
        }
        stats
    }

    fn apply_tooltip(&mut self, update: TooltipUpdate) -> ReconcileStats {
        let id = ElementId::new(Layer::Overlay, TOOLTIP_KEY);
        match update {
            TooltipUpdate::Show(tooltip) => self.engine.put(&id, overlay_primitive(&tooltip), None),
            TooltipUpdate::Hide => self.engine.remove(&id),
            TooltipUpdate::Unchanged => ReconcileStats::default(),
        }
    }

    fn draw_progress(&mut self) -> ReconcileStats {
        let x = self.axis.to_px(self.playback.current_seconds);
        let line = Primitive::Line(LineShape {
            x1: x,
            y1: 0.0,
            x2: x,
            y2: TIMELINE_PLOT_HEIGHT,
            stroke: COLOR_PROGRESS,
            stroke_width: 2.0,
        });
        let id = ElementId::new(Layer::Progress, PROGRESS_KEY);
        self.engine.put(&id, line, Some(PROGRESS_TRANSITION))
    }

    fn segment_elements(&self) -> Vec<(String, Primitive)> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let x = self.axis.to_px(segment.start_seconds);
                let end = self.axis.to_px(segment.end_seconds);
                let rect = Primitive::Rect(RectShape {
                    x,
                    y: TIMELINE_CENTER_Y - CLICK_BAND_HALF_HEIGHT,
                    width: (end - x).max(0.0),
                    height: CLICK_BAND_HALF_HEIGHT * 2.0,
                    fill: segment.color(),
                    opacity: SEGMENT_OPACITY,
                    hit: None,
                });
                (format!("segment-{i}"), rect)
            })
            .collect()
    }

    fn axis_elements(&self) -> Vec<(String, Primitive)> {
        let width = self.axis.width_px();
        vec![
            (
                "axis-line".to_string(),
                Primitive::Line(LineShape {
                    x1: 0.0,
                    y1: TIMELINE_CENTER_Y,
                    x2: width,
                    y2: TIMELINE_CENTER_Y,
                    stroke: COLOR_AXIS,
                    stroke_width: 2.0,
                }),
            ),
            (
                "axis-hit".to_string(),
                Primitive::Rect(RectShape {
                    x: 0.0,
                    y: TIMELINE_CENTER_Y - CLICK_BAND_HALF_HEIGHT,
                    width,
                    height: CLICK_BAND_HALF_HEIGHT * 2.0,
                    fill: "transparent",
                    opacity: 1.0,
                    hit: Some(HitTarget::Axis),
                }),
            ),
        ]
    }

    fn tick_elements(&self) -> Vec<(String, Primitive)> {
        let mut elements = Vec::with_capacity(self.model.entries().len() * 2);
        for entry in self.model.entries() {
            let x = self.axis.to_px(entry.seconds() as f64);
            let row = entry.row();
            elements.push((
                format!("tick-{row}"),
                Primitive::Line(LineShape {
                    x1: x,
                    y1: TIMELINE_CENTER_Y - TICK_HALF_HEIGHT,
                    x2: x,
                    y2: TIMELINE_CENTER_Y + TICK_HALF_HEIGHT,
                    stroke: COLOR_TICK,
                    stroke_width: 1.0,
                }),
            ));
            elements.push((
                format!("time-{row}"),
                Primitive::Text(TextShape {
                    x,
                    y: TIMELINE_CENTER_Y + 20.0,
                    text: entry.time_text().to_string(),
                    font_size: 10.0,
                    fill: COLOR_LABEL,
                }),
            ));
        }
        elements
    }

    fn marker_elements(&self) -> Vec<(String, Primitive)> {
        self.model
            .entries()
            .iter()
            .map(|entry| self.marker_element(entry))
            .collect()
    }

    fn marker_element(&self, entry: &TimelineEntry) -> (String, Primitive) {
        let x = self.axis.to_px(entry.seconds() as f64);
        let fill = match self.playback.classify(entry.seconds()) {
            VisualState::Past => COLOR_PAST,
            VisualState::Future => COLOR_FUTURE,
        };
        match entry {
            TimelineEntry::Event(point) => {
                let key = MarkerKey::Point(point.row);
                let r = if self.hovered == Some(key) {
                    DOT_RADIUS_HOVER
                } else {
                    DOT_RADIUS
                };
                (
                    format!("point-{}", point.row),
                    Primitive::Circle(CircleShape {
                        cx: x,
                        cy: TIMELINE_CENTER_Y,
                        r,
                        fill,
                        stroke: COLOR_DOT_STROKE,
                        stroke_width: 2.0,
                        hit: Some(HitTarget::Marker(key)),
                    }),
                )
            }
            TimelineEntry::FloorBoundary(boundary) => {
                let key = MarkerKey::Boundary(boundary.row);
                let width = if self.hovered == Some(key) {
                    BAR_WIDTH_HOVER
                } else {
                    BAR_WIDTH
                };
                (
                    format!("bar-{}", boundary.row),
                    Primitive::Rect(RectShape {
                        x: x - width / 2.0,
                        y: TIMELINE_CENTER_Y - BAR_HALF_HEIGHT,
                        width,
                        height: BAR_HALF_HEIGHT * 2.0,
                        fill,
                        opacity: 1.0,
                        hit: Some(HitTarget::Marker(key)),
                    }),
                )
            }
        }
    }

    fn label_elements(&self) -> Vec<(String, Primitive)> {
        self.model
            .entries()
            .iter()
            .map(|entry| {
                let x = self.axis.to_px(entry.seconds() as f64);
                match entry {
                    TimelineEntry::Event(point) => (
                        format!("kind-{}", point.row),
                        label_text(x, -10.0, point.record.kind.clone()),
                    ),
                    TimelineEntry::FloorBoundary(boundary) => (
                        format!("floor-{}", boundary.row),
                        label_text(x, TIMELINE_CENTER_Y - 25.0, format!("F{}", boundary.floor)),
                    ),
                }
            })
            .collect()
    }

    fn overlay_elements(&self) -> Vec<(String, Primitive)> {
        self.interaction
            .tooltip()
            .map(|tooltip| (TOOLTIP_KEY.to_string(), overlay_primitive(tooltip)))
            .into_iter()
            .collect()
    }
}

fn label_text(x: f64, y: f64, text: String) -> Primitive {
    Primitive::Text(TextShape {
        x,
        y,
        text,
        font_size: 12.0,
        fill: COLOR_LABEL,
    })
}

fn overlay_primitive(tooltip: &interaction::Tooltip) -> Primitive {
    Primitive::Overlay(OverlayShape {
        x: tooltip.pointer.x + TOOLTIP_OFFSET_X,
        y: tooltip.pointer.y + TOOLTIP_OFFSET_Y,
        lines: tooltip.lines.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::build_model;
    use crate::core::model::tests::{floor_row, row};
    use crate::core::render::tests::RecordingBackend;

    /// Plot width 1000 with the default margins.
    fn container() -> Container {
        Container {
            id: "timeline-container1-1".into(),
            width: Some(1000.0 + TIMELINE_MARGIN_LEFT + TIMELINE_MARGIN_RIGHT),
        }
    }

    fn timeline() -> Timeline<RecordingBackend> {
        let model = build_model(&[
            floor_row("00:00", 1),
            row("00:10", "door", "entry"),
            row("00:50", "stairs", "move"),
            floor_row("01:40", 2),
        ]);
        Timeline::new(model, 600.0, &container(), RecordingBackend::default()).unwrap()
    }

    fn fill_of(timeline: &Timeline<RecordingBackend>, key: &str) -> &'static str {
        match timeline.engine().get(&ElementId::new(Layer::Markers, key)) {
            Some(Primitive::Circle(circle)) => circle.fill,
            Some(Primitive::Rect(rect)) => rect.fill,
            other => panic!("no marker {key}: {other:?}"),
        }
    }

    fn progress_x(timeline: &Timeline<RecordingBackend>) -> f64 {
        match timeline.engine().get(&ElementId::new(Layer::Progress, PROGRESS_KEY)) {
            Some(Primitive::Line(line)) => line.x1,
            other => panic!("no progress line: {other:?}"),
        }
    }

    #[test]
    fn test_initial_draw() {
        let timeline = timeline();
        let engine = timeline.engine();
        assert_eq!(engine.layer_len(Layer::Segments), 2);
        assert_eq!(engine.layer_len(Layer::Axis), 2);
        assert_eq!(engine.layer_len(Layer::Ticks), 8);
        assert_eq!(engine.layer_len(Layer::Markers), 4);
        assert_eq!(engine.layer_len(Layer::Labels), 4);
        assert_eq!(engine.layer_len(Layer::Progress), 1);
        assert_eq!(engine.layer_len(Layer::Overlay), 0);
        assert_eq!(timeline.axis().width_px(), 1000.0);
    }

    #[test]
    fn test_full_redraw_is_idempotent() {
        let mut timeline = timeline();
        timeline.set_current_seconds(55.0);
        let before = timeline.engine().backend().live.clone();
        let total = timeline.engine().backend().total();

        assert!(timeline.update_vis().is_noop());
        assert!(timeline.update_vis().is_noop());
        assert_eq!(timeline.engine().backend().total(), total);
        assert_eq!(timeline.engine().backend().live, before);
    }

    #[test]
    fn test_past_future_classification() {
        let mut timeline = timeline();
        assert_eq!(fill_of(&timeline, "bar-0"), COLOR_PAST);
        assert_eq!(fill_of(&timeline, "point-1"), COLOR_FUTURE);

        timeline.set_current_seconds(9.0);
        assert_eq!(fill_of(&timeline, "point-1"), COLOR_FUTURE);
        timeline.set_current_seconds(10.0);
        assert_eq!(fill_of(&timeline, "point-1"), COLOR_PAST);
        assert_eq!(fill_of(&timeline, "point-2"), COLOR_FUTURE);

        timeline.set_current_seconds(0.0);
        assert_eq!(fill_of(&timeline, "point-1"), COLOR_FUTURE);
    }

    #[test]
    fn test_refresh_touches_only_flipped_markers() {
        let mut timeline = timeline();
        let stats = timeline.set_current_seconds(60.0);
        // point-1 and point-2 flip, plus the progress line.
        assert_eq!(stats.updated, 3);
        assert_eq!(stats.created + stats.removed, 0);
        assert_eq!(progress_x(&timeline), 100.0);

        let stats = timeline.set_current_seconds(61.0);
        assert_eq!(stats.updated, 1);
        let stats = timeline.set_current_seconds(61.0);
        assert!(stats.is_noop());
    }

    #[test]
    fn test_progress_uses_transition() {
        let mut timeline = timeline();
        timeline.set_current_seconds(30.0);
        assert_eq!(timeline.engine().backend().last_transition, Some(PROGRESS_TRANSITION));
    }

    #[test]
    fn test_axis_click_seeks_to_boundary() {
        let mut timeline = timeline();
        let x = timeline.axis().to_px(450.0);
        let seek = timeline.click_axis(x).unwrap();
        assert_eq!(seek.seconds, 100);
        assert_eq!(timeline.playback().current_seconds, 100.0);
        assert_eq!(fill_of(&timeline, "bar-3"), COLOR_PAST);
        assert!(timeline.click_axis(-20.0).is_none());
        assert_eq!(timeline.playback().current_seconds, 100.0);
    }

    #[test]
    fn test_marker_click_seeks_to_marker() {
        let mut timeline = timeline();
        let seek = timeline.click_marker(MarkerKey::Point(2)).unwrap();
        assert_eq!(seek.seconds, 50);
        assert_eq!(fill_of(&timeline, "point-2"), COLOR_PAST);
        assert_eq!(progress_x(&timeline), timeline.axis().to_px(50.0));
    }

    #[test]
    fn test_hover_shows_single_overlay_and_enlarges() {
        let mut timeline = timeline();
        timeline.hover_marker(MarkerKey::Point(1), PointerPosition::new(50.0, 30.0));
        timeline.hover_marker(MarkerKey::Boundary(3), PointerPosition::new(80.0, 30.0));
        assert_eq!(timeline.engine().layer_len(Layer::Overlay), 1);
        match timeline.engine().get(&ElementId::new(Layer::Markers, "bar-3")) {
            Some(Primitive::Rect(rect)) => assert_eq!(rect.width, BAR_WIDTH_HOVER),
            other => panic!("unexpected {other:?}"),
        }
        match timeline.engine().get(&ElementId::new(Layer::Markers, "point-1")) {
            Some(Primitive::Circle(circle)) => assert_eq!(circle.r, DOT_RADIUS),
            other => panic!("unexpected {other:?}"),
        }
        match timeline.engine().get(&ElementId::new(Layer::Overlay, TOOLTIP_KEY)) {
            Some(Primitive::Overlay(overlay)) => {
                assert_eq!(overlay.lines, vec!["Floor 2".to_string(), "01:40".to_string()]);
                assert_eq!(overlay.x, 90.0);
                assert_eq!(overlay.y, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        let before = timeline.playback();
        timeline.pointer_out();
        assert_eq!(timeline.engine().layer_len(Layer::Overlay), 0);
        assert_eq!(timeline.playback(), before);
        match timeline.engine().get(&ElementId::new(Layer::Markers, "bar-3")) {
            Some(Primitive::Rect(rect)) => assert_eq!(rect.width, BAR_WIDTH),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_segments_drawn_beneath_with_palette() {
        let timeline = timeline();
        match timeline.engine().get(&ElementId::new(Layer::Segments, "segment-1")) {
            Some(Primitive::Rect(rect)) => {
                assert_eq!(rect.fill, "#FFEFA1");
                assert_eq!(rect.opacity, SEGMENT_OPACITY);
                assert!((rect.x - 1000.0 / 6.0).abs() < 1e-9);
                assert!((rect.x + rect.width - 1000.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_missing_container_and_bad_duration() {
        let model = build_model(&[]);
        let missing = Container { id: "nope".into(), width: None };
        assert_eq!(
            Timeline::new(model.clone(), 600.0, &missing, RecordingBackend::default()).err(),
            Some(TimelineError::MissingElement("nope".into()))
        );
        let narrow = Container { id: "tiny".into(), width: Some(60.0) };
        assert!(matches!(
            Timeline::new(model.clone(), 600.0, &narrow, RecordingBackend::default()),
            Err(TimelineError::ContainerTooNarrow { .. })
        ));
        assert!(matches!(
            Timeline::new(model, 0.0, &container(), RecordingBackend::default()),
            Err(TimelineError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_no_boundaries_skips_segments() {
        let model = build_model(&[row("00:10", "door", "entry")]);
        let timeline = Timeline::new(model, 600.0, &container(), RecordingBackend::default()).unwrap();
        assert_eq!(timeline.engine().layer_len(Layer::Segments), 0);
        assert!(timeline.segments().is_empty());
    }
}
