//! Pointer input -> seek requests and tooltip content.
//!
//! Clicks and hovers on the axis background resolve to the latest floor
//! boundary at or before the pointer's time. Marker clicks use the marker's
//! own time. Hovering never touches playback state.

use super::axis::AxisMapper;
use super::model::{TimelineEntry, TimelineModel};
use super::render::{HitTarget, MarkerKey};

/// Pointer position in container coordinates, used to place the overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekOrigin {
    Axis,
    Marker(MarkerKey),
    /// Jump link in the timestamp table, by source row.
    Table(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekRequest {
    pub seconds: u32,
    pub origin: SeekOrigin,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub target: HitTarget,
    pub lines: Vec<String>,
    pub pointer: PointerPosition,
}

/// What the overlay should do after a pointer event.
#[derive(Clone, Debug, PartialEq)]
pub enum TooltipUpdate {
    Show(Tooltip),
    Hide,
    Unchanged,
}

/// Resolve a click on the axis background at plot x.
///
/// Clicks that land outside `[0, duration]` are ignored, as are clicks before
/// the first floor boundary.
pub fn resolve_axis_click(model: &TimelineModel, axis: &AxisMapper, x: f64) -> Option<SeekRequest> {
    let t = axis.to_seconds(x);
    if !axis.contains_seconds(t) {
        return None;
    }
    model.latest_boundary_at(t).map(|boundary| SeekRequest {
        seconds: boundary.seconds,
        origin: SeekOrigin::Axis,
    })
}

pub fn resolve_marker_click(model: &TimelineModel, key: MarkerKey) -> Option<SeekRequest> {
    marker_entry(model, key).map(|entry| SeekRequest {
        seconds: entry.seconds(),
        origin: SeekOrigin::Marker(key),
    })
}

pub fn resolve_table_click(model: &TimelineModel, row: usize) -> Option<SeekRequest> {
    model.find(row).map(|entry| SeekRequest {
        seconds: entry.seconds(),
        origin: SeekOrigin::Table(row),
    })
}

fn marker_entry(model: &TimelineModel, key: MarkerKey) -> Option<&TimelineEntry> {
    let entry = match key {
        MarkerKey::Point(row) | MarkerKey::Boundary(row) => model.find(row)?,
    };
    match (key, entry) {
        (MarkerKey::Point(_), TimelineEntry::Event(_))
        | (MarkerKey::Boundary(_), TimelineEntry::FloorBoundary(_)) => Some(entry),
        _ => None,
    }
}

/// Tracks the single visible tooltip.
#[derive(Debug, Default)]
pub struct InteractionController {
    tooltip: Option<Tooltip>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn hover_axis(
        &mut self,
        model: &TimelineModel,
        axis: &AxisMapper,
        x: f64,
        pointer: PointerPosition,
    ) -> TooltipUpdate {
        let t = axis.to_seconds(x);
        let boundary = axis
            .contains_seconds(t)
            .then(|| model.latest_boundary_at(t))
            .flatten();
        match boundary {
            Some(boundary) => self.show(Tooltip {
                target: HitTarget::Axis,
                lines: vec![format!("Floor {}", boundary.floor)],
                pointer,
            }),
            None => self.pointer_out(),
        }
    }

    pub fn hover_marker(
        &mut self,
        model: &TimelineModel,
        key: MarkerKey,
        pointer: PointerPosition,
    ) -> TooltipUpdate {
        let lines = match marker_entry(model, key) {
            Some(TimelineEntry::Event(point)) => {
                vec![point.record.time.clone(), point.record.label.clone()]
            }
            Some(TimelineEntry::FloorBoundary(boundary)) => {
                vec![format!("Floor {}", boundary.floor), boundary.time_text.clone()]
            }
            None => return self.pointer_out(),
        };
        self.show(Tooltip {
            target: HitTarget::Marker(key),
            lines,
            pointer,
        })
    }

    pub fn pointer_out(&mut self) -> TooltipUpdate {
        match self.tooltip.take() {
            Some(_) => TooltipUpdate::Hide,
            None => TooltipUpdate::Unchanged,
        }
    }

    /// Replaces whatever tooltip was showing.
    fn show(&mut self, tooltip: Tooltip) -> TooltipUpdate {
        if self.tooltip.as_ref() == Some(&tooltip) {
            return TooltipUpdate::Unchanged;
        }
        self.tooltip = Some(tooltip.clone());
        TooltipUpdate::Show(tooltip)
    }
}
