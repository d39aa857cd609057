//! Event and floor-segment model built from raw tabular rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time_codec::{self, MalformedTimeError};

/// Kind value reserved for structural floor-boundary rows.
pub const FLOOR_KIND: &str = "newFloor";

/// Fallback band color for floors missing from [`FLOOR_PALETTE`].
pub const DEFAULT_FLOOR_COLOR: &str = "#808080";

pub const FLOOR_PALETTE: &[(i64, &str)] = &[
    (0, "#808080"),
    (1, "#b1b16f"),
    (2, "#FFEFA1"),
    (3, "#bbb08c"),
    (4, "#E6B8B8"),
    (5, "#ff0000"),
    (6, "#54b854"),
];

/// One parsed row, column name -> cell text.
pub type RawRecord = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(transparent)]
    MalformedTime(#[from] MalformedTimeError),
    #[error("row has no {0:?} column")]
    MissingField(&'static str),
    #[error("floor boundary at {0} has no floor number")]
    MissingFloorNumber(String),
}

/// A loaded row. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Original `MM:SS` text, used for display.
    pub time: String,
    pub label: String,
    /// Free-form category; [`FLOOR_KIND`] marks a floor boundary.
    pub kind: String,
}

impl EventRecord {
    /// Read a row, accepting both `label`/`kind` and the `event`/`type` column names.
    pub fn from_row(row: &RawRecord) -> Result<Self, ModelError> {
        let time = cell(row, &["time"]).ok_or(ModelError::MissingField("time"))?;
        Ok(Self {
            time: time.to_string(),
            label: cell(row, &["label", "event"]).unwrap_or_default().to_string(),
            kind: cell(row, &["kind", "type"]).unwrap_or_default().to_string(),
        })
    }

    pub fn is_floor_boundary(&self) -> bool {
        self.kind == FLOOR_KIND
    }
}

fn cell<'a>(row: &'a RawRecord, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| row.get(*name))
        .map(|value| value.trim())
}

/// A non-structural annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePoint {
    /// Index of the source row; stable identity for rendering.
    pub row: usize,
    pub seconds: u32,
    pub record: EventRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorBoundary {
    pub row: usize,
    pub seconds: u32,
    pub floor: i64,
    pub time_text: String,
    /// Text of the source row's label column.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    Event(TimelinePoint),
    FloorBoundary(FloorBoundary),
}

impl TimelineEntry {
    pub fn row(&self) -> usize {
        match self {
            TimelineEntry::Event(point) => point.row,
            TimelineEntry::FloorBoundary(boundary) => boundary.row,
        }
    }

    pub fn seconds(&self) -> u32 {
        match self {
            TimelineEntry::Event(point) => point.seconds,
            TimelineEntry::FloorBoundary(boundary) => boundary.seconds,
        }
    }

    pub fn time_text(&self) -> &str {
        match self {
            TimelineEntry::Event(point) => &point.record.time,
            TimelineEntry::FloorBoundary(boundary) => &boundary.time_text,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TimelineEntry::Event(point) => point.record.label.clone(),
            TimelineEntry::FloorBoundary(boundary) if boundary.label.trim().is_empty() => {
                format!("Floor {}", boundary.floor)
            }
            TimelineEntry::FloorBoundary(boundary) => boundary.label.clone(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            TimelineEntry::Event(point) => &point.record.kind,
            TimelineEntry::FloorBoundary(_) => FLOOR_KIND,
        }
    }
}

/// Span between two consecutive floor boundaries, or the last boundary and
/// the end of the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub floor: i64,
}

impl Segment {
    pub fn color(&self) -> &'static str {
        floor_color(self.floor)
    }
}

/// A row that was dropped during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub error: ModelError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineModel {
    entries: Vec<TimelineEntry>,
    /// Sorted ascending by seconds; ties keep row order.
    boundaries: Vec<FloorBoundary>,
    skipped: Vec<SkippedRow>,
}

impl TimelineModel {
    /// Entries in source row order.
    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn points(&self) -> impl Iterator<Item = &TimelinePoint> {
        self.entries.iter().filter_map(|entry| match entry {
            TimelineEntry::Event(point) => Some(point),
            TimelineEntry::FloorBoundary(_) => None,
        })
    }

    pub fn boundaries(&self) -> &[FloorBoundary] {
        &self.boundaries
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn find(&self, row: usize) -> Option<&TimelineEntry> {
        self.entries.iter().find(|entry| entry.row() == row)
    }

    /// Distinct kinds in first-seen order.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !kinds.iter().any(|kind| kind == entry.kind()) {
                kinds.push(entry.kind().to_string());
            }
        }
        kinds
    }

    /// Latest boundary whose start does not exceed `t`. Among boundaries
    /// sharing a start, the first in row order wins.
    pub fn latest_boundary_at(&self, t: f64) -> Option<&FloorBoundary> {
        let idx = self
            .boundaries
            .partition_point(|boundary| boundary.seconds as f64 <= t);
        let last = self.boundaries.get(idx.checked_sub(1)?)?;
        self.boundaries
            .iter()
            .find(|boundary| boundary.seconds == last.seconds)
    }

    pub fn segments(&self, duration_seconds: f64) -> Vec<Segment> {
        build_segments(&self.boundaries, duration_seconds)
    }
}

/// Classify rows into events and floor boundaries. Rows that fail to parse
/// are logged and skipped; the rest of the load continues.
pub fn build_model(rows: &[RawRecord]) -> TimelineModel {
    let mut model = TimelineModel::default();
    for (row, raw) in rows.iter().enumerate() {
        match classify(row, raw) {
            Ok(entry) => {
                if let TimelineEntry::FloorBoundary(boundary) = &entry {
                    model.boundaries.push(boundary.clone());
                }
                model.entries.push(entry);
            }
            Err(error) => {
                tracing::warn!(row, %error, "skipping timeline row");
                model.skipped.push(SkippedRow { row, error });
            }
        }
    }
    model.boundaries.sort_by_key(|boundary| boundary.seconds);
    model
}

fn classify(row: usize, raw: &RawRecord) -> Result<TimelineEntry, ModelError> {
    let record = EventRecord::from_row(raw)?;
    let seconds = time_codec::parse(&record.time)?;
    if !record.is_floor_boundary() {
        return Ok(TimelineEntry::Event(TimelinePoint {
            row,
            seconds,
            record,
        }));
    }
    let floor = cell(raw, &["floor"])
        .and_then(|value| value.parse::<i64>().ok())
        .or_else(|| first_integer(&record.label))
        .ok_or_else(|| ModelError::MissingFloorNumber(record.time.clone()))?;
    Ok(TimelineEntry::FloorBoundary(FloorBoundary {
        row,
        seconds,
        floor,
        time_text: record.time,
        label: record.label,
    }))
}

fn first_integer(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value = digits.parse::<i64>().ok()?;
    let negative = text[..start].ends_with('-');
    Some(if negative { -value } else { value })
}

/// Pair each boundary with the next one's start; the last runs to the end of
/// the video. `boundaries` must already be sorted.
pub fn build_segments(boundaries: &[FloorBoundary], duration_seconds: f64) -> Vec<Segment> {
    boundaries
        .iter()
        .enumerate()
        .map(|(i, boundary)| {
            let start = boundary.seconds as f64;
            let end = boundaries
                .get(i + 1)
                .map(|next| next.seconds as f64)
                .unwrap_or(duration_seconds);
            Segment {
                start_seconds: start,
                end_seconds: end.max(start),
                floor: boundary.floor,
            }
        })
        .collect()
}

pub fn floor_color(floor: i64) -> &'static str {
    FLOOR_PALETTE
        .iter()
        .find(|(number, _)| *number == floor)
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_FLOOR_COLOR)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn row(time: &str, event: &str, kind: &str) -> RawRecord {
        let mut raw = RawRecord::new();
        raw.insert("time".into(), time.into());
        raw.insert("event".into(), event.into());
        raw.insert("type".into(), kind.into());
        raw
    }

    pub(crate) fn floor_row(time: &str, floor: i64) -> RawRecord {
        let mut raw = row(time, &format!("Enter floor {floor}"), FLOOR_KIND);
        raw.insert("floor".into(), floor.to_string());
        raw
    }

    #[test]
    fn test_partitions_by_kind() {
        let model = build_model(&[
            row("00:05", "door", "entry"),
            floor_row("00:10", 1),
            row("00:20", "stairs", "move"),
        ]);
        assert_eq!(model.points().count(), 2);
        assert_eq!(model.boundaries().len(), 1);
        assert_eq!(model.boundaries()[0].floor, 1);
        assert_eq!(model.boundaries()[0].seconds, 10);
        assert_eq!(model.entries().len(), 3);
    }

    #[test]
    fn test_boundary_keeps_row_label() {
        let mut unlabeled = RawRecord::new();
        unlabeled.insert("time".into(), "00:30".into());
        unlabeled.insert("type".into(), FLOOR_KIND.into());
        unlabeled.insert("floor".into(), "2".into());
        let model = build_model(&[floor_row("00:00", 1), unlabeled]);
        assert_eq!(model.entries()[0].label(), "Enter floor 1");
        assert_eq!(model.entries()[1].label(), "Floor 2");
    }

    #[test]
    fn test_segments_cover_to_duration() {
        let model = build_model(&[floor_row("01:30", 3), floor_row("00:10", 1), floor_row("00:40", 2)]);
        let segments = model.segments(120.0);
        let triples: Vec<(f64, f64, i64)> = segments
            .iter()
            .map(|s| (s.start_seconds, s.end_seconds, s.floor))
            .collect();
        assert_eq!(triples, vec![(10.0, 40.0, 1), (40.0, 90.0, 2), (90.0, 120.0, 3)]);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_seconds, pair[1].start_seconds);
        }
    }

    #[test]
    fn test_no_boundaries_means_no_segments() {
        let model = build_model(&[row("00:05", "door", "entry")]);
        assert!(model.segments(600.0).is_empty());
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let mut rows: Vec<RawRecord> = (0..9)
            .map(|i| row(&format!("00:{:02}", i * 5), "event", "note"))
            .collect();
        rows.insert(4, row("bad:time", "event", "note"));
        let model = build_model(&rows);
        assert_eq!(model.entries().len(), 9);
        assert_eq!(model.skipped().len(), 1);
        assert_eq!(model.skipped()[0].row, 4);
        assert!(matches!(model.skipped()[0].error, ModelError::MalformedTime(_)));
    }

    #[test]
    fn test_floor_number_falls_back_to_label() {
        let model = build_model(&[row("00:10", "Floor 4", FLOOR_KIND)]);
        assert_eq!(model.boundaries()[0].floor, 4);

        let model = build_model(&[row("00:10", "Basement", FLOOR_KIND)]);
        assert!(model.boundaries().is_empty());
        assert!(matches!(model.skipped()[0].error, ModelError::MissingFloorNumber(_)));
    }

    #[test]
    fn test_latest_boundary_at() {
        let model = build_model(&[floor_row("00:00", 1), floor_row("05:00", 2)]);
        assert_eq!(model.latest_boundary_at(450.0).map(|b| b.seconds), Some(300));
        assert_eq!(model.latest_boundary_at(300.0).map(|b| b.seconds), Some(300));
        assert_eq!(model.latest_boundary_at(299.9).map(|b| b.seconds), Some(0));
        assert!(model.latest_boundary_at(-5.0).is_none());

        let late = build_model(&[floor_row("00:30", 1)]);
        assert!(late.latest_boundary_at(10.0).is_none());
    }

    #[test]
    fn test_latest_boundary_ties_prefer_first_row() {
        let model = build_model(&[floor_row("00:30", 1), floor_row("00:30", 2)]);
        assert_eq!(model.latest_boundary_at(40.0).map(|b| b.floor), Some(1));
    }

    #[test]
    fn test_floor_palette_default() {
        assert_eq!(floor_color(2), "#FFEFA1");
        assert_eq!(floor_color(42), DEFAULT_FLOOR_COLOR);
        assert_eq!(floor_color(-1), DEFAULT_FLOOR_COLOR);
    }

    #[test]
    fn test_kinds_first_seen_order() {
        let model = build_model(&[
            row("00:01", "a", "talk"),
            floor_row("00:02", 1),
            row("00:03", "b", "move"),
            row("00:04", "c", "talk"),
        ]);
        assert_eq!(model.kinds(), vec!["talk", FLOOR_KIND, "move"]);
    }

    #[test]
    fn test_record_accepts_both_column_names() {
        let mut raw = RawRecord::new();
        raw.insert("time".into(), "00:01".into());
        raw.insert("label".into(), "hello".into());
        raw.insert("kind".into(), "note".into());
        let record = EventRecord::from_row(&raw).unwrap();
        assert_eq!(record.label, "hello");
        assert_eq!(record.kind, "note");

        raw.remove("time");
        assert_eq!(EventRecord::from_row(&raw), Err(ModelError::MissingField("time")));
    }
}
