//! Live timelines by section, for the status bar.

use std::collections::BTreeMap;

use tokio::sync::watch;

use crate::core::timeline::PlaybackState;

#[derive(Debug, Clone, PartialEq)]
pub struct SectionDiagnostics {
    pub section_id: String,
    pub player_id: String,
    pub current_seconds: f64,
    pub duration_seconds: f64,
}

#[derive(Debug)]
struct Entry {
    player_id: String,
    status: watch::Receiver<PlaybackState>,
}

#[derive(Debug, Default)]
pub struct TimelineRegistry {
    entries: BTreeMap<String, Entry>,
}

impl TimelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier timeline registered for the same section.
    pub fn register(
        &mut self,
        section_id: impl Into<String>,
        player_id: impl Into<String>,
        status: watch::Receiver<PlaybackState>,
    ) {
        let section_id = section_id.into();
        tracing::debug!(section = %section_id, "timeline registered");
        self.entries.insert(
            section_id,
            Entry {
                player_id: player_id.into(),
                status,
            },
        );
    }

    pub fn unregister(&mut self, section_id: &str) -> bool {
        self.entries.remove(section_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, section_id: &str) -> Option<SectionDiagnostics> {
        self.entries
            .get(section_id)
            .map(|entry| diagnostics(section_id, entry))
    }

    /// Current state of every registered timeline, by section id.
    pub fn snapshot(&self) -> Vec<SectionDiagnostics> {
        self.entries
            .iter()
            .map(|(section_id, entry)| diagnostics(section_id, entry))
            .collect()
    }
}

fn diagnostics(section_id: &str, entry: &Entry) -> SectionDiagnostics {
    let state = *entry.status.borrow();
    SectionDiagnostics {
        section_id: section_id.to_string(),
        player_id: entry.player_id.clone(),
        current_seconds: state.current_seconds,
        duration_seconds: state.video_duration_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(current: f64) -> PlaybackState {
        PlaybackState {
            current_seconds: current,
            video_duration_seconds: 600.0,
        }
    }

    #[test]
    fn test_snapshot_tracks_live_status() {
        let mut registry = TimelineRegistry::new();
        let (tx_b, rx_b) = watch::channel(state(0.0));
        let (_tx_a, rx_a) = watch::channel(state(12.0));
        registry.register("2-1", "video2-1", rx_b);
        registry.register("1-1", "video1-1", rx_a);

        tx_b.send_replace(state(90.0));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].section_id, "1-1");
        assert_eq!(snapshot[1].current_seconds, 90.0);
        assert_eq!(registry.get("1-1").map(|d| d.player_id), Some("video1-1".to_string()));
    }

    #[test]
    fn test_unregister() {
        let mut registry = TimelineRegistry::new();
        let (_tx, rx) = watch::channel(state(0.0));
        registry.register("1-1", "video1-1", rx);
        assert!(registry.unregister("1-1"));
        assert!(!registry.unregister("1-1"));
        assert!(registry.is_empty());
    }
}
