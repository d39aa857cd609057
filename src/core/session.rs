//! Runs one timeline on its own task.
//!
//! Every mutation (player reports, clicks, hovers, redraws) is a
//! [`TimelineCommand`] on a single queue, so a timeline never redraws
//! concurrently with itself. A second task polls the player for its position.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::interaction::{PointerPosition, SeekRequest};
use super::render::MarkerKey;
use super::scene::{Scene, SceneBackend};
use super::sync::{InboundEnvelope, OutboundMessage, PlayerLink, SyncBridge};
use super::timeline::{PlaybackState, Timeline};

#[derive(Clone, Debug, PartialEq)]
pub enum TimelineCommand {
    /// A message relayed from the page.
    Inbound(InboundEnvelope),
    ClickAxis { x: f64 },
    ClickMarker(MarkerKey),
    /// Jump link in the timestamp table.
    SeekRow(usize),
    HoverAxis { x: f64, pointer: PointerPosition },
    HoverMarker { key: MarkerKey, pointer: PointerPosition },
    PointerOut,
    Redraw,
}

pub struct TimelineHandle {
    player_id: String,
    commands: mpsc::UnboundedSender<TimelineCommand>,
    scene: watch::Receiver<Scene>,
    status: watch::Receiver<PlaybackState>,
    link: Arc<dyn PlayerLink>,
    tasks: [AbortHandle; 2],
    disposed: AtomicBool,
}

impl TimelineHandle {
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Queue a command. Returns `false` once the session is gone.
    pub fn send(&self, command: TimelineCommand) -> bool {
        if self.is_disposed() {
            return false;
        }
        self.commands.send(command).is_ok()
    }

    pub fn scene(&self) -> watch::Receiver<Scene> {
        self.scene.clone()
    }

    pub fn status(&self) -> watch::Receiver<PlaybackState> {
        self.status.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stop polling, stop processing commands and detach from the player.
    /// Safe to call more than once.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        for task in &self.tasks {
            task.abort();
        }
        self.link.detach();
        tracing::info!(player = %self.player_id, "timeline disposed");
    }
}

impl Drop for TimelineHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Take ownership of `timeline` and start its command and poll tasks.
/// Must be called from within a tokio runtime.
pub fn spawn_timeline(
    mut timeline: Timeline<SceneBackend>,
    link: Arc<dyn PlayerLink>,
    bridge: SyncBridge,
    poll_interval: Duration,
) -> TimelineHandle {
    let player_id = bridge.player_id().to_string();
    timeline.backend_mut().take_dirty();
    let (scene_tx, scene_rx) = watch::channel(timeline.engine().backend().scene().clone());
    let (status_tx, status_rx) = watch::channel(timeline.playback());
    let (commands, command_rx) = mpsc::unbounded_channel();

    let session = Session {
        timeline,
        link: link.clone(),
        bridge,
        scene_tx,
        status_tx,
    };
    let worker = tokio::spawn(session.run(command_rx));
    let poller = tokio::spawn(poll_player(link.clone(), poll_interval));
    tracing::info!(player = %player_id, "timeline session started");

    TimelineHandle {
        player_id,
        commands,
        scene: scene_rx,
        status: status_rx,
        link,
        tasks: [worker.abort_handle(), poller.abort_handle()],
        disposed: AtomicBool::new(false),
    }
}

/// Ask for the position once per tick. The first request goes out one
/// interval after start.
async fn poll_player(link: Arc<dyn PlayerLink>, every: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !link.post(&OutboundMessage::GetCurrentTime) {
            tracing::trace!(player = %link.player_id(), "poll skipped, player not present");
        }
    }
}

struct Session {
    timeline: Timeline<SceneBackend>,
    link: Arc<dyn PlayerLink>,
    bridge: SyncBridge,
    scene_tx: watch::Sender<Scene>,
    status_tx: watch::Sender<PlaybackState>,
}

impl Session {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<TimelineCommand>) {
        while let Some(command) = commands.recv().await {
            self.apply(command, Instant::now());
            self.publish();
        }
    }

    fn apply(&mut self, command: TimelineCommand, now: Instant) {
        match command {
            TimelineCommand::Inbound(envelope) => {
                if let Some(seconds) = self.bridge.admit(&envelope, now) {
                    tracing::debug!(player = %self.bridge.player_id(), seconds, "player position");
                    self.timeline.set_current_seconds(seconds);
                }
            }
            TimelineCommand::ClickAxis { x } => {
                let seek = self.timeline.click_axis(x);
                self.seek(seek, now);
            }
            TimelineCommand::ClickMarker(key) => {
                let seek = self.timeline.click_marker(key);
                self.seek(seek, now);
            }
            TimelineCommand::SeekRow(row) => {
                let seek = self.timeline.click_table_row(row);
                self.seek(seek, now);
            }
            TimelineCommand::HoverAxis { x, pointer } => {
                self.timeline.hover_axis(x, pointer);
            }
            TimelineCommand::HoverMarker { key, pointer } => {
                self.timeline.hover_marker(key, pointer);
            }
            TimelineCommand::PointerOut => {
                self.timeline.pointer_out();
            }
            TimelineCommand::Redraw => {
                self.timeline.update_vis();
            }
        }
    }

    fn seek(&mut self, seek: Option<SeekRequest>, now: Instant) {
        let Some(seek) = seek else {
            return;
        };
        tracing::info!(
            player = %self.bridge.player_id(),
            seconds = seek.seconds,
            origin = ?seek.origin,
            "seeking player"
        );
        self.bridge.seek(self.link.as_ref(), seek.seconds, now);
    }

    fn publish(&mut self) {
        if self.timeline.backend_mut().take_dirty() {
            let scene = self.timeline.engine().backend().scene().clone();
            self.scene_tx.send_replace(scene);
        }
        let playback = self.timeline.playback();
        self.status_tx.send_if_modified(|state| {
            if *state == playback {
                return false;
            }
            *state = playback;
            true
        });
    }
}
