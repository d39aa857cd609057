//! Playback sync bridge: the message protocol spoken with the embedded
//! player, inbound filtering, seek URL rewriting and the stale-update guard.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::utils::seek_url;

/// Requests sent to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    GetCurrentTime,
}

/// A message received from the page, tagged with the player it came from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InboundEnvelope {
    pub source: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum PlayerEvent {
    #[serde(rename = "videoProgress")]
    VideoProgress {
        #[serde(rename = "currentTime")]
        current_time: f64,
    },
}

/// Handle on one embedded player. Every call resolves the player afresh; an
/// absent player turns posts and navigations into no-ops that return `false`.
pub trait PlayerLink: Send + Sync {
    fn player_id(&self) -> &str;
    fn source_url(&self) -> Option<String>;
    fn post(&self, message: &OutboundMessage) -> bool;
    /// Point the player at a new address. Fire-and-forget.
    fn navigate(&self, url: String) -> bool;
    /// Stop relaying messages for this player.
    fn detach(&self);
}

/// Commands a [`ChannelPlayerLink`] forwards to whoever owns the real player.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerCommand {
    Post(OutboundMessage),
    Navigate(String),
    Detach,
}

impl PlayerCommand {
    /// Message for the page-side bridge, or `None` for commands the owner
    /// applies itself.
    pub fn bridge_message(&self) -> Option<Value> {
        match self {
            PlayerCommand::Post(message) => Some(json!({ "kind": "post", "payload": message })),
            PlayerCommand::Navigate(_) => None,
            PlayerCommand::Detach => Some(json!({ "kind": "detach" })),
        }
    }
}

/// Shared, late-bound player address. Empty until the player exists.
#[derive(Clone, Debug, Default)]
pub struct PlayerSource(Arc<RwLock<Option<String>>>);

impl PlayerSource {
    pub fn new(url: Option<String>) -> Self {
        Self(Arc::new(RwLock::new(url)))
    }

    pub fn get(&self) -> Option<String> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, url: Option<String>) {
        match self.0.write() {
            Ok(mut guard) => *guard = url,
            Err(poisoned) => *poisoned.into_inner() = url,
        }
    }
}

/// [`PlayerLink`] that forwards commands over a channel, for players that
/// live on another task (the webview).
pub struct ChannelPlayerLink {
    player_id: String,
    source: PlayerSource,
    commands: mpsc::UnboundedSender<PlayerCommand>,
}

impl ChannelPlayerLink {
    pub fn new(
        player_id: impl Into<String>,
        source: PlayerSource,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerCommand>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let link = Self {
            player_id: player_id.into(),
            source,
            commands,
        };
        (link, rx)
    }
}

impl PlayerLink for ChannelPlayerLink {
    fn player_id(&self) -> &str {
        &self.player_id
    }

    fn source_url(&self) -> Option<String> {
        self.source.get()
    }

    fn post(&self, message: &OutboundMessage) -> bool {
        if self.source.get().is_none() {
            return false;
        }
        self.commands.send(PlayerCommand::Post(*message)).is_ok()
    }

    fn navigate(&self, url: String) -> bool {
        if self.source.get().is_none() {
            return false;
        }
        self.source.set(Some(url.clone()));
        self.commands.send(PlayerCommand::Navigate(url)).is_ok()
    }

    fn detach(&self) {
        let _ = self.commands.send(PlayerCommand::Detach);
    }
}

/// Drops inbound positions that predate a user seek.
///
/// After a seek to `target`, a reported position is accepted once it lies in
/// `[target - tolerance, target + elapsed + tolerance]` (the player may have
/// played on since reloading), or once the settle window has passed.
#[derive(Debug)]
pub struct SeekGuard {
    pending: Option<(f64, Instant)>,
    settle_window: Duration,
    tolerance_seconds: f64,
}

impl SeekGuard {
    pub fn new(settle_window: Duration, tolerance_seconds: f64) -> Self {
        Self {
            pending: None,
            settle_window,
            tolerance_seconds,
        }
    }

    pub fn note_seek(&mut self, target_seconds: f64, now: Instant) {
        self.pending = Some((target_seconds, now));
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn admit(&mut self, reported_seconds: f64, now: Instant) -> bool {
        let Some((target, issued_at)) = self.pending else {
            return true;
        };
        let elapsed = now.saturating_duration_since(issued_at);
        let low = target - self.tolerance_seconds;
        let high = target + elapsed.as_secs_f64() + self.tolerance_seconds;
        if (low..=high).contains(&reported_seconds) || elapsed >= self.settle_window {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

/// Per-instance protocol state.
#[derive(Debug)]
pub struct SyncBridge {
    player_id: String,
    guard: SeekGuard,
}

impl SyncBridge {
    pub fn new(player_id: impl Into<String>, guard: SeekGuard) -> Self {
        Self {
            player_id: player_id.into(),
            guard,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Current position carried by `envelope`, if it is a progress report from
    /// this instance's player. Payloads that arrive as JSON text are decoded.
    pub fn accept(&self, envelope: &InboundEnvelope) -> Option<f64> {
        if envelope.source.as_deref() != Some(self.player_id.as_str()) {
            return None;
        }
        let event = match &envelope.data {
            Value::String(text) => serde_json::from_str::<PlayerEvent>(text).ok()?,
            other => PlayerEvent::deserialize(other).ok()?,
        };
        match event {
            PlayerEvent::VideoProgress { current_time } if current_time.is_finite() => {
                Some(current_time.max(0.0))
            }
            PlayerEvent::VideoProgress { .. } => None,
        }
    }

    /// Filter through [`SeekGuard`]; `None` means discard.
    pub fn admit(&mut self, envelope: &InboundEnvelope, now: Instant) -> Option<f64> {
        let seconds = self.accept(envelope)?;
        if self.guard.admit(seconds, now) {
            Some(seconds)
        } else {
            tracing::debug!(player = %self.player_id, seconds, "discarding pre-seek position");
            None
        }
    }

    /// Rewrite the player address to `seconds` and remember the seek. Returns
    /// `false` when the player is absent.
    pub fn seek(&mut self, link: &dyn PlayerLink, seconds: u32, now: Instant) -> bool {
        let Some(current) = link.source_url() else {
            tracing::debug!(player = %self.player_id, "seek skipped, player not present");
            return false;
        };
        self.guard.note_seek(seconds as f64, now);
        link.navigate(seek_url(&current, seconds))
    }
}
