//! Shared constants: page colors, timeline geometry and palette, sync cadence,
//! and the scripts injected into the webview.

use std::time::Duration;

pub const BG_BASE: &str = "#f9fafb";
pub const BG_SURFACE: &str = "#ffffff";

pub const BORDER_SUBTLE: &str = "#f3f4f6";
pub const BORDER_DEFAULT: &str = "#e5e7eb";
pub const BORDER_ACCENT: &str = "#3b82f6";

pub const TEXT_PRIMARY: &str = "#111827";
pub const TEXT_MUTED: &str = "#6b7280";
pub const TEXT_DIM: &str = "#9ca3af";

// Timeline geometry, in pixels. The plot area is the container width minus
// the side margins and `TIMELINE_OUTER_HEIGHT` minus the vertical margins.
pub const TIMELINE_MARGIN_TOP: f64 = 40.0;
pub const TIMELINE_MARGIN_RIGHT: f64 = 40.0;
pub const TIMELINE_MARGIN_BOTTOM: f64 = 40.0;
pub const TIMELINE_MARGIN_LEFT: f64 = 40.0;
pub const TIMELINE_OUTER_HEIGHT: f64 = 100.0;
pub const TIMELINE_PLOT_HEIGHT: f64 =
    TIMELINE_OUTER_HEIGHT - TIMELINE_MARGIN_TOP - TIMELINE_MARGIN_BOTTOM;
pub const TIMELINE_CENTER_Y: f64 = TIMELINE_PLOT_HEIGHT / 2.0;

pub const CLICK_BAND_HALF_HEIGHT: f64 = 10.0;
pub const DOT_RADIUS: f64 = 6.0;
pub const DOT_RADIUS_HOVER: f64 = 8.0;
pub const BAR_WIDTH: f64 = 4.0;
pub const BAR_WIDTH_HOVER: f64 = 6.0;
pub const BAR_HALF_HEIGHT: f64 = 20.0;
pub const TICK_HALF_HEIGHT: f64 = 5.0;
pub const SEGMENT_OPACITY: f64 = 0.3;
pub const TOOLTIP_OFFSET_X: f64 = 10.0;
pub const TOOLTIP_OFFSET_Y: f64 = -25.0;

pub const COLOR_PAST: &str = "#4477ff";
pub const COLOR_FUTURE: &str = "#cccccc";
pub const COLOR_DOT_STROKE: &str = "#ffffff";
pub const COLOR_AXIS: &str = "#e5e7eb";
pub const COLOR_TICK: &str = "#d1d5db";
pub const COLOR_LABEL: &str = "#6b7280";
pub const COLOR_PROGRESS: &str = "#3b82f6";

pub const MARKER_TRANSITION_MS: u64 = 200;
pub const PROGRESS_TRANSITION_MS: u64 = 100;

pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_VIDEO_DURATION_SECONDS: f64 = 600.0;
pub const DEFAULT_PROXY_BASE_URL: &str = "http://localhost:3000";
pub const DURATION_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// After a seek, inbound positions that disagree with the target are ignored
/// for at most this long.
pub const SEEK_SETTLE_WINDOW: Duration = Duration::from_secs(5);
/// Slack, in seconds, when matching an inbound position to a seek target.
pub const SEEK_TOLERANCE_SECONDS: f64 = 1.5;

/// Relays `postMessage` traffic between one player iframe and Rust.
///
/// First message from Rust: `{ iframe_id }`. Then `{ kind: "post", payload }`
/// forwards `payload` to the iframe and `{ kind: "detach" }` removes the
/// listener. Messages whose source is the iframe come back as
/// `{ source, data }`.
pub const PLAYER_BRIDGE_SCRIPT: &str = r#"
const init = await dioxus.recv();
const iframeId = init.iframe_id;
let active = true;

function frame() {
    return document.getElementById(iframeId);
}

function onMessage(e) {
    const iframe = frame();
    if (!active || !iframe || e.source !== iframe.contentWindow) {
        return;
    }
    dioxus.send({ source: iframeId, data: e.data === undefined ? null : e.data });
}

window.addEventListener("message", onMessage);

while (active) {
    let msg;
    try {
        msg = await dioxus.recv();
    } catch (_) {
        break;
    }
    if (!msg) {
        continue;
    }
    if (msg.kind === "post") {
        const iframe = frame();
        if (iframe && iframe.contentWindow) {
            iframe.contentWindow.postMessage(msg.payload, "*");
        }
        continue;
    }
    if (msg.kind === "detach") {
        active = false;
    }
}
window.removeEventListener("message", onMessage);
"#;

/// Measures a container once. First message from Rust: `{ container_id }`.
/// Replies with the container's `clientWidth`, or `null` when the element
/// never shows up.
pub const CONTAINER_WIDTH_SCRIPT: &str = r#"
const init = await dioxus.recv();
let attempts = 0;

function measure() {
    const host = document.getElementById(init.container_id);
    if (host) {
        dioxus.send(host.getBoundingClientRect().width || 0);
        return;
    }
    attempts += 1;
    if (attempts > 20) {
        dioxus.send(null);
        return;
    }
    setTimeout(measure, 100);
}

measure();
await new Promise(() => {});
"#;
