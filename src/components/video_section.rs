use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::prelude::*;
use serde_json::json;

use floor_timeline::constants::*;
use floor_timeline::core::duration::{http_client, resolve_or_default};
use floor_timeline::core::model::{build_model, TimelineModel};
use floor_timeline::core::scene::{Scene, SceneBackend};
use floor_timeline::core::session::{spawn_timeline, TimelineCommand, TimelineHandle};
use floor_timeline::core::sync::{
    ChannelPlayerLink, InboundEnvelope, PlayerCommand, PlayerSource, SeekGuard, SyncBridge,
};
use floor_timeline::core::timeline::{Container, Timeline};
use floor_timeline::state::{load_records, SectionSettings, TimelineRegistry};
use floor_timeline::utils::with_player_api_params;

use super::TimestampTable;
use crate::timeline::TimelineView;

/// One embedded video with its timeline and timestamp table.
///
/// Startup order: records, then duration, then container width. The timeline
/// is only built once all three are known.
#[component]
pub fn VideoSection(
    section: SectionSettings,
    proxy_base_url: String,
    registry: Signal<TimelineRegistry>,
) -> Element {
    let player_id = section.player_id();
    let container_id = section.container_id();

    let mut player_src = use_signal(|| with_player_api_params(&section.player_url));
    let mut model = use_signal(|| None::<TimelineModel>);
    let mut scene = use_signal(|| None::<Scene>);
    let mut outer_width = use_signal(|| 0.0_f64);
    let mut error = use_signal(|| None::<String>);
    let handle_slot = use_hook(|| Rc::new(RefCell::new(None::<Arc<TimelineHandle>>)));
    let bridge_slot = use_hook(|| Rc::new(RefCell::new(None::<document::Eval>)));

    {
        let section = section.clone();
        let handle_slot = handle_slot.clone();
        let bridge_slot = bridge_slot.clone();
        use_drop(move || {
            if let Some(handle) = handle_slot.borrow_mut().take() {
                handle.dispose();
            }
            // The pump task is cancelled with this scope, so the queued detach
            // never reaches the page. Tell the bridge directly.
            if let Some(bridge) = bridge_slot.borrow_mut().take() {
                if let Some(message) = PlayerCommand::Detach.bridge_message() {
                    let _ = bridge.send(message);
                }
            }
            if let Ok(mut registry) = registry.try_write() {
                registry.unregister(&section.id);
            }
        });
    }

    {
        let section = section.clone();
        let handle_slot = handle_slot.clone();
        let bridge_slot = bridge_slot.clone();
        use_future(move || {
            let section = section.clone();
            let proxy_base_url = proxy_base_url.clone();
            let handle_slot = handle_slot.clone();
            let bridge_slot = bridge_slot.clone();
            async move {
                let player_id = section.player_id();
                let container_id = section.container_id();

                let path = section.csv_path.clone();
                let rows = match tokio::task::spawn_blocking(move || load_records(&path)).await {
                    Ok(Ok(rows)) => rows,
                    Ok(Err(err)) => {
                        tracing::error!(section = %section.id, error = %err, "cannot load timeline records");
                        error.set(Some(err.to_string()));
                        return;
                    }
                    Err(err) => {
                        tracing::error!(section = %section.id, error = %err, "record loader failed");
                        error.set(Some(err.to_string()));
                        return;
                    }
                };
                let loaded = build_model(&rows);
                model.set(Some(loaded.clone()));

                let src = player_src.peek().clone();
                let duration = match http_client() {
                    Ok(client) => {
                        resolve_or_default(&client, &proxy_base_url, Some(&src), section.page_index).await
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "no http client, using default duration");
                        DEFAULT_VIDEO_DURATION_SECONDS
                    }
                };

                let mut measure = document::eval(CONTAINER_WIDTH_SCRIPT);
                let _ = measure.send(json!({ "container_id": container_id }));
                let width = measure.recv::<Option<f64>>().await.ok().flatten();
                let container = Container {
                    id: container_id.clone(),
                    width,
                };

                let timeline = match Timeline::new(loaded, duration, &container, SceneBackend::new()) {
                    Ok(timeline) => timeline,
                    Err(err) => {
                        tracing::error!(section = %section.id, error = %err, "timeline not created");
                        error.set(Some(err.to_string()));
                        return;
                    }
                };
                outer_width.set(width.unwrap_or_default());

                let mut bridge_eval = document::eval(PLAYER_BRIDGE_SCRIPT);
                let _ = bridge_eval.send(json!({ "iframe_id": player_id }));
                *bridge_slot.borrow_mut() = Some(bridge_eval.clone());
                let (link, mut player_commands) =
                    ChannelPlayerLink::new(player_id.clone(), PlayerSource::new(Some(src)));
                let bridge = SyncBridge::new(
                    player_id.clone(),
                    SeekGuard::new(SEEK_SETTLE_WINDOW, SEEK_TOLERANCE_SECONDS),
                );
                let handle = Arc::new(spawn_timeline(timeline, Arc::new(link), bridge, POLL_INTERVAL));
                registry
                    .write()
                    .register(section.id.clone(), player_id.clone(), handle.status());
                *handle_slot.borrow_mut() = Some(handle.clone());

                let mut scenes = handle.scene();
                scene.set(Some(scenes.borrow_and_update().clone()));

                loop {
                    tokio::select! {
                        changed = scenes.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let next = scenes.borrow_and_update().clone();
                            scene.set(Some(next));
                        }
                        inbound = bridge_eval.recv::<InboundEnvelope>() => {
                            match inbound {
                                Ok(envelope) => {
                                    handle.send(TimelineCommand::Inbound(envelope));
                                }
                                Err(err) => {
                                    tracing::warn!(player = %player_id, error = ?err, "player bridge closed");
                                    break;
                                }
                            }
                        }
                        command = player_commands.recv() => {
                            let command = command.unwrap_or(PlayerCommand::Detach);
                            if let Some(message) = command.bridge_message() {
                                let _ = bridge_eval.send(message);
                            }
                            match command {
                                PlayerCommand::Navigate(url) => player_src.set(url),
                                PlayerCommand::Detach => {
                                    *bridge_slot.borrow_mut() = None;
                                    break;
                                }
                                PlayerCommand::Post(_) => {}
                            }
                        }
                    }
                }
            }
        });
    }

    let send_command = {
        let handle_slot = handle_slot.clone();
        move |command: TimelineCommand| {
            if let Some(handle) = handle_slot.borrow().as_ref() {
                handle.send(command);
            }
        }
    };
    let on_command = {
        let send_command = send_command.clone();
        move |command: TimelineCommand| send_command(command)
    };
    let on_seek = move |row: usize| send_command(TimelineCommand::SeekRow(row));

    let title = if section.title.is_empty() {
        format!("Video {}", section.id)
    } else {
        section.title.clone()
    };

    rsx! {
        section {
            style: "
                display: flex; flex-direction: column; gap: 12px;
                padding: 16px; background-color: {BG_SURFACE};
                border: 1px solid {BORDER_DEFAULT}; border-radius: 8px;
            ",
            h2 { style: "margin: 0; font-size: 16px; color: {TEXT_PRIMARY};", "{title}" }
            iframe {
                id: "{player_id}",
                src: "{player_src}",
                width: "100%",
                height: "480",
                style: "border: 0;",
                allow: "fullscreen",
            }
            div {
                id: "{container_id}",
                style: "position: relative; width: 100%; min-height: {TIMELINE_OUTER_HEIGHT}px;",
                if let Some(message) = error() {
                    div { style: "padding: 8px; font-size: 12px; color: #b91c1c;", "{message}" }
                } else if let Some(current) = scene() {
                    TimelineView {
                        scene: current,
                        outer_width: outer_width(),
                        on_command: on_command,
                    }
                } else {
                    div { style: "padding: 8px; font-size: 12px; color: {TEXT_DIM};", "Loading timeline..." }
                }
            }
            if let Some(loaded) = model() {
                TimestampTable { model: loaded, on_seek: on_seek }
            }
        }
    }
}
