use std::time::Duration;

use dioxus::prelude::*;
use floor_timeline::constants::*;
use floor_timeline::core::time_codec;
use floor_timeline::state::TimelineRegistry;

/// Live position of every running timeline, refreshed once a second.
#[component]
pub fn StatusBar(registry: Signal<TimelineRegistry>) -> Element {
    let mut tick = use_signal(|| 0_u64);
    use_future(move || async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            tick.set(tick() + 1);
        }
    });

    let _ = tick();
    let sections: Vec<(String, String, String)> = registry
        .read()
        .snapshot()
        .into_iter()
        .map(|section| {
            let position = format!(
                "{} {} / {}",
                section.section_id,
                time_codec::format(section.current_seconds as u32),
                time_codec::format(section.duration_seconds as u32)
            );
            (section.section_id, section.player_id, position)
        })
        .collect();
    let summary = if sections.is_empty() {
        "No timelines".to_string()
    } else {
        format!("{} timeline(s)", sections.len())
    };

    rsx! {
        div {
            style: "display: flex; align-items: center; justify-content: space-between; height: 22px; padding: 0 14px; background-color: {BG_SURFACE}; border-top: 1px solid {BORDER_DEFAULT}; font-size: 11px; color: {TEXT_DIM};",
            span { "{summary}" }
            div {
                style: "display: flex; gap: 16px; font-family: 'SF Mono', Consolas, monospace;",
                for (section_id, player_id, position) in sections {
                    span {
                        key: "{section_id}",
                        title: "{player_id}",
                        "{position}"
                    }
                }
            }
        }
    }
}
