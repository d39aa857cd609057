//! Root application component
//!
//! Loads the showcase settings once and lays out one section per configured
//! video above the status bar.

use std::path::Path;

use dioxus::prelude::*;
use floor_timeline::constants::*;
use floor_timeline::core::paths::resolve_resource_path;
use floor_timeline::state::{ShowcaseSettings, TimelineRegistry, SETTINGS_FILE};

use crate::components::{StatusBar, VideoSection};

#[component]
pub fn App() -> Element {
    let settings = use_hook(|| {
        let path = resolve_resource_path(Path::new(SETTINGS_FILE));
        ShowcaseSettings::load_or_default(&path)
    });
    let registry = use_signal(TimelineRegistry::new);

    rsx! {
        div {
            style: "
                display: flex; flex-direction: column;
                width: 100vw; height: 100vh;
                background-color: {BG_BASE}; color: {TEXT_PRIMARY};
                font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
                overflow: hidden;
            ",
            header {
                style: "padding: 16px 24px; border-bottom: 1px solid {BORDER_DEFAULT}; background-color: {BG_SURFACE};",
                h1 { style: "margin: 0; font-size: 20px;", "{settings.title}" }
            }
            main {
                style: "flex: 1; overflow-y: auto; padding: 24px; display: flex; flex-direction: column; gap: 24px;",
                if settings.sections.is_empty() {
                    div {
                        style: "color: {TEXT_MUTED}; font-size: 13px;",
                        "No sections configured. Add them to {SETTINGS_FILE}."
                    }
                }
                for section in settings.sections.iter().cloned() {
                    VideoSection {
                        key: "{section.id}",
                        section: section,
                        proxy_base_url: settings.proxy_base_url.clone(),
                        registry: registry,
                    }
                }
            }
            StatusBar { registry: registry }
        }
    }
}
