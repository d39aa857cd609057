//! Floor timeline showcase
//!
//! Desktop page with one embedded video per configured section, each with an
//! interactive floor timeline and a timestamp table.

mod app;
mod components;
mod timeline;

use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

fn main() {
    floor_timeline::init_tracing();

    let config = Config::new()
        .with_window(
            WindowBuilder::new()
                .with_title("Floor Timeline")
                .with_inner_size(LogicalSize::new(1280.0, 900.0))
                .with_resizable(true),
        )
        .with_menu(None);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(config)
        .launch(app::App);
}
