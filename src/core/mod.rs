//! Timeline engine: parsing, layout, rendering, interaction and playback
//! sync. Nothing in here touches the UI toolkit.

pub mod axis;
pub mod duration;
pub mod interaction;
pub mod model;
pub mod paths;
pub mod render;
pub mod scene;
pub mod session;
pub mod sync;
pub mod time_codec;
pub mod timeline;
