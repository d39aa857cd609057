//! Timeline components
//!
//! - TimelineView: SVG rendering of a timeline scene

mod view;

pub use view::TimelineView;
