//! UI components grouped by feature.

mod status_bar;
mod timestamp_table;
mod video_section;

pub use status_bar::StatusBar;
pub use timestamp_table::TimestampTable;
pub use video_section::VideoSection;
