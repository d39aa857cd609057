//! Application state outside a single timeline: settings, loaded records and
//! the registry of running timelines.

mod records;
mod registry;
mod settings;

pub use records::*;
pub use registry::*;
pub use settings::*;
