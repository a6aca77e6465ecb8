pub mod reporter;

pub use reporter::{Event, report};
