pub mod ingest;
pub mod parallel;
pub mod reader;

pub use ingest::{Ingested, ingest};
pub use parallel::ingest_all;
pub use reader::read_paths;
