pub mod jsonl;
pub mod record;

pub use jsonl::write_jsonl;
pub use record::{error_value, failed_record, ingested_record, inspected_record};

/// Version tag stamped on every output record.
pub const RECORD_VERSION: &str = "docingest.v0";
