use crate::config::IngestConfig;
use crate::document::Document;
use crate::error::ParseError;
use crate::parser::{ParseOptions, ValidationGuard};
use crate::registry::ParserRegistry;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of ingesting one input path.
#[derive(Debug)]
pub struct Ingested {
    pub path: PathBuf,
    pub result: Result<Document, ParseError>,
}

/// Gate `path` on the configured extensions and size ceiling, then parse it.
///
/// Guard failures surface as `InvalidInput` here rather than as "no parser
/// found", which is what registry probing alone would report.
pub fn ingest(
    registry: &ParserRegistry,
    config: &IngestConfig,
    path: &Path,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    if !config.is_supported(path) {
        warn!(path = %path.display(), "extension not in supported list");
        return Err(ParseError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let size = ValidationGuard::new(config.max_file_size_bytes()).check(path)?;
    debug!(path = %path.display(), size, "pre-flight checks passed");
    registry.parse(path, options)
}
