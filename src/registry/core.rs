use crate::document::{Document, DocumentFormat};
use crate::error::ParseError;
use crate::parser::{FormatParser, ParseOptions};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Ordered collection of parsers; registration order is probing priority.
///
/// Register more specific formats before generic catch-alls: the first parser
/// whose probe accepts a path wins.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn FormatParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Append a parser after every parser already registered.
    pub fn register(&mut self, parser: Box<dyn FormatParser>) {
        self.parsers.push(Arc::from(parser));
    }

    /// First parser, in registration order, whose probe accepts `path`.
    ///
    /// A probe that panics is logged and treated as a non-match so one broken
    /// parser cannot hide the others.
    pub fn get_parser(&self, path: &Path) -> Option<&dyn FormatParser> {
        self.iter().find(|parser| probe_guarded(*parser, path))
    }

    /// Select a parser for `path` and run it.
    pub fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Document, ParseError> {
        let parser = self
            .get_parser(path)
            .ok_or_else(|| ParseError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        parser.parse(path, options)
    }

    /// Iterate registered parsers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn FormatParser> {
        self.parsers.iter().map(|parser| parser.as_ref())
    }

    /// Registered parsers in registration order.
    pub fn list_parsers(&self) -> Vec<ParserInfo> {
        self.iter()
            .map(|parser| ParserInfo {
                name: parser.name().to_owned(),
                format: parser.format(),
                max_file_size: parser.guard().max_file_size(),
            })
            .collect()
    }

    /// Remove every registered parser.
    pub fn clear(&mut self) {
        self.parsers.clear();
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

/// Listing entry for a registered parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserInfo {
    pub name: String,
    pub format: DocumentFormat,
    pub max_file_size: u64,
}

fn probe_guarded(parser: &dyn FormatParser, path: &Path) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| parser.can_parse(path))) {
        Ok(accepted) => accepted,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|message| (*message).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            warn!(
                parser = parser.name(),
                path = %path.display(),
                panic = %detail,
                "parser probe panicked; treating as no match"
            );
            false
        }
    }
}
