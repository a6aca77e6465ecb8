use crate::config::IngestConfig;
use crate::parser::{FormatParser, PdfParser, TxtParser, ValidationGuard};
use crate::registry::ParserRegistry;

/// Built-in parsers in priority order: PDF, then plain text.
///
/// Both share one validation guard sized from `config`.
pub fn register_builtins(config: &IngestConfig) -> Vec<Box<dyn FormatParser>> {
    let guard = ValidationGuard::new(config.max_file_size_bytes());
    vec![
        Box::new(PdfParser::new(guard)),
        Box::new(TxtParser::new(guard)),
    ]
}

impl ParserRegistry {
    /// Registry holding the built-in parsers.
    pub fn with_builtins(config: &IngestConfig) -> Self {
        let mut registry = Self::new();
        for parser in register_builtins(config) {
            registry.register(parser);
        }
        registry
    }
}
