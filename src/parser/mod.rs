pub mod guard;
pub mod pdf;
pub mod text;

pub use guard::ValidationGuard;
pub use pdf::PdfParser;
pub use text::TxtParser;

use crate::document::{Document, DocumentFormat, DocumentMetadata, ProcessingOptions};
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Options recognized by parsers. Unknown keys are ignored when deserializing.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Cohesive reading-order text (`true`) or block-structured text (`false`).
    pub preserve_layout: bool,
    pub extract_images: bool,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// WHATWG label of the text encoding used by plain-text parsers.
    pub encoding: String,
    /// Where extracted images are written; kept in memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dir: Option<PathBuf>,
    /// Base snapshot attached to produced documents. Never read from config:
    /// `IngestConfig::parse_options` fills it from the top-level `processing` block.
    #[serde(skip_deserializing)]
    pub processing: ProcessingOptions,
}

impl ParseOptions {
    /// Processing snapshot for a new document, reflecting the toggles used.
    pub fn snapshot(&self) -> ProcessingOptions {
        ProcessingOptions {
            preserve_layout: self.preserve_layout,
            extract_images: self.extract_images,
            ..self.processing.clone()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            preserve_layout: true,
            extract_images: false,
            password: None,
            encoding: "utf-8".to_owned(),
            image_dir: None,
            processing: ProcessingOptions::default(),
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("preserve_layout", &self.preserve_layout)
            .field("extract_images", &self.extract_images)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("encoding", &self.encoding)
            .field("image_dir", &self.image_dir)
            .field("processing", &self.processing)
            .finish()
    }
}

/// Capability set every format parser implements.
///
/// Implementations must be reentrant: a single instance may be shared by
/// worker threads parsing different files at the same time.
pub trait FormatParser: Send + Sync {
    /// Parser name used in logs and listings, e.g. "PdfParser".
    fn name(&self) -> &str;

    /// Format tag stamped on produced documents.
    fn format(&self) -> DocumentFormat;

    fn guard(&self) -> &ValidationGuard;

    /// Cheap probe. Never fails: validation problems are reported as `false`.
    fn can_parse(&self, path: &Path) -> bool;

    fn extract_text(&self, path: &Path, options: &ParseOptions) -> Result<String, ParseError>;

    /// Missing individual fields are left absent rather than failing the call.
    fn extract_metadata(&self, path: &Path) -> Result<DocumentMetadata, ParseError>;

    /// Validate, extract metadata and text, and assemble a pending document.
    fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Document, ParseError> {
        assemble(self, path, options, || {
            let metadata = self.extract_metadata(path)?;
            let text = self.extract_text(path, options)?;
            Ok(Extraction::new(metadata, text))
        })
    }
}

/// Output of a parser's extraction phase.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub metadata: DocumentMetadata,
    /// Already normalized text.
    pub text: String,
    /// Extra entries for the document's processing log.
    pub notes: Vec<String>,
}

impl Extraction {
    pub fn new(metadata: DocumentMetadata, text: String) -> Self {
        Self {
            metadata,
            text,
            notes: Vec::new(),
        }
    }
}

/// Shared parse orchestration.
///
/// Guard failures are returned as-is. Any failure of `extract` or of document
/// assembly is logged and wrapped in [`ParseError::ParseFailed`]; no partial
/// document is ever returned.
pub fn assemble<P, F>(
    parser: &P,
    path: &Path,
    options: &ParseOptions,
    extract: F,
) -> Result<Document, ParseError>
where
    P: FormatParser + ?Sized,
    F: FnOnce() -> Result<Extraction, ParseError>,
{
    let size = parser.guard().check(path)?;
    info!(parser = parser.name(), path = %path.display(), "starting parse");

    let document = extract()
        .and_then(|extraction| build_document(parser, path, size, extraction, options))
        .map_err(|cause| {
            error!(parser = parser.name(), path = %path.display(), error = %cause, "parse failed");
            ParseError::parse_failed(path, cause)
        })?;

    info!(
        parser = parser.name(),
        path = %path.display(),
        chars = document.content.chars().count(),
        "parsed document"
    );
    Ok(document)
}

fn build_document<P: FormatParser + ?Sized>(
    parser: &P,
    path: &Path,
    size: u64,
    extraction: Extraction,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let Extraction {
        mut metadata,
        text,
        notes,
    } = extraction;

    metadata.file_size.get_or_insert(size);
    metadata.word_count = Some(text.split_whitespace().count());
    let size_bytes = metadata.file_size.unwrap_or(size);

    let mut document = Document::new(
        path,
        parser.format(),
        size_bytes,
        text,
        metadata,
        options.snapshot(),
    )
    .map_err(|source| ParseError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })?;

    document.add_log(format!("parsed by {}", parser.name()));
    for note in notes {
        document.add_log(note);
    }
    Ok(document)
}

/// Extension match followed by the validation guard, reported as a boolean.
pub(crate) fn probe(parser: &str, guard: &ValidationGuard, path: &Path, extension: &str) -> bool {
    if !has_extension(path, extension) {
        return false;
    }

    match guard.check(path) {
        Ok(_) => true,
        Err(error) => {
            warn!(parser, path = %path.display(), %error, "cannot parse file");
            false
        }
    }
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
