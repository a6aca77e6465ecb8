pub mod date;
pub mod images;
pub mod security;
pub mod text;

pub use date::parse_pdf_date;
pub use images::{ExtractedImage, ImageData};

use crate::document::{Document, DocumentFormat, DocumentMetadata, split_keywords};
use crate::error::ParseError;
use crate::normalize::normalize_text;
use crate::parser::{Extraction, FormatParser, ParseOptions, ValidationGuard, assemble, probe};
use lopdf::Object;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{info, warn};

/// Average extracted characters per page below which a PDF counts as scanned.
pub const SCANNED_CHARS_PER_PAGE: f64 = 50.0;

/// Bytes inspected at each end of the file by the container probe.
const PROBE_WINDOW: u64 = 1024;

/// Character-density verdict. A document without pages counts as scanned.
pub fn classify_scanned(total_chars: usize, pages: usize) -> bool {
    if pages == 0 {
        return true;
    }
    (total_chars as f64 / pages as f64) < SCANNED_CHARS_PER_PAGE
}

/// Structural summary returned by [`PdfParser::inspect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfInfo {
    pub page_count: u32,
    pub is_encrypted: bool,
    pub needs_password: bool,
    pub has_images: bool,
    /// Absent when the text is locked behind a password.
    pub estimated_words: Option<usize>,
    pub is_scanned: Option<bool>,
}

/// Parser for PDF containers backed by `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct PdfParser {
    guard: ValidationGuard,
}

impl PdfParser {
    pub fn new(guard: ValidationGuard) -> Self {
        Self { guard }
    }

    /// Decode embedded raster images.
    ///
    /// Never fails: any error is logged and yields an empty list.
    pub fn extract_images(
        &self,
        path: &Path,
        password: Option<&str>,
        output_dir: Option<&Path>,
    ) -> Vec<ExtractedImage> {
        let extracted = self
            .guard
            .check(path)
            .and_then(|_| open(path, password))
            .and_then(|pdf| {
                images::extract_images(&pdf, output_dir).map_err(|error| {
                    ParseError::extraction_with(path, "image extraction failed", error)
                })
            });
        match extracted {
            Ok(images) => images,
            Err(error) => {
                warn!(path = %path.display(), %error, "image extraction failed; continuing without images");
                Vec::new()
            }
        }
    }

    /// Scanned-document heuristic over reading-order text.
    pub fn is_scanned(&self, path: &Path, password: Option<&str>) -> Result<bool, ParseError> {
        self.guard.check(path)?;
        let pdf = open(path, password)?;
        let pages = text::page_texts(&pdf, true).map_err(|error| page_error(path, error))?;
        Ok(scanned(&pages))
    }

    /// Page count, protection state and content signals without building a document.
    pub fn inspect(&self, path: &Path) -> Result<PdfInfo, ParseError> {
        self.guard.check(path)?;
        let mut pdf = load(path)?;
        let is_encrypted = pdf.is_encrypted();
        let needs_password = security::needs_password(&mut pdf, path)?;
        let page_count = pdf.get_pages().len() as u32;

        if needs_password {
            return Ok(PdfInfo {
                page_count,
                is_encrypted,
                needs_password,
                has_images: false,
                estimated_words: None,
                is_scanned: None,
            });
        }

        let has_images = images::count_images(&pdf).is_ok_and(|count| count > 0);
        let pages = text::page_texts(&pdf, true).map_err(|error| page_error(path, error))?;
        let estimated_words = pages
            .iter()
            .map(|(_, text)| text.split_whitespace().count())
            .sum();

        Ok(PdfInfo {
            page_count,
            is_encrypted,
            needs_password,
            has_images,
            estimated_words: Some(estimated_words),
            is_scanned: Some(scanned(&pages)),
        })
    }
}

impl FormatParser for PdfParser {
    fn name(&self) -> &str {
        "PdfParser"
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn guard(&self) -> &ValidationGuard {
        &self.guard
    }

    fn can_parse(&self, path: &Path) -> bool {
        if !probe(self.name(), &self.guard, path, "pdf") {
            return false;
        }
        match is_pdf_container(path) {
            Ok(valid) => valid,
            Err(error) => {
                warn!(parser = self.name(), path = %path.display(), %error, "cannot probe pdf container");
                false
            }
        }
    }

    /// Page texts behind `--- Page N ---` markers, then normalized.
    fn extract_text(&self, path: &Path, options: &ParseOptions) -> Result<String, ParseError> {
        let pdf = open(path, options.password.as_deref())?;
        let pages = text::page_texts(&pdf, options.preserve_layout)
            .map_err(|error| page_error(path, error))?;
        Ok(normalize_text(&text::join_pages(&pages)))
    }

    /// Info dictionary fields and page count.
    ///
    /// A document locked behind a user password only reports its page count:
    /// the Info strings are encrypted and no password is available here.
    fn extract_metadata(&self, path: &Path) -> Result<DocumentMetadata, ParseError> {
        let mut pdf = load(path)?;
        if security::needs_password(&mut pdf, path)? {
            return Ok(DocumentMetadata {
                page_count: Some(pdf.get_pages().len() as u32),
                ..DocumentMetadata::default()
            });
        }
        Ok(metadata_from(&pdf))
    }

    fn parse(&self, path: &Path, options: &ParseOptions) -> Result<Document, ParseError> {
        assemble(self, path, options, || {
            let pdf = open(path, options.password.as_deref())?;
            let mut metadata = metadata_from(&pdf);

            let pages = text::page_texts(&pdf, options.preserve_layout)
                .map_err(|error| page_error(path, error))?;
            let is_scanned = scanned(&pages);
            metadata.is_scanned = Some(is_scanned);
            let mut notes = vec![if is_scanned {
                "scanned heuristic: below text density threshold, OCR recommended".to_owned()
            } else {
                "scanned heuristic: text layer present".to_owned()
            }];

            if options.extract_images {
                let extracted = match images::extract_images(&pdf, options.image_dir.as_deref()) {
                    Ok(extracted) => extracted,
                    Err(error) => {
                        warn!(path = %path.display(), %error, "image extraction failed; continuing without images");
                        Vec::new()
                    }
                };
                info!(path = %path.display(), images = extracted.len(), "extracted images");
                metadata.image_count = Some(extracted.len());
                notes.push(format!("extracted {} images", extracted.len()));
            }

            Ok(Extraction {
                metadata,
                text: normalize_text(&text::join_pages(&pages)),
                notes,
            })
        })
    }
}

fn load(path: &Path) -> Result<lopdf::Document, ParseError> {
    lopdf::Document::load(path)
        .map_err(|error| ParseError::extraction_with(path, "failed to open pdf container", error))
}

fn open(path: &Path, password: Option<&str>) -> Result<lopdf::Document, ParseError> {
    let mut pdf = load(path)?;
    security::unlock(&mut pdf, path, password)?;
    Ok(pdf)
}

fn page_error(path: &Path, error: lopdf::Error) -> ParseError {
    ParseError::extraction_with(path, "failed to extract page text", error)
}

fn scanned(pages: &[(u32, String)]) -> bool {
    let total_chars = pages
        .iter()
        .map(|(_, text)| text.trim().chars().count())
        .sum();
    classify_scanned(total_chars, pages.len())
}

/// `%PDF-` in the leading window and `%%EOF` in the trailing one.
fn is_pdf_container(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let window = PROBE_WINDOW.min(len);

    let mut head = vec![0; window as usize];
    file.read_exact(&mut head)?;
    if !contains(&head, b"%PDF-") {
        return Ok(false);
    }

    file.seek(SeekFrom::Start(len - window))?;
    let mut tail = vec![0; window as usize];
    file.read_exact(&mut tail)?;
    Ok(contains(&tail, b"%%EOF"))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn metadata_from(pdf: &lopdf::Document) -> DocumentMetadata {
    let field = |key: &[u8]| info_field(pdf, key);
    DocumentMetadata {
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
        keywords: field(b"Keywords").map(|raw| split_keywords(&raw)),
        creation_date: field(b"CreationDate").and_then(|raw| parse_pdf_date(&raw)),
        modification_date: field(b"ModDate").and_then(|raw| parse_pdf_date(&raw)),
        page_count: Some(pdf.get_pages().len() as u32),
        ..DocumentMetadata::default()
    }
}

/// One Info dictionary entry as text; absent or undecodable entries are `None`.
fn info_field(pdf: &lopdf::Document, key: &[u8]) -> Option<String> {
    let info = match pdf.trailer.get(b"Info").ok()? {
        Object::Reference(id) => pdf.get_object(*id).ok()?,
        object => object,
    };
    let value = info.as_dict().ok()?.get(key).ok()?;
    object_as_string(pdf, value, 0)
}

fn object_as_string(pdf: &lopdf::Document, object: &Object, depth: usize) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Reference(id) if depth < 8 => {
            object_as_string(pdf, pdf.get_object(*id).ok()?, depth + 1)
        }
        _ => None,
    }
}

/// PDF text strings are UTF-16BE behind a BOM, otherwise byte-oriented.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xfe, 0xff, rest @ ..] => text::decode_utf16_be(rest),
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => bytes.iter().map(|&byte| char::from(byte)).collect(),
        },
    }
}
