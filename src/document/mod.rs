pub mod chunk;
pub mod metadata;
pub mod options;
pub mod results;
pub mod status;

pub use chunk::DocumentChunk;
pub use metadata::{DocumentMetadata, split_keywords};
pub use options::ProcessingOptions;
pub use results::{ClassificationResult, DocumentSummary, ExtractedEntity, SentimentResult};
pub use status::ProcessingStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Format tag of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
    Image,
    Unknown,
}

impl DocumentFormat {
    /// Infer the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" | "doc" => DocumentFormat::Docx,
            "txt" | "text" => DocumentFormat::Txt,
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "gif" => DocumentFormat::Image,
            _ => DocumentFormat::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Txt => "txt",
            DocumentFormat::Image => "image",
            DocumentFormat::Unknown => "unknown",
        }
    }
}

/// Violations of the document model invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("filename cannot be empty")]
    EmptyFilename,
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },
}

/// Canonical, format-independent record produced by a parser.
///
/// `id`, `filename` and `created_at` are fixed at construction and only
/// exposed through accessors. Status moves through [`Document::update_status`],
/// which keeps `processed_at` and the processing log consistent with it.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    id: Uuid,
    filename: String,
    pub source_path: PathBuf,
    pub format: DocumentFormat,
    pub size_bytes: u64,
    pub content: String,
    pub content_hash: String,
    pub metadata: DocumentMetadata,
    status: ProcessingStatus,
    pub options: ProcessingOptions,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DocumentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
    pub entities: Vec<ExtractedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentResult>,
    pub chunks: Vec<DocumentChunk>,

    error_message: Option<String>,
    processing_log: Vec<String>,
}

impl Document {
    /// Build a pending document, validating the filename taken from `source_path`.
    pub fn new(
        source_path: &Path,
        format: DocumentFormat,
        size_bytes: u64,
        content: String,
        metadata: DocumentMetadata,
        options: ProcessingOptions,
    ) -> Result<Self, ModelError> {
        let filename = source_path
            .file_name()
            .map(|name| name.to_string_lossy().trim().to_owned())
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(ModelError::EmptyFilename);
        }

        let now = Utc::now();
        let content_hash = content_hash(&content);
        Ok(Self {
            id: Uuid::new_v4(),
            filename,
            source_path: source_path.to_path_buf(),
            format,
            size_bytes,
            content,
            content_hash,
            metadata,
            status: ProcessingStatus::Pending,
            options,
            created_at: now,
            updated_at: now,
            processed_at: None,
            summary: None,
            classification: None,
            entities: Vec::new(),
            sentiment: None,
            chunks: Vec::new(),
            error_message: None,
            processing_log: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn processing_log(&self) -> &[String] {
        &self.processing_log
    }

    /// Append a timestamped entry to the processing log.
    pub fn add_log(&mut self, message: impl AsRef<str>) {
        let entry = format!("[{}] {}", Utc::now().to_rfc3339(), message.as_ref());
        self.processing_log.push(entry);
    }

    /// Move to `status`, recording the change (and any error) in the log.
    pub fn update_status(
        &mut self,
        status: ProcessingStatus,
        error_message: Option<&str>,
    ) -> Result<(), ModelError> {
        if !self.status.can_transition_to(status) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }

        let previous = self.status;
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        if status == ProcessingStatus::Completed {
            self.processed_at = Some(now);
        }
        self.add_log(format!("status: {previous} -> {status}"));

        if let Some(message) = error_message {
            self.error_message = Some(message.to_owned());
            self.add_log(format!("ERROR: {message}"));
        }

        Ok(())
    }

    pub fn push_chunk(&mut self, content: impl Into<String>) -> &DocumentChunk {
        let index = self.chunks.len();
        self.chunks.push(DocumentChunk::new(self.id, index, content));
        &self.chunks[index]
    }
}

/// BLAKE3 digest of extracted content, formatted as `blake3:<hex>`.
pub fn content_hash(content: &str) -> String {
    format!("blake3:{}", blake3::hash(content.as_bytes()).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(path: &str) -> Result<Document, ModelError> {
        Document::new(
            Path::new(path),
            DocumentFormat::from_path(Path::new(path)),
            42,
            "hello world".to_owned(),
            DocumentMetadata::default(),
            ProcessingOptions::default(),
        )
    }

    #[test]
    fn new_document_starts_pending_with_unique_id() {
        let first = sample("/data/report.txt").expect("build document");
        let second = sample("/data/report.txt").expect("build document");

        assert_eq!(first.status(), ProcessingStatus::Pending);
        assert_eq!(first.filename(), "report.txt");
        assert_eq!(first.format, DocumentFormat::Txt);
        assert!(first.processed_at().is_none());
        assert!(first.processing_log().is_empty());
        assert_ne!(first.id(), second.id());
        assert!(first.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn rejects_blank_filename() {
        assert_eq!(sample("/").expect_err("root has no filename"), ModelError::EmptyFilename);
        assert_eq!(sample("/data/   ").expect_err("blank filename"), ModelError::EmptyFilename);
    }

    #[test]
    fn filename_is_trimmed() {
        let document = sample("/data/ padded.pdf ").expect("build document");
        assert_eq!(document.filename(), "padded.pdf");
    }

    #[test]
    fn processed_at_tracks_completed_status() {
        let mut document = sample("a.pdf").expect("build document");

        document
            .update_status(ProcessingStatus::Processing, None)
            .expect("pending -> processing");
        assert!(document.processed_at().is_none());

        document
            .update_status(ProcessingStatus::Completed, None)
            .expect("processing -> completed");
        assert!(document.processed_at().is_some());
        assert_eq!(document.processing_log().len(), 2);
        assert!(document.processing_log()[1].ends_with("status: processing -> completed"));
    }

    #[test]
    fn failure_records_error_message_in_log() {
        let mut document = sample("a.pdf").expect("build document");
        document
            .update_status(ProcessingStatus::Processing, None)
            .expect("pending -> processing");
        document
            .update_status(ProcessingStatus::Failed, Some("summarizer timed out"))
            .expect("processing -> failed");

        assert_eq!(document.error_message(), Some("summarizer timed out"));
        assert!(document.processed_at().is_none());
        let last = document.processing_log().last().expect("log entry");
        assert!(last.starts_with('['));
        assert!(last.ends_with("ERROR: summarizer timed out"));
    }

    #[test]
    fn rejects_non_monotonic_transitions() {
        let mut document = sample("a.pdf").expect("build document");
        document
            .update_status(ProcessingStatus::Processing, None)
            .expect("pending -> processing");
        document
            .update_status(ProcessingStatus::Cancelled, None)
            .expect("processing -> cancelled");

        let error = document
            .update_status(ProcessingStatus::Processing, None)
            .expect_err("cancelled is terminal");
        assert_eq!(
            error,
            ModelError::InvalidTransition {
                from: ProcessingStatus::Cancelled,
                to: ProcessingStatus::Processing,
            }
        );
        assert_eq!(document.status(), ProcessingStatus::Cancelled);
        assert_eq!(document.processing_log().len(), 2);
    }

    #[test]
    fn chunks_are_indexed_and_owned_by_document() {
        let mut document = sample("a.txt").expect("build document");
        document.push_chunk("first");
        let second = document.push_chunk("second").clone();

        assert_eq!(second.chunk_index, 1);
        assert_eq!(second.document_id, document.id());
        assert_eq!(document.chunks.len(), 2);
    }

    #[test]
    fn format_inference_covers_known_extensions() {
        assert_eq!(DocumentFormat::from_path(Path::new("x.PDF")), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path(Path::new("x.doc")), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::from_path(Path::new("x.text")), DocumentFormat::Txt);
        assert_eq!(DocumentFormat::from_path(Path::new("x.tif")), DocumentFormat::Image);
        assert_eq!(DocumentFormat::from_path(Path::new("x.bin")), DocumentFormat::Unknown);
        assert_eq!(DocumentFormat::from_path(Path::new("noext")), DocumentFormat::Unknown);
    }

    #[test]
    fn serializes_public_record_shape() {
        let document = sample("/data/report.txt").expect("build document");
        let value = serde_json::to_value(&document).expect("serialize document");

        assert_eq!(value["filename"], "report.txt");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["format"], "txt");
        assert_eq!(value["size_bytes"], 42);
        assert!(value["processed_at"].is_null());
        assert!(value.get("summary").is_none());
    }
}
