use crate::document::{DocumentFormat, DocumentMetadata};
use crate::error::ParseError;
use crate::normalize::normalize_text;
use crate::parser::{FormatParser, ParseOptions, ValidationGuard, probe};
use chrono::{DateTime, NaiveDateTime, Utc};
use encoding_rs::Encoding;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Parser for plain `.txt` files.
#[derive(Debug, Clone, Default)]
pub struct TxtParser {
    guard: ValidationGuard,
}

impl TxtParser {
    pub fn new(guard: ValidationGuard) -> Self {
        Self { guard }
    }
}

impl FormatParser for TxtParser {
    fn name(&self) -> &str {
        "TxtParser"
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Txt
    }

    fn guard(&self) -> &ValidationGuard {
        &self.guard
    }

    fn can_parse(&self, path: &Path) -> bool {
        probe(self.name(), &self.guard, path, "txt")
    }

    /// Read the whole file in `options.encoding` and normalize it.
    fn extract_text(&self, path: &Path, options: &ParseOptions) -> Result<String, ParseError> {
        let bytes = fs::read(path).map_err(|error| {
            ParseError::extraction_with(path, "failed to read text file", error)
        })?;
        let decoded = decode_text(path, &bytes, &options.encoding)?;
        Ok(normalize_text(&decoded))
    }

    /// File size and filesystem timestamps; nothing is derived from content.
    fn extract_metadata(&self, path: &Path) -> Result<DocumentMetadata, ParseError> {
        let stat = fs::metadata(path).map_err(|error| {
            ParseError::extraction_with(path, "failed to stat text file", error)
        })?;

        Ok(DocumentMetadata {
            file_size: Some(stat.len()),
            creation_date: naive_timestamp(stat.created()),
            modification_date: naive_timestamp(stat.modified()),
            ..DocumentMetadata::default()
        })
    }
}

/// Decode `bytes` strictly with the encoding named by `label`.
pub fn decode_text(path: &Path, bytes: &[u8], label: &str) -> Result<String, ParseError> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        ParseError::extraction(path, format!("unknown text encoding '{label}'"))
    })?;

    let decoded = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            ParseError::extraction(
                path,
                format!("file contains byte sequences invalid in {}", encoding.name()),
            )
        })?;

    Ok(decoded.trim_start_matches('\u{feff}').to_owned())
}

fn naive_timestamp(time: io::Result<SystemTime>) -> Option<NaiveDateTime> {
    time.ok()
        .map(|time| DateTime::<Utc>::from(time).naive_utc())
}

#[cfg(test)]
mod tests {
    use super::{TxtParser, decode_text};
    use crate::document::{DocumentFormat, ProcessingStatus};
    use crate::error::ErrorKind;
    use crate::parser::{FormatParser, ParseOptions, ValidationGuard};
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn make_temp_file_with_suffix(contents: &[u8], suffix: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).expect("create temp file with suffix");
        file.write_all(contents).expect("write temp file contents");
        file.flush().expect("flush temp file");
        file
    }

    #[test]
    fn probes_only_txt_files() {
        let parser = TxtParser::default();
        let txt = make_temp_file_with_suffix(b"alpha", ".txt");
        let upper = make_temp_file_with_suffix(b"alpha", ".TXT");
        let md = make_temp_file_with_suffix(b"alpha", ".md");

        assert!(parser.can_parse(txt.path()));
        assert!(parser.can_parse(upper.path()));
        assert!(!parser.can_parse(md.path()));
        assert!(!parser.can_parse(Path::new("/definitely/missing.txt")));
    }

    #[test]
    fn probe_rejects_oversized_file() {
        let parser = TxtParser::new(ValidationGuard::new(3));
        let txt = make_temp_file_with_suffix(b"four", ".txt");
        assert!(!parser.can_parse(txt.path()));
    }

    #[test]
    fn extracts_normalized_text() {
        let file = make_temp_file_with_suffix(b"\xef\xbb\xbfalpha\n\nbeta\tgamma\r\n", ".txt");
        let text = TxtParser::default()
            .extract_text(file.path(), &ParseOptions::default())
            .expect("extract text");
        assert_eq!(text, "alpha beta gamma");
    }

    #[test]
    fn honours_configured_encoding() {
        let file = make_temp_file_with_suffix(b"caf\xe9 cr\xe8me", ".txt");
        let options = ParseOptions {
            encoding: "latin1".to_owned(),
            ..ParseOptions::default()
        };

        let text = TxtParser::default()
            .extract_text(file.path(), &options)
            .expect("extract latin-1 text");
        assert_eq!(text, "café crème");
    }

    #[test]
    fn invalid_bytes_fail_extraction() {
        let file = make_temp_file_with_suffix(b"caf\xe9", ".txt");
        let error = TxtParser::default()
            .extract_text(file.path(), &ParseOptions::default())
            .expect_err("not utf-8");
        assert_eq!(error.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn unknown_encoding_label_fails_extraction() {
        let error = decode_text(Path::new("a.txt"), b"abc", "klingon-8").expect_err("bad label");
        assert!(error.to_string().contains("unknown text encoding 'klingon-8'"));
    }

    #[test]
    fn metadata_has_size_and_timestamps_only() {
        let file = make_temp_file_with_suffix(b"one two", ".txt");
        let metadata = TxtParser::default()
            .extract_metadata(file.path())
            .expect("extract metadata");

        assert_eq!(metadata.file_size, Some(7));
        assert!(metadata.modification_date.is_some());
        assert!(metadata.title.is_none());
        assert!(metadata.page_count.is_none());
        assert!(metadata.keywords.is_none());
    }

    #[test]
    fn parse_produces_pending_txt_document() {
        let file = make_temp_file_with_suffix(b"Plain   text\ncontent", ".txt");
        let document = TxtParser::default()
            .parse(file.path(), &ParseOptions::default())
            .expect("parse text file");

        assert_eq!(document.content, "Plain text content");
        assert_eq!(document.format, DocumentFormat::Txt);
        assert_eq!(document.status(), ProcessingStatus::Pending);
        assert_eq!(document.size_bytes, 20);
        assert_eq!(document.metadata.word_count, Some(3));
    }

    #[test]
    fn parse_of_empty_file_yields_empty_content() {
        let file = make_temp_file_with_suffix(b"", ".txt");
        let document = TxtParser::default()
            .parse(file.path(), &ParseOptions::default())
            .expect("parse empty file");
        assert_eq!(document.content, "");
        assert_eq!(document.metadata.word_count, Some(0));
    }
}
