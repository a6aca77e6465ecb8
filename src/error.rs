use crate::document::ModelError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed cause carried by extraction failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable error codes surfaced to callers and in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Missing, unreadable, non-regular or oversized file.
    #[serde(rename = "E_INVALID_INPUT")]
    InvalidInput,
    /// No registered parser accepted the file.
    #[serde(rename = "E_UNSUPPORTED_FORMAT")]
    UnsupportedFormat,
    /// Encrypted PDF and no password supplied.
    #[serde(rename = "E_PASSWORD_REQUIRED")]
    PasswordRequired,
    /// Encrypted PDF and the supplied password was rejected.
    #[serde(rename = "E_INVALID_PASSWORD")]
    InvalidPassword,
    /// Decoding error inside a format parser.
    #[serde(rename = "E_EXTRACTION_FAILED")]
    ExtractionFailed,
    /// Extracted data violated a document model invariant.
    #[serde(rename = "E_INVALID_DOCUMENT")]
    InvalidDocument,
    /// Wrapper around any failure during a full parse.
    #[serde(rename = "E_PARSE_FAILED")]
    ParseFailed,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "E_INVALID_INPUT",
            ErrorKind::UnsupportedFormat => "E_UNSUPPORTED_FORMAT",
            ErrorKind::PasswordRequired => "E_PASSWORD_REQUIRED",
            ErrorKind::InvalidPassword => "E_INVALID_PASSWORD",
            ErrorKind::ExtractionFailed => "E_EXTRACTION_FAILED",
            ErrorKind::InvalidDocument => "E_INVALID_DOCUMENT",
            ErrorKind::ParseFailed => "E_PARSE_FAILED",
        }
    }
}

/// Errors raised while validating, probing or parsing an input file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid input '{}': {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("no registered parser can handle '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("'{}' is password protected and no password was provided", path.display())]
    PasswordRequired { path: PathBuf },

    #[error("invalid password for '{}'", path.display())]
    InvalidPassword { path: PathBuf },

    #[error("failed to extract from '{}': {message}", path.display())]
    ExtractionFailed {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("invalid document for '{}': {source}", path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("failed to parse '{}': {cause}", path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        cause: Box<ParseError>,
    },
}

impl ParseError {
    pub fn invalid_input(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn extraction(path: &Path, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            path: path.to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    pub fn extraction_with(
        path: &Path,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ExtractionFailed {
            path: path.to_path_buf(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wrap a failure from inside a full parse, keeping the original as the cause.
    pub fn parse_failed(path: &Path, cause: ParseError) -> Self {
        Self::ParseFailed {
            path: path.to_path_buf(),
            cause: Box::new(cause),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::PasswordRequired { .. } => ErrorKind::PasswordRequired,
            Self::InvalidPassword { .. } => ErrorKind::InvalidPassword,
            Self::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            Self::InvalidDocument { .. } => ErrorKind::InvalidDocument,
            Self::ParseFailed { .. } => ErrorKind::ParseFailed,
        }
    }

    /// Innermost error beneath any `ParseFailed` wrappers.
    pub fn root_cause(&self) -> &ParseError {
        let mut current = self;
        while let Self::ParseFailed { cause, .. } = current {
            current = cause;
        }
        current
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidInput { path, .. }
            | Self::UnsupportedFormat { path }
            | Self::PasswordRequired { path }
            | Self::InvalidPassword { path }
            | Self::ExtractionFailed { path, .. }
            | Self::InvalidDocument { path, .. }
            | Self::ParseFailed { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ParseError};
    use std::error::Error as _;
    use std::path::Path;

    #[test]
    fn messages_name_the_offending_path() {
        let error = ParseError::invalid_input(Path::new("/data/missing.pdf"), "file does not exist");
        assert_eq!(
            error.to_string(),
            "invalid input '/data/missing.pdf': file does not exist"
        );
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn parse_failed_preserves_cause_chain() {
        let path = Path::new("/data/locked.pdf");
        let wrapped = ParseError::parse_failed(
            path,
            ParseError::PasswordRequired {
                path: path.to_path_buf(),
            },
        );

        assert_eq!(wrapped.kind(), ErrorKind::ParseFailed);
        assert_eq!(wrapped.root_cause().kind(), ErrorKind::PasswordRequired);
        let source = wrapped.source().expect("cause should be exposed as source");
        assert!(source.to_string().contains("password protected"));
    }

    #[test]
    fn extraction_errors_expose_underlying_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "stream is corrupt");
        let error = ParseError::extraction_with(Path::new("a.txt"), "read failed", io);

        assert_eq!(error.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(
            error.source().map(ToString::to_string).as_deref(),
            Some("stream is corrupt")
        );
    }

    #[test]
    fn error_kinds_serialize_as_stable_codes() {
        assert_eq!(
            serde_json::to_value(ErrorKind::PasswordRequired).expect("serialize kind"),
            serde_json::json!("E_PASSWORD_REQUIRED")
        );
        assert_eq!(ErrorKind::UnsupportedFormat.code(), "E_UNSUPPORTED_FORMAT");
    }
}
