use crate::error::ParseError;
use std::fs::{self, File};
use std::io;
use std::path::Path;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Pre-flight checks shared by every parser.
///
/// Checks run in a fixed order (exists, regular file, readable, size) and the
/// first violation is reported, so messages are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationGuard {
    max_file_size: u64,
}

impl ValidationGuard {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate `path` and return its size in bytes.
    pub fn check(&self, path: &Path) -> Result<u64, ParseError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(ParseError::invalid_input(path, "file does not exist"));
            }
            Err(error) => {
                return Err(ParseError::invalid_input(
                    path,
                    format!("cannot stat file: {error}"),
                ));
            }
        };

        if !metadata.is_file() {
            return Err(ParseError::invalid_input(path, "path is not a regular file"));
        }

        if let Err(error) = File::open(path) {
            return Err(ParseError::invalid_input(
                path,
                format!("file is not readable: {error}"),
            ));
        }

        let size = metadata.len();
        if size > self.max_file_size {
            return Err(ParseError::invalid_input(
                path,
                format!(
                    "file size ({size} bytes) exceeds maximum allowed size ({} bytes)",
                    self.max_file_size
                ),
            ));
        }

        Ok(size)
    }
}

impl Default for ValidationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}
