use serde::Serialize;

/// Reasons a whole run is refused before or while emitting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefusalCode {
    /// Config file unreadable or invalid, or a bad override value.
    #[serde(rename = "E_BAD_CONFIG")]
    BadConfig,
    /// No input paths, or the path list could not be read.
    #[serde(rename = "E_BAD_INPUT")]
    BadInput,
    /// Records could not be written to stdout.
    #[serde(rename = "E_OUTPUT_FAILED")]
    OutputFailed,
}
