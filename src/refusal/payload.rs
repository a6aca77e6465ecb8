use crate::output::RECORD_VERSION;
use crate::refusal::codes::RefusalCode;
use serde::Serialize;
use serde_json::Value;

/// Refusal envelope emitted to stdout on exit 2.
#[derive(Debug, Serialize)]
pub struct RefusalPayload {
    pub version: String,
    pub outcome: String,
    pub refusal: RefusalDetail,
}

/// Detail within a refusal envelope.
#[derive(Debug, Serialize)]
pub struct RefusalDetail {
    pub code: RefusalCode,
    pub message: String,
    pub detail: Value,
}

impl RefusalPayload {
    pub fn new(code: RefusalCode, message: impl Into<String>, detail: Value) -> Self {
        Self {
            version: RECORD_VERSION.to_owned(),
            outcome: "REFUSAL".to_owned(),
            refusal: RefusalDetail {
                code,
                message: message.into(),
                detail,
            },
        }
    }
}
