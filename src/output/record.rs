use crate::error::ParseError;
use crate::output::RECORD_VERSION;
use crate::parser::pdf::PdfInfo;
use crate::pipeline::Ingested;
use serde_json::{Value, json};
use std::error::Error;
use std::path::Path;

/// One output line for an ingested path.
pub fn ingested_record(ingested: &Ingested) -> Value {
    match &ingested.result {
        Ok(document) => json!({
            "version": RECORD_VERSION,
            "path": ingested.path.display().to_string(),
            "outcome": "PARSED",
            "document": document,
        }),
        Err(error) => failed_record(&ingested.path, error),
    }
}

pub fn inspected_record(path: &Path, info: &PdfInfo) -> Value {
    json!({
        "version": RECORD_VERSION,
        "path": path.display().to_string(),
        "outcome": "INSPECTED",
        "pdf": info,
    })
}

pub fn failed_record(path: &Path, error: &ParseError) -> Value {
    json!({
        "version": RECORD_VERSION,
        "path": path.display().to_string(),
        "outcome": "FAILED",
        "error": error_value(error),
    })
}

/// `{code, message}` plus the root cause code and the source chain when present.
pub fn error_value(error: &ParseError) -> Value {
    let mut value = json!({
        "code": error.kind(),
        "message": error.to_string(),
    });

    let root = error.root_cause();
    if root.kind() != error.kind() {
        value["cause"] = json!(root.kind());
    }

    let mut causes = Vec::new();
    let mut source = root.source();
    while let Some(current) = source {
        causes.push(current.to_string());
        source = current.source();
    }
    if !causes.is_empty() {
        value["sources"] = json!(causes);
    }
    value
}
