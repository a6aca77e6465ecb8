use serde_json::Value;
use std::io::Write;

/// Write JSONL records to an output stream (one JSON object per line).
pub fn write_jsonl(out: &mut dyn Write, records: &[Value]) -> Result<(), String> {
    for record in records {
        serde_json::to_writer(&mut *out, record)
            .map_err(|error| format!("failed to serialize JSON record: {error}"))?;
        out.write_all(b"\n")
            .map_err(|error| format!("failed to write JSONL newline: {error}"))?;
    }

    out.flush()
        .map_err(|error| format!("failed to flush JSONL output: {error}"))?;

    Ok(())
}
