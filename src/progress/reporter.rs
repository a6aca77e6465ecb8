use crate::error::ParseError;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

const TOOL: &str = "docingest";

/// One JSONL line on stderr.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Progress {
        tool: &'static str,
        processed: u64,
        total: u64,
        percent: Option<f64>,
        elapsed_ms: u64,
    },
    /// A path that produced a FAILED record.
    Warning {
        tool: &'static str,
        path: String,
        code: &'static str,
        message: String,
    },
}

impl Event {
    /// Progress after `processed` of `total` inputs, percent rounded to one decimal.
    pub fn progress(processed: u64, total: u64, elapsed: Duration) -> Self {
        let percent = (total > 0).then(|| {
            let ratio = processed as f64 / total as f64;
            (ratio * 1000.0).round() / 10.0
        });
        Event::Progress {
            tool: TOOL,
            processed,
            total,
            percent,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Warning carrying the root error code, so wrapped credential failures stay visible.
    pub fn failure(path: &Path, error: &ParseError) -> Self {
        Event::Warning {
            tool: TOOL,
            path: path.display().to_string(),
            code: error.root_cause().kind().code(),
            message: error.to_string(),
        }
    }
}

/// Write `event` to stderr. A lost diagnostic line never fails the run.
pub fn report(event: &Event) {
    let mut stderr = io::stderr().lock();
    let _ = write_event(&mut stderr, event);
}

fn write_event(out: &mut dyn Write, event: &Event) -> io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()
}
