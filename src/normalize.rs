/// Normalize raw extracted text.
///
/// Control characters other than newline and tab are dropped, then every
/// whitespace run (newlines included) collapses to a single space and the
/// ends are trimmed. Paragraph structure does not survive; callers that need
/// it must split the raw text first. Dropping control characters before
/// collapsing keeps the function idempotent.
pub fn normalize_text(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());

    let cleaned = raw
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace());
    let mut pending_space = false;
    for ch in cleaned {
        if ch.is_whitespace() {
            pending_space = !normalized.is_empty();
            continue;
        }
        if pending_space {
            normalized.push(' ');
            pending_space = false;
        }
        normalized.push(ch);
    }

    normalized
}
