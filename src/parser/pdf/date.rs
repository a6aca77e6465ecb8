use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static PDF_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:D:)?(\d{4})(\d{2})(\d{2})(\d{2})?(\d{2})?(\d{2})?")
        .expect("PDF date pattern is valid")
});

/// Decode a PDF date string (`D:YYYYMMDDHHmmSS...`).
///
/// The `D:` prefix is optional and truncated time components default to
/// zero. Anything after the seconds (timezone offsets) is ignored. Returns
/// `None` for strings that do not follow the grammar or name an impossible
/// calendar date.
pub fn parse_pdf_date(raw: &str) -> Option<NaiveDateTime> {
    let captures = PDF_DATE.captures(raw.trim())?;
    let component = |index: usize| -> Option<u32> {
        match captures.get(index) {
            Some(value) => value.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, component(2)?, component(3)?)?.and_hms_opt(
        component(4)?,
        component(5)?,
        component(6)?,
    )
}
