use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

/// Kerning adjustment (thousandths of an em) treated as a word gap inside `TJ`.
const TJ_WORD_GAP: f64 = -200.0;

/// Text of every page in page order, including pages with no text.
pub(crate) fn page_texts(
    pdf: &Document,
    preserve_layout: bool,
) -> Result<Vec<(u32, String)>, lopdf::Error> {
    pdf.get_pages()
        .into_iter()
        .map(|(page_number, page_id)| {
            let text = if preserve_layout {
                pdf.extract_text(&[page_number])?
            } else {
                block_text(pdf, page_id)?
            };
            Ok((page_number, text))
        })
        .collect()
}

/// Concatenate page texts behind `--- Page N ---` markers, skipping blank pages.
pub(crate) fn join_pages(pages: &[(u32, String)]) -> String {
    pages
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(page_number, text)| format!("\n--- Page {page_number} ---\n{text}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text grouped by `BT`/`ET` blocks, one block per line.
fn block_text(pdf: &Document, page_id: ObjectId) -> Result<String, lopdf::Error> {
    let content = Content::decode(&pdf.get_page_content(page_id)?)?;
    let mut blocks = Vec::new();
    let mut current = String::new();

    for operation in &content.operations {
        match operation.operator.as_str() {
            "BT" => current.clear(),
            "ET" => {
                let block = current.trim();
                if !block.is_empty() {
                    blocks.push(block.to_owned());
                }
                current.clear();
            }
            "Tj" => push_strings(&mut current, &operation.operands),
            "'" | "\"" => {
                break_line(&mut current);
                if let Some(last) = operation.operands.last() {
                    push_strings(&mut current, std::slice::from_ref(last));
                }
            }
            "TJ" => {
                for operand in &operation.operands {
                    if let Object::Array(items) = operand {
                        push_kerned(&mut current, items);
                    }
                }
            }
            "T*" | "Td" | "TD" => break_line(&mut current),
            _ => {}
        }
    }

    Ok(blocks.join("\n"))
}

fn push_strings(out: &mut String, operands: &[Object]) {
    for operand in operands {
        if let Object::String(bytes, _) = operand {
            out.push_str(&decode_content_string(bytes));
        }
    }
}

fn push_kerned(out: &mut String, items: &[Object]) {
    for item in items {
        match item {
            Object::String(bytes, _) => out.push_str(&decode_content_string(bytes)),
            Object::Integer(value) if (*value as f64) < TJ_WORD_GAP => out.push(' '),
            Object::Real(value) if f64::from(*value) < TJ_WORD_GAP => out.push(' '),
            _ => {}
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push('\n');
    }
}

/// Content-stream strings are single-byte codes unless they carry a UTF-16 BOM.
fn decode_content_string(bytes: &[u8]) -> String {
    match bytes {
        [0xfe, 0xff, rest @ ..] => decode_utf16_be(rest),
        _ => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

pub(crate) fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}
