use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::{DetectionError, ExtractError};
use crate::model::RawGrid;
use crate::source::{DetectionParams, PageSource};
use crate::table_detect::detect_grids;
use crate::table_parse::{split_hard_cells, split_soft_cells};

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    replacement * 8 > total || control * 5 > total
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let bytes = bytes
        .strip_prefix(&[0xFE, 0xFF])
        .or_else(|| bytes.strip_prefix(&[0xFF, 0xFE]))
        .unwrap_or(bytes);
    let (text, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let has_bom = bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]);
    let hint = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    let utf16_hint = ["utf16", "ucs2", "identity-h", "unicode"]
        .iter()
        .any(|name| hint.contains(name));
    if (has_bom || utf16_hint)
        && let Some(text) = decode_utf16(bytes)
    {
        return text;
    }

    if ["big5", "b5", "eten", "cns"]
        .iter()
        .any(|name| hint.contains(name))
    {
        let (text, _, had_errors) = BIG5.decode(bytes);
        if !had_errors && !text.is_empty() {
            return text.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Higher scores for text that splits into cells the way tables do.
fn tabular_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut score = 0_i64;
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        score += 1;
        if split_hard_cells(line).len() >= 2 || split_soft_cells(line).len() >= 3 {
            score += 50;
        }
        if line.chars().any(|ch| ch.is_ascii_digit()) {
            score += 5;
        }
    }

    if looks_decoding_broken(text) {
        score -= 800;
    }
    score
}

fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => text.push_str(&decode_pdf_bytes(encoding, bytes)),
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                // Large negative kerning in TJ arrays stands for a word gap.
                Object::Integer(value) if *value < -100 => text.push(' '),
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|font| encodings.get(font).copied());
            }
            "Tj" | "TJ" | "'" | "\"" => collect_text(&mut current, encoding, &operation.operands),
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// A PDF loaded with `lopdf`, probed for tables through its page text.
///
/// Page text is extracted on first use, so loading and counting pages stay
/// cheap.
pub struct PdfPageSource {
    bytes: Vec<u8>,
    document: Document,
    page_numbers: Vec<(u32, ObjectId)>,
    page_texts: OnceCell<Vec<String>>,
}

impl PdfPageSource {
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a PDF.
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// # Errors
    ///
    /// Fails when `bytes` is not a PDF.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ExtractError> {
        let bytes = bytes.into();
        let document = Document::load_mem(&bytes)?;
        let page_numbers = document.get_pages().into_iter().collect();
        Ok(Self {
            bytes,
            document,
            page_numbers,
            page_texts: OnceCell::new(),
        })
    }

    fn read_page_texts(&self) -> Vec<String> {
        // pdf-extract panics on some documents lopdf loads fine, e.g. a font
        // missing from the page resources.
        let extracted = std::panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&self.bytes)
        }));
        let (split_pages, whole_text) = match extracted {
            Ok(Ok(text)) => {
                let pages = split_text_into_pages(&text);
                if pages.len() == self.page_numbers.len() {
                    (Some(pages), None)
                } else {
                    (None, Some(text))
                }
            }
            Ok(Err(error)) => {
                debug!(%error, "pdf-extract failed; using content streams only");
                (None, None)
            }
            Err(_) => {
                debug!("pdf-extract panicked; using content streams only");
                (None, None)
            }
        };

        self.page_numbers
            .iter()
            .enumerate()
            .map(|(index, (page_no, page_id))| {
                let mut candidates = Vec::new();
                if let Some(text) = split_pages.as_ref().and_then(|pages| pages.get(index)) {
                    candidates.push(text.clone());
                }
                if self.page_numbers.len() == 1
                    && let Some(text) = &whole_text
                {
                    candidates.push(text.clone());
                }
                if let Some(text) = content_stream_text(&self.document, *page_id) {
                    candidates.push(text);
                }
                if let Ok(text) = self.document.extract_text(&[*page_no]) {
                    candidates.push(text);
                }

                candidates
                    .into_iter()
                    .filter(|text| !text.trim().is_empty())
                    .max_by_key(|text| tabular_score(text))
                    .unwrap_or_default()
            })
            .collect()
    }

    fn page_text(&self, page: u32) -> Result<&str, DetectionError> {
        let out_of_range = DetectionError::PageOutOfRange {
            page,
            page_count: self.page_count(),
        };
        let index = page
            .checked_sub(1)
            .and_then(|index| usize::try_from(index).ok())
            .ok_or_else(|| out_of_range.clone())?;
        self.page_texts
            .get_or_init(|| self.read_page_texts())
            .get(index)
            .map(String::as_str)
            .ok_or(out_of_range)
    }
}

impl PageSource for PdfPageSource {
    fn page_count(&self) -> u32 {
        u32::try_from(self.page_numbers.len()).unwrap_or(u32::MAX)
    }

    fn extract_tables(
        &self,
        page: u32,
        params: &DetectionParams,
    ) -> Result<Vec<RawGrid>, DetectionError> {
        Ok(detect_grids(self.page_text(page)?, params))
    }

    fn extract_text(&self, page: u32) -> Result<String, DetectionError> {
        self.page_text(page).map(str::to_string)
    }
}
