use std::collections::HashSet;

use tracing::warn;

use crate::error::ExtractError;
use crate::model::{Catalog, NormalizedTable, SheetKind, SheetModel, TableRecord};
use crate::warning::{ExtractWarning, WarningCode};

pub const MIN_COLUMN_WIDTH: f64 = 8.0;
pub const MAX_COLUMN_WIDTH: f64 = 50.0;
const COLUMN_PADDING: f64 = 2.0;

pub const TEXT_SHEET_NAME: &str = "Text_Content";
pub const DIAGNOSTIC_SHEET_NAME: &str = "No_Data_Found";
const TEXT_SHEET_WIDTHS: [f64; 2] = [8.0, 80.0];
const DIAGNOSTIC_SHEET_WIDTH: f64 = 60.0;

/// Longest text a spreadsheet cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetLayout {
    /// Append the text sheet after the table sheets when both exist.
    pub keep_text_pages: bool,
}

/// Approximate rendered width of `cell` in a proportional font.
#[must_use]
pub fn display_length(cell: &str) -> f64 {
    cell.chars()
        .map(|ch| match ch {
            'W' | 'M' | 'm' | 'w' => 1.5,
            'i' | 'l' => 0.8,
            _ => 1.0,
        })
        .sum()
}

/// One width per column of the widest row, clamped to
/// [`MIN_COLUMN_WIDTH`]..=[`MAX_COLUMN_WIDTH`].
#[must_use]
pub fn column_widths(rows: &[Vec<String>]) -> Vec<f64> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|column| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(column))
                .map(|cell| display_length(cell))
                .fold(0.0, f64::max);
            (longest + COLUMN_PADDING).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

#[must_use]
pub fn table_sheet_name(page: u32, index: usize) -> String {
    format!("Page_{page}_Table_{index}")
}

fn table_sheet(record: &TableRecord) -> SheetModel {
    SheetModel {
        name: table_sheet_name(record.page, record.index),
        kind: SheetKind::Table,
        column_widths: column_widths(record.table.rows()),
        rows: record.table.clone(),
        header_emphasis: true,
    }
}

fn text_sheet(catalog: &Catalog) -> SheetModel {
    let mut rows = vec![vec!["Page".to_string(), "Content".to_string()]];
    rows.extend(
        catalog
            .text_blocks
            .iter()
            .map(|block| vec![block.page.to_string(), block.content.clone()]),
    );

    SheetModel {
        name: TEXT_SHEET_NAME.to_string(),
        kind: SheetKind::TextContent,
        rows: NormalizedTable::from_clean_rows(rows),
        header_emphasis: true,
        column_widths: TEXT_SHEET_WIDTHS.to_vec(),
    }
}

fn diagnostic_sheet(selection_description: &str) -> SheetModel {
    let lines = [
        "No Extractable Data Found".to_string(),
        format!("Selected pages: {selection_description}"),
        "The PDF appears to be:".to_string(),
        "• Image-based (scanned document)".to_string(),
        "• Password protected".to_string(),
        "• Corrupted or unreadable".to_string(),
        "• Empty or contains no text".to_string(),
        "Recommendations:".to_string(),
        "• Try selecting different pages".to_string(),
        "• Use OCR software to extract text from images".to_string(),
        "• Check if the PDF is password protected".to_string(),
        "• Try PDF to Word conversion to recover the text".to_string(),
        "• Ensure the PDF is not corrupted".to_string(),
    ];

    SheetModel {
        name: DIAGNOSTIC_SHEET_NAME.to_string(),
        kind: SheetKind::Diagnostic,
        rows: NormalizedTable::from_clean_rows(lines.into_iter().map(|line| vec![line]).collect()),
        header_emphasis: true,
        column_widths: vec![DIAGNOSTIC_SHEET_WIDTH],
    }
}

/// Builds the sheets for a finished catalog. Never returns an empty list.
#[must_use]
pub fn assemble(catalog: &Catalog, selection_description: &str) -> Vec<SheetModel> {
    assemble_with(catalog, selection_description, SheetLayout::default())
}

#[must_use]
pub fn assemble_with(
    catalog: &Catalog,
    selection_description: &str,
    layout: SheetLayout,
) -> Vec<SheetModel> {
    if !catalog.tables.is_empty() {
        let mut sheets = catalog.tables.iter().map(table_sheet).collect::<Vec<_>>();
        if layout.keep_text_pages && !catalog.text_blocks.is_empty() {
            sheets.push(text_sheet(catalog));
        }
        return sheets;
    }

    if !catalog.text_blocks.is_empty() {
        return vec![text_sheet(catalog)];
    }

    vec![diagnostic_sheet(selection_description)]
}

/// Cuts cells longer than [`MAX_CELL_CHARS`] so the workbook can still be
/// written, with one warning per affected sheet.
pub fn fit_cells_to_limit(sheets: &mut [SheetModel], warnings: &mut Vec<ExtractWarning>) {
    for sheet in sheets {
        let truncated = sheet.rows.truncate_cells(MAX_CELL_CHARS);
        if truncated == 0 {
            continue;
        }
        warn!(sheet = %sheet.name, truncated, "cells exceed the spreadsheet limit");
        warnings.push(ExtractWarning::new(
            WarningCode::CellTruncated,
            format!(
                "{truncated} cell(s) in sheet '{}' cut to {MAX_CELL_CHARS} characters",
                sheet.name
            ),
        ));
    }
}

/// Sheet names compare case-insensitively, as spreadsheet applications do.
///
/// # Errors
///
/// Returns [`ExtractError::DuplicateSheetName`] for the first repeated name.
pub fn ensure_unique_sheet_names(sheets: &[SheetModel]) -> Result<(), ExtractError> {
    let mut seen = HashSet::new();
    for sheet in sheets {
        if !seen.insert(sheet.name.to_lowercase()) {
            return Err(ExtractError::DuplicateSheetName(sheet.name.clone()));
        }
    }
    Ok(())
}
