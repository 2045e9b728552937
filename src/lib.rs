mod catalog;
mod csv_out;
mod error;
mod model;
mod normalize;
mod options;
mod pdf_reader;
mod sheet;
mod source;
mod strategy;
mod table_detect;
mod table_parse;
mod warning;
mod xlsx_out;

#[cfg(test)]
mod fake_source;

use std::path::Path;

use serde::Serialize;
use tracing::info;

pub use catalog::{build_catalog, build_catalog_with};
pub use csv_out::{write_csv_dir, write_sheet_csv_to_string};
pub use error::{DetectionError, ExtractError};
pub use model::{
    Catalog, NormalizedTable, PageTextBlock, RawGrid, SheetKind, SheetModel, TableRecord,
};
pub use normalize::{clean_cell, normalize};
pub use options::{
    ConvertOptions, MAX_PERMISSIVE_PAGE, OutputFormat, PageSelection, ParsedSelection,
    SelectionPolicy, SkippedToken,
};
pub use pdf_reader::PdfPageSource;
pub use sheet::{
    DIAGNOSTIC_SHEET_NAME, MAX_CELL_CHARS, MAX_COLUMN_WIDTH, MIN_COLUMN_WIDTH, SheetLayout,
    TEXT_SHEET_NAME, assemble, assemble_with, column_widths, display_length,
    ensure_unique_sheet_names, fit_cells_to_limit, table_sheet_name,
};
pub use source::{DetectionParams, EdgeStrategy, PageSource};
pub use strategy::{
    DEDUP_THRESHOLD, DedupIndex, DetectionStrategy, PageExtraction, StrategyAggregator,
    row_similarity,
};
pub use warning::{ExtractWarning, WarningCode};
pub use xlsx_out::{write_xlsx, write_xlsx_to_buffer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub kind: SheetKind,
    pub rows: usize,
    pub columns: usize,
}

impl From<&SheetModel> for SheetSummary {
    fn from(sheet: &SheetModel) -> Self {
        Self {
            name: sheet.name.clone(),
            kind: sheet.kind,
            rows: sheet.rows.row_count(),
            columns: sheet.column_widths.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub page_count: u32,
    /// Resolved page selection, `all` when unfiltered.
    pub selection: String,
    pub table_count: usize,
    pub text_block_count: usize,
    pub sheets: Vec<SheetSummary>,
    pub warnings: Vec<ExtractWarning>,
}

impl ConversionReport {
    #[must_use]
    pub fn has_tables(&self) -> bool {
        self.table_count > 0
    }

    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_json(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub catalog: Catalog,
    pub sheets: Vec<SheetModel>,
    pub report: ConversionReport,
}

/// Runs page selection, detection, dedup and sheet assembly over `source`.
///
/// # Errors
///
/// Invalid options, or a page selection rejected under
/// [`ConvertOptions::strict_pages`]; the latter before any page is read.
pub fn extract_sheets<S: PageSource + ?Sized>(
    source: &S,
    options: &ConvertOptions,
) -> Result<Extraction, ExtractError> {
    options.validate()?;

    let page_count = source.page_count();
    let policy = if options.strict_pages {
        SelectionPolicy::Strict {
            total_pages: page_count,
        }
    } else {
        SelectionPolicy::Permissive
    };
    let parsed = PageSelection::parse(options.page_spec(), policy)?;

    let mut warnings = parsed
        .skipped
        .iter()
        .map(|skipped| ExtractWarning::new(WarningCode::SkippedPageToken, skipped.reason.clone()))
        .collect::<Vec<_>>();

    let catalog = build_catalog(&parsed.selection, source, &mut warnings);
    if catalog.tables.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no tables were detected in the selected pages",
        ));
    }

    let mut sheets = assemble_with(
        &catalog,
        options.page_spec(),
        SheetLayout {
            keep_text_pages: options.keep_text_pages,
        },
    );
    fit_cells_to_limit(&mut sheets, &mut warnings);

    let report = ConversionReport {
        page_count,
        selection: parsed.selection.to_string(),
        table_count: catalog.tables.len(),
        text_block_count: catalog.text_blocks.len(),
        sheets: sheets.iter().map(SheetSummary::from).collect(),
        warnings,
    };
    info!(
        tables = report.table_count,
        sheets = report.sheets.len(),
        "extraction finished"
    );

    Ok(Extraction {
        catalog,
        sheets,
        report,
    })
}

/// Converts `input_pdf` into an `.xlsx` workbook, or into a directory of CSV
/// files when [`ConvertOptions::format`] is [`OutputFormat::Csv`].
///
/// # Errors
///
/// Load, option, strict page selection and write failures. A failed write
/// may leave a partial output behind.
pub fn convert_pdf_to_workbook(
    input_pdf: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, ExtractError> {
    let source = PdfPageSource::open(input_pdf)?;
    let extraction = extract_sheets(&source, options)?;

    match options.format {
        OutputFormat::Xlsx => write_xlsx(output, &extraction.sheets)?,
        OutputFormat::Csv => {
            write_csv_dir(output, &extraction.sheets, options.delimiter_byte())?;
        }
    }

    Ok(extraction.report)
}

/// In-memory variant of [`convert_pdf_to_workbook`] that always yields xlsx.
///
/// # Errors
///
/// Same as [`convert_pdf_to_workbook`].
pub fn convert_pdf_bytes_to_xlsx(
    input_pdf: &[u8],
    options: &ConvertOptions,
) -> Result<(Vec<u8>, ConversionReport), ExtractError> {
    let source = PdfPageSource::from_bytes(input_pdf)?;
    let extraction = extract_sheets(&source, options)?;
    let workbook = write_xlsx_to_buffer(&extraction.sheets)?;
    Ok((workbook, extraction.report))
}

/// # Errors
///
/// Fails when the file cannot be loaded as a PDF.
pub fn count_pdf_pages(input_pdf: &Path) -> Result<u32, ExtractError> {
    Ok(PdfPageSource::open(input_pdf)?.page_count())
}

/// Resolves `spec` against the document's page count, rejecting any token
/// outside it.
///
/// # Errors
///
/// Load failures and [`ExtractError::InvalidPageSelection`].
pub fn validate_page_selection(input_pdf: &Path, spec: &str) -> Result<PageSelection, ExtractError> {
    let total_pages = count_pdf_pages(input_pdf)?;
    Ok(PageSelection::parse(spec, SelectionPolicy::Strict { total_pages })?.selection)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{
        ConvertOptions, MAX_CELL_CHARS, SheetKind, WarningCode, extract_sheets,
        write_xlsx_to_buffer,
    };
    use crate::error::ExtractError;
    use crate::fake_source::{FakePage, FakeSource, grid};

    fn two_page_source() -> FakeSource {
        let table = grid(&[&["Name", "Age"], &["Alice", "30"]]);
        FakeSource::new(vec![
            FakePage {
                lines: vec![table.clone()],
                text_grids: vec![table],
                ..FakePage::default()
            },
            FakePage {
                text: "Closing remarks".to_string(),
                ..FakePage::default()
            },
        ])
    }

    #[test]
    fn strict_selection_fails_before_any_page_is_read() {
        let options = ConvertOptions {
            pages: Some("1,5".to_string()),
            strict_pages: true,
            ..ConvertOptions::default()
        };
        let err = extract_sheets(&two_page_source(), &options).expect_err("page 5 is invalid");
        assert!(matches!(err, ExtractError::InvalidPageSelection(_)));
    }

    #[test]
    fn permissive_selection_reports_skipped_tokens() {
        let options = ConvertOptions {
            pages: Some("x,2".to_string()),
            ..ConvertOptions::default()
        };
        let extraction = extract_sheets(&two_page_source(), &options).expect("extraction runs");
        assert_eq!(extraction.report.selection, "2");
        assert_eq!(extraction.report.warnings[0].code, WarningCode::SkippedPageToken);
        assert_eq!(extraction.sheets[0].kind, SheetKind::TextContent);
    }

    #[test]
    fn oversized_page_text_is_cut_and_still_written() {
        let source = FakeSource::new(vec![FakePage {
            text: "x".repeat(MAX_CELL_CHARS * 2),
            ..FakePage::default()
        }]);
        let extraction =
            extract_sheets(&source, &ConvertOptions::default()).expect("extraction runs");

        assert_eq!(extraction.sheets[0].rows.rows()[1][1].len(), MAX_CELL_CHARS);
        assert!(
            extraction
                .report
                .warnings
                .iter()
                .any(|warning| warning.code == WarningCode::CellTruncated)
        );
        assert!(write_xlsx_to_buffer(&extraction.sheets).is_ok());
    }

    #[test]
    fn report_summarizes_sheets() {
        let extraction =
            extract_sheets(&two_page_source(), &ConvertOptions::default()).expect("extraction runs");
        let report = &extraction.report;
        assert_eq!(report.page_count, 2);
        assert_eq!(report.table_count, 1);
        assert_eq!(report.text_block_count, 1);
        assert_eq!(report.sheets.len(), 1);
        assert_eq!(report.sheets[0].name, "Page_1_Table_1");
        assert_eq!(report.sheets[0].columns, 2);

        let json = report.to_json().expect("report serializes");
        assert!(json.contains("\"kind\": \"table\""), "{json}");
    }
}
