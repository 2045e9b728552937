use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("duplicate sheet name '{0}'")]
    DuplicateSheetName(String),

    #[error("sheet '{sheet}' exceeds the worksheet size limits")]
    SheetTooLarge { sheet: String },
}

/// Failure of a single detector call. Never escapes the strategy aggregator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("page {page} is outside the document (1..={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("{0}")]
    Extraction(String),
}
