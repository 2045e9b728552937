use serde::Serialize;

/// One detector result: ragged rows of optional cell text.
pub type RawGrid = Vec<Vec<Option<String>>>;

/// Cleaned grid of cell strings. Every row holds at least one non-empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedTable {
    rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    /// Callers must already have dropped blank rows; see [`crate::normalize`].
    pub(crate) fn from_clean_rows(rows: Vec<Vec<String>>) -> Self {
        debug_assert!(
            rows.iter().all(|row| row.iter().any(|cell| !cell.is_empty())),
            "normalized tables cannot hold blank rows"
        );
        Self { rows }
    }

    /// Cuts every cell to at most `max_chars` characters and returns how
    /// many cells were cut.
    pub(crate) fn truncate_cells(&mut self, max_chars: usize) -> usize {
        let mut truncated = 0;
        for cell in self.rows.iter_mut().flatten() {
            if let Some((end, _)) = cell.char_indices().nth(max_chars) {
                cell.truncate(end);
                truncated += 1;
            }
        }
        truncated
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the first row. Later rows may be shorter or longer.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    pub page: u32,
    /// 1-based position among the tables accepted on `page`.
    pub index: usize,
    pub table: NormalizedTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageTextBlock {
    pub page: u32,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub tables: Vec<TableRecord>,
    pub text_blocks: Vec<PageTextBlock>,
}

impl Catalog {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.text_blocks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Table,
    TextContent,
    Diagnostic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetModel {
    pub name: String,
    pub kind: SheetKind,
    pub rows: NormalizedTable,
    /// Emphasize the first row only.
    pub header_emphasis: bool,
    pub column_widths: Vec<f64>,
}

impl SheetModel {
    /// Only extracted tables are framed with cell borders.
    #[must_use]
    pub fn bordered(&self) -> bool {
        self.kind == SheetKind::Table
    }
}
