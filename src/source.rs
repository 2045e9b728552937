use serde::Serialize;

use crate::error::DetectionError;
use crate::model::RawGrid;

/// How cell boundaries along one axis are inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStrategy {
    /// Only hard separators (ruling lines, tabs, wide gaps) split cells.
    Lines,
    /// Word gaps may split cells too.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionParams {
    pub vertical: EdgeStrategy,
    pub horizontal: EdgeStrategy,
    /// Vertical gap, in points, that may separate two rows of one table.
    pub intersection_tolerance: Option<f32>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            vertical: EdgeStrategy::Lines,
            horizontal: EdgeStrategy::Lines,
            intersection_tolerance: None,
        }
    }
}

/// A paginated document that can be probed for tables and text.
///
/// Page numbers are 1-based.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// # Errors
    ///
    /// Any detector failure; callers treat it as "no tables".
    fn extract_tables(
        &self,
        page: u32,
        params: &DetectionParams,
    ) -> Result<Vec<RawGrid>, DetectionError>;

    /// # Errors
    ///
    /// Any text extraction failure; callers treat it as "no text".
    fn extract_text(&self, page: u32) -> Result<String, DetectionError>;
}
