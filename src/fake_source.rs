use crate::error::DetectionError;
use crate::model::RawGrid;
use crate::source::{DetectionParams, EdgeStrategy, PageSource};

pub(crate) fn grid(rows: &[&[&str]]) -> RawGrid {
    rows.iter()
        .map(|row| row.iter().map(|cell| Some((*cell).to_string())).collect())
        .collect()
}

/// `rows` two-column rows; the rows listed in `changed` get a distinct value.
pub(crate) fn numbered_rows(rows: usize, changed: &[usize]) -> RawGrid {
    (0..rows)
        .map(|row| {
            let value = if changed.contains(&row) {
                format!("changed {row}")
            } else {
                format!("value {row}")
            };
            vec![Some(format!("row {row}")), Some(value)]
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    /// Returned for line-based parameter sets.
    pub lines: Vec<RawGrid>,
    /// Returned for text-based parameter sets.
    pub text_grids: Vec<RawGrid>,
    pub fail_text_strategies: bool,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSource {
    pages: Vec<FakePage>,
}

impl FakeSource {
    pub(crate) fn new(pages: Vec<FakePage>) -> Self {
        Self { pages }
    }

    fn page(&self, page: u32) -> Result<&FakePage, DetectionError> {
        let out_of_range = || DetectionError::PageOutOfRange {
            page,
            page_count: self.page_count(),
        };
        let index = usize::try_from(page.checked_sub(1).ok_or_else(out_of_range)?)
            .map_err(|_| out_of_range())?;
        self.pages.get(index).ok_or_else(out_of_range)
    }
}

impl PageSource for FakeSource {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn extract_tables(
        &self,
        page: u32,
        params: &DetectionParams,
    ) -> Result<Vec<RawGrid>, DetectionError> {
        let page = self.page(page)?;
        match params.vertical {
            EdgeStrategy::Lines => Ok(page.lines.clone()),
            EdgeStrategy::Text if page.fail_text_strategies => {
                Err(DetectionError::Extraction("text edges unavailable".to_string()))
            }
            EdgeStrategy::Text => Ok(page.text_grids.clone()),
        }
    }

    fn extract_text(&self, page: u32) -> Result<String, DetectionError> {
        Ok(self.page(page)?.text.clone())
    }
}
