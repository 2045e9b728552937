use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{NormalizedTable, PageTextBlock, TableRecord};
use crate::normalize::normalize;
use crate::source::{DetectionParams, EdgeStrategy, PageSource};
use crate::warning::{ExtractWarning, WarningCode};

/// Share of position-wise equal rows at which two tables count as one.
pub const DEDUP_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// Detector defaults.
    Default,
    /// Text edges with a loose intersection tolerance.
    TextTolerant,
    /// Ruled tables only.
    Lines,
    /// Text edges, default tolerance.
    Text,
}

impl DetectionStrategy {
    /// Order in which strategies run on every page.
    pub const ORDERED: [Self; 4] = [Self::Default, Self::TextTolerant, Self::Lines, Self::Text];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::TextTolerant => "text_tolerant",
            Self::Lines => "lines",
            Self::Text => "text",
        }
    }

    #[must_use]
    pub fn params(self) -> DetectionParams {
        match self {
            Self::Default => DetectionParams::default(),
            Self::TextTolerant => DetectionParams {
                vertical: EdgeStrategy::Text,
                horizontal: EdgeStrategy::Text,
                intersection_tolerance: Some(10.0),
            },
            Self::Lines => DetectionParams {
                vertical: EdgeStrategy::Lines,
                horizontal: EdgeStrategy::Lines,
                intersection_tolerance: None,
            },
            Self::Text => DetectionParams {
                vertical: EdgeStrategy::Text,
                horizontal: EdgeStrategy::Text,
                intersection_tolerance: None,
            },
        }
    }
}

/// Share of rows of `candidate` equal to the row at the same position in
/// `existing`. Tables of different height never match.
#[must_use]
pub fn row_similarity(candidate: &NormalizedTable, existing: &NormalizedTable) -> f64 {
    let rows = candidate.row_count();
    if rows == 0 || rows != existing.row_count() {
        return 0.0;
    }

    let matching = candidate
        .rows()
        .iter()
        .zip(existing.rows())
        .filter(|(left, right)| left == right)
        .count();
    matching as f64 / rows as f64
}

/// Tables accepted so far in the run, across every page.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    accepted: Vec<NormalizedTable>,
}

impl DedupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn best_similarity(&self, candidate: &NormalizedTable) -> f64 {
        self.accepted
            .iter()
            .map(|existing| row_similarity(candidate, existing))
            .fold(0.0, f64::max)
    }

    #[must_use]
    pub fn is_duplicate(&self, candidate: &NormalizedTable) -> bool {
        self.best_similarity(candidate) >= DEDUP_THRESHOLD
    }

    /// Records `candidate` unless it duplicates an accepted table.
    /// Returns whether it was accepted.
    pub fn admit(&mut self, candidate: &NormalizedTable) -> bool {
        if self.is_duplicate(candidate) {
            return false;
        }
        self.accepted.push(candidate.clone());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtraction {
    pub tables: Vec<TableRecord>,
    pub text: Option<PageTextBlock>,
}

/// Runs every strategy on a page and keeps the tables not seen before.
///
/// The dedup index lives as long as the aggregator, so a single aggregator
/// must be reused for every page of one run.
#[derive(Debug, Clone)]
pub struct StrategyAggregator {
    strategies: Vec<DetectionStrategy>,
    dedup: DedupIndex,
}

impl Default for StrategyAggregator {
    fn default() -> Self {
        Self::with_strategies(DetectionStrategy::ORDERED)
    }
}

impl StrategyAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strategies(strategies: impl IntoIterator<Item = DetectionStrategy>) -> Self {
        Self {
            strategies: strategies.into_iter().collect(),
            dedup: DedupIndex::new(),
        }
    }

    #[must_use]
    pub fn dedup(&self) -> &DedupIndex {
        &self.dedup
    }

    pub fn extract_page_tables<S: PageSource + ?Sized>(
        &mut self,
        source: &S,
        page: u32,
        warnings: &mut Vec<ExtractWarning>,
    ) -> PageExtraction {
        let mut tables = Vec::new();

        for strategy in &self.strategies {
            let grids = match source.extract_tables(page, &strategy.params()) {
                Ok(grids) => grids,
                Err(error) => {
                    warn!(page, strategy = strategy.name(), %error, "table detection failed");
                    warnings.push(
                        ExtractWarning::new(
                            WarningCode::StrategyFailed,
                            format!("table detection failed: {error}"),
                        )
                        .with_page(page)
                        .with_strategy(strategy.name()),
                    );
                    continue;
                }
            };
            debug!(page, strategy = strategy.name(), found = grids.len(), "strategy finished");

            for grid in &grids {
                let table = normalize(grid);
                if table.is_empty() {
                    continue;
                }
                if !self.dedup.admit(&table) {
                    debug!(page, strategy = strategy.name(), "dropping duplicate table");
                    continue;
                }
                tables.push(TableRecord {
                    page,
                    index: tables.len() + 1,
                    table,
                });
            }
        }

        if !tables.is_empty() {
            return PageExtraction { tables, text: None };
        }

        let text = match source.extract_text(page) {
            Ok(text) => text,
            Err(error) => {
                warn!(page, %error, "text extraction failed");
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::TextExtractionFailed,
                        format!("text extraction failed: {error}"),
                    )
                    .with_page(page),
                );
                String::new()
            }
        };

        let content = text.trim();
        if content.is_empty() {
            return PageExtraction::default();
        }

        warnings.push(
            ExtractWarning::new(
                WarningCode::TextFallback,
                "no tables detected; keeping the page text instead",
            )
            .with_page(page),
        );
        PageExtraction {
            tables,
            text: Some(PageTextBlock {
                page,
                content: content.to_string(),
            }),
        }
    }
}
