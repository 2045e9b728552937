use tracing::{debug, info, warn};

use crate::model::{Catalog, TableRecord};
use crate::options::PageSelection;
use crate::source::PageSource;
use crate::strategy::StrategyAggregator;
use crate::warning::{ExtractWarning, WarningCode};

fn pages_to_visit(
    selection: &PageSelection,
    page_count: u32,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<u32> {
    let Some(pages) = selection.pages() else {
        return (1..=page_count).collect();
    };

    pages
        .into_iter()
        .filter(|&page| {
            if page <= page_count {
                return true;
            }
            warn!(page, page_count, "selected page is not in the document");
            warnings.push(
                ExtractWarning::new(
                    WarningCode::PageOutOfRange,
                    format!("page {page} is beyond the last page ({page_count})"),
                )
                .with_page(page),
            );
            false
        })
        .collect()
}

/// Visits the selected pages in ascending order and collects their tables,
/// or their text when a page has none.
pub fn build_catalog<S: PageSource + ?Sized>(
    selection: &PageSelection,
    source: &S,
    warnings: &mut Vec<ExtractWarning>,
) -> Catalog {
    build_catalog_with(selection, source, &mut StrategyAggregator::new(), warnings)
}

/// Same as [`build_catalog`] with a caller-supplied aggregator, whose dedup
/// index keeps growing across calls.
pub fn build_catalog_with<S: PageSource + ?Sized>(
    selection: &PageSelection,
    source: &S,
    aggregator: &mut StrategyAggregator,
    warnings: &mut Vec<ExtractWarning>,
) -> Catalog {
    let mut catalog = Catalog::default();

    for page in pages_to_visit(selection, source.page_count(), warnings) {
        debug!(page, "processing page");
        let extraction = aggregator.extract_page_tables(source, page, warnings);
        catalog.tables.extend(
            extraction
                .tables
                .into_iter()
                .enumerate()
                .map(|(offset, record)| TableRecord {
                    index: offset + 1,
                    ..record
                }),
        );
        catalog.text_blocks.extend(extraction.text);
    }

    info!(
        tables = catalog.tables.len(),
        text_blocks = catalog.text_blocks.len(),
        "catalog built"
    );
    catalog
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::build_catalog;
    use crate::fake_source::{FakePage, FakeSource, grid};
    use crate::options::PageSelection;
    use crate::warning::WarningCode;

    fn table_page(rows: &[&[&str]]) -> FakePage {
        FakePage {
            lines: vec![grid(rows)],
            ..FakePage::default()
        }
    }

    fn text_page(text: &str) -> FakePage {
        FakePage {
            text: text.to_string(),
            ..FakePage::default()
        }
    }

    #[test]
    fn visits_every_page_in_order() {
        let source = FakeSource::new(vec![
            table_page(&[&["A", "B"], &["1", "2"]]),
            text_page("intro"),
            table_page(&[&["C", "D"], &["3", "4"]]),
        ]);

        let catalog = build_catalog(&PageSelection::All, &source, &mut Vec::new());
        let tables = catalog
            .tables
            .iter()
            .map(|record| (record.page, record.index))
            .collect::<Vec<_>>();
        assert_eq!(tables, vec![(1, 1), (3, 1)]);
        assert_eq!(catalog.text_blocks.len(), 1);
        assert_eq!(catalog.text_blocks[0].page, 2);
    }

    #[test]
    fn visits_only_selected_pages_inside_the_document() {
        let source = FakeSource::new(vec![text_page("one"), text_page("two"), text_page("three")]);
        let selection = PageSelection::Pages(BTreeSet::from([3, 1, 9]));

        let mut warnings = Vec::new();
        let catalog = build_catalog(&selection, &source, &mut warnings);
        let pages = catalog
            .text_blocks
            .iter()
            .map(|block| block.page)
            .collect::<Vec<_>>();
        assert_eq!(pages, vec![1, 3]);
        assert!(
            warnings
                .iter()
                .any(|warning| warning.code == WarningCode::PageOutOfRange
                    && warning.page == Some(9))
        );
    }

    #[test]
    fn repeated_table_on_later_page_is_collapsed() {
        let rows: &[&[&str]] = &[&["Form", "Value"], &["Field", "x"]];
        let source = FakeSource::new(vec![table_page(rows), table_page(rows)]);

        let catalog = build_catalog(&PageSelection::All, &source, &mut Vec::new());
        assert_eq!(catalog.tables.len(), 1);
        assert_eq!(catalog.tables[0].page, 1);
        // The page whose only table was a repeat falls back to its (empty) text.
        assert!(catalog.text_blocks.is_empty());
    }

    #[test]
    fn empty_document_yields_empty_catalog() {
        let catalog = build_catalog(&PageSelection::All, &FakeSource::default(), &mut Vec::new());
        assert!(catalog.is_empty());
    }
}
