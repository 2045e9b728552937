use crate::model::{NormalizedTable, RawGrid};

/// Trims a cell and collapses every whitespace run to a single space.
#[must_use]
pub fn clean_cell(cell: Option<&str>) -> String {
    cell.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Cleans every cell of `grid` and drops the rows left without content.
///
/// Rows keep their original order and length; no padding or truncation
/// happens here.
#[must_use]
pub fn normalize(grid: &RawGrid) -> NormalizedTable {
    let rows = grid
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| clean_cell(cell.as_deref()))
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    NormalizedTable::from_clean_rows(rows)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{clean_cell, normalize};
    use crate::model::RawGrid;

    fn grid(rows: &[&[Option<&str>]]) -> RawGrid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.map(str::to_string)).collect())
            .collect()
    }

    #[test]
    fn collapses_inner_whitespace() {
        assert_eq!(clean_cell(Some("  Total \n  due\t now ")), "Total due now");
        assert_eq!(clean_cell(None), "");
    }

    #[test]
    fn drops_rows_without_content() {
        let raw = grid(&[
            &[Some("Name"), Some("Age")],
            &[None, Some("   ")],
            &[],
            &[Some(" Bob "), None],
        ]);

        let table = normalize(&raw);
        assert_eq!(
            table.rows(),
            &[
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Bob".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn keeps_ragged_rows_as_is() {
        let raw = grid(&[&[Some("a"), Some("b"), Some("c")], &[Some("d")]]);
        let table = normalize(&raw);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.rows()[1], vec!["d".to_string()]);
    }

    #[test]
    fn empty_grid_yields_empty_table() {
        assert!(normalize(&Vec::new()).is_empty());
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let raw = grid(&[
            &[Some(" x  y "), None],
            &[Some("\t"), Some("")],
            &[Some("1"), Some(" 2\n3 ")],
        ]);
        let once = normalize(&raw);
        let again = normalize(
            &once
                .rows()
                .iter()
                .map(|row| row.iter().cloned().map(Some).collect())
                .collect(),
        );
        assert_eq!(once, again);
    }
}
