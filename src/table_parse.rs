fn push_cell(cells: &mut Vec<String>, current: &mut String) {
    let cell = current.trim();
    if !cell.is_empty() {
        cells.push(cell.to_string());
    }
    current.clear();
}

/// Splits on tabs and on runs of two or more spaces.
pub(crate) fn split_hard_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut pending_spaces = 0_usize;

    for ch in line.trim().chars() {
        if ch == '\t' {
            push_cell(&mut cells, &mut current);
            pending_spaces = 0;
            continue;
        }
        if ch.is_whitespace() {
            pending_spaces += 1;
            continue;
        }

        match pending_spaces {
            0 => {}
            1 => current.push(' '),
            _ => push_cell(&mut cells, &mut current),
        }
        pending_spaces = 0;
        current.push(ch);
    }

    push_cell(&mut cells, &mut current);
    cells
}

/// Splits on every whitespace run.
pub(crate) fn split_soft_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

pub(crate) fn looks_like_sentence(line: &str) -> bool {
    line.trim_end().ends_with(['.', '!', '?'])
}

pub(crate) fn has_digit(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::{has_digit, looks_like_sentence, split_hard_cells, split_soft_cells};

    #[test]
    fn splits_on_wide_gaps_only() {
        assert_eq!(split_hard_cells("Alice Smith   30  98"), vec!["Alice Smith", "30", "98"]);
    }

    #[test]
    fn splits_on_tabs() {
        assert_eq!(split_hard_cells("A\tB \tC"), vec!["A", "B", "C"]);
    }

    #[test]
    fn blank_line_has_no_cells() {
        assert!(split_hard_cells("   ").is_empty());
    }

    #[test]
    fn soft_split_uses_every_gap() {
        assert_eq!(split_soft_cells("Name Age  Score"), vec!["Name", "Age", "Score"]);
    }

    #[test]
    fn recognizes_sentences_and_digits() {
        assert!(looks_like_sentence("This is prose. "));
        assert!(!looks_like_sentence("Total 12"));
        assert!(has_digit(&["a1".to_string()]));
        assert!(!has_digit(&["abc".to_string()]));
    }
}
