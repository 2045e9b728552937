use crate::model::RawGrid;
use crate::source::{DetectionParams, EdgeStrategy};
use crate::table_parse::{has_digit, looks_like_sentence, split_hard_cells, split_soft_cells};

const MIN_COLS: usize = 2;
const MIN_ROWS: usize = 2;
const MAX_SOFT_CELLS: usize = 6;
/// Vertical space, in points, one blank text line stands for.
const BLANK_LINE_HEIGHT: f32 = 10.0;

fn line_cells(line: &str, vertical: EdgeStrategy) -> Vec<String> {
    let cells = split_hard_cells(line);
    if cells.len() >= MIN_COLS || vertical == EdgeStrategy::Lines {
        return cells;
    }

    let soft_cells = split_soft_cells(line);
    if soft_cells.len() >= MIN_COLS
        && !looks_like_sentence(line)
        && (has_digit(&soft_cells) || soft_cells.len() <= MAX_SOFT_CELLS)
    {
        soft_cells
    } else {
        cells
    }
}

fn flush_block(block: &mut Vec<Vec<String>>, grids: &mut Vec<RawGrid>) {
    if block.len() < MIN_ROWS {
        block.clear();
        return;
    }

    grids.push(
        std::mem::take(block)
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect(),
    );
}

/// Finds runs of consecutive multi-cell lines in a page's text.
///
/// `vertical` picks how a line splits into cells, `horizontal` whether a
/// change in cell count ends the table, and the intersection tolerance how
/// many blank lines may sit inside a table.
pub(crate) fn detect_grids(text: &str, params: &DetectionParams) -> Vec<RawGrid> {
    let tolerance = params.intersection_tolerance.unwrap_or(0.0);

    let mut grids = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();
    let mut blank_run = 0_u16;

    for line in text.lines() {
        if line.trim().is_empty() {
            if block.is_empty() {
                continue;
            }
            blank_run = blank_run.saturating_add(1);
            if f32::from(blank_run) * BLANK_LINE_HEIGHT > tolerance {
                flush_block(&mut block, &mut grids);
                blank_run = 0;
            }
            continue;
        }
        blank_run = 0;

        let cells = line_cells(line, params.vertical);
        if cells.len() < MIN_COLS {
            flush_block(&mut block, &mut grids);
            continue;
        }

        if params.horizontal == EdgeStrategy::Lines
            && block.first().is_some_and(|first| first.len() != cells.len())
        {
            flush_block(&mut block, &mut grids);
        }
        block.push(cells);
    }

    flush_block(&mut block, &mut grids);
    grids
}
