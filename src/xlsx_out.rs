use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::error::ExtractError;
use crate::model::{SheetKind, SheetModel};
use crate::sheet::ensure_unique_sheet_names;

fn framed(format: Format, sheet: &SheetModel) -> Format {
    if sheet.bordered() {
        format.set_border(FormatBorder::Thin)
    } else {
        format
    }
}

fn header_format(sheet: &SheetModel) -> Format {
    let format = match sheet.kind {
        SheetKind::Diagnostic => Format::new()
            .set_bold()
            .set_font_size(14)
            .set_font_color(Color::Red),
        SheetKind::Table | SheetKind::TextContent => Format::new()
            .set_bold()
            .set_font_size(12)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter),
    };
    framed(format, sheet)
}

fn body_format(sheet: &SheetModel) -> Format {
    let format = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top);
    let format = if sheet.kind == SheetKind::TextContent {
        format.set_text_wrap()
    } else {
        format
    };
    framed(format, sheet)
}

/// The page column of the text sheet is written as numbers.
fn numeric_cell(sheet: &SheetModel, row: usize, column: usize, value: &str) -> Option<f64> {
    if sheet.kind != SheetKind::TextContent || row == 0 || column != 0 {
        return None;
    }
    value.parse::<u32>().ok().map(f64::from)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetModel) -> Result<(), ExtractError> {
    let too_large = || ExtractError::SheetTooLarge {
        sheet: sheet.name.clone(),
    };

    worksheet.set_name(&sheet.name)?;
    let header = header_format(sheet);
    let body = body_format(sheet);
    let framed_width = sheet.rows.column_count();

    for (row_index, row) in sheet.rows.rows().iter().enumerate() {
        let row_num = u32::try_from(row_index).map_err(|_| too_large())?;
        let format = if row_index == 0 && sheet.header_emphasis {
            &header
        } else {
            &body
        };
        // Short rows still get framed cells up to the header width.
        let width = if sheet.bordered() {
            row.len().max(framed_width)
        } else {
            row.len()
        };

        for column in 0..width {
            let col_num = u16::try_from(column).map_err(|_| too_large())?;
            match row.get(column) {
                Some(value) => match numeric_cell(sheet, row_index, column, value) {
                    Some(number) => {
                        worksheet.write_number_with_format(row_num, col_num, number, format)?;
                    }
                    None => {
                        worksheet.write_string_with_format(row_num, col_num, value, format)?;
                    }
                },
                None => {
                    worksheet.write_blank(row_num, col_num, format)?;
                }
            }
        }
    }

    for (column, width) in sheet.column_widths.iter().enumerate() {
        let col_num = u16::try_from(column).map_err(|_| too_large())?;
        worksheet.set_column_width(col_num, *width)?;
    }
    Ok(())
}

fn build_workbook(sheets: &[SheetModel]) -> Result<Workbook, ExtractError> {
    ensure_unique_sheet_names(sheets)?;

    let mut workbook = Workbook::new();
    for sheet in sheets {
        write_sheet(workbook.add_worksheet(), sheet)?;
    }
    Ok(workbook)
}

/// Saves one worksheet per sheet model.
///
/// # Errors
///
/// Fails on duplicate sheet names, before anything is written, or when
/// the workbook cannot be saved.
pub fn write_xlsx(path: &Path, sheets: &[SheetModel]) -> Result<(), ExtractError> {
    build_workbook(sheets)?.save(path)?;
    Ok(())
}

/// # Errors
///
/// Same as [`write_xlsx`].
pub fn write_xlsx_to_buffer(sheets: &[SheetModel]) -> Result<Vec<u8>, ExtractError> {
    Ok(build_workbook(sheets)?.save_to_buffer()?)
}
