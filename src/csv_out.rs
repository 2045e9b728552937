use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::SheetModel;
use crate::sheet::ensure_unique_sheet_names;

fn write_rows<W: Write>(writer: &mut Writer<W>, sheet: &SheetModel) -> Result<(), ExtractError> {
    let width = sheet.rows.rows().iter().map(Vec::len).max().unwrap_or(0);
    for row in sheet.rows.rows() {
        let mut padded = row.clone();
        padded.resize(width, String::new());
        writer.write_record(&padded)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `<dir>/<sheet name>.csv` for every sheet and returns the paths.
///
/// # Errors
///
/// Fails on duplicate sheet names, before anything is written, or on I/O
/// errors.
pub fn write_csv_dir(
    dir: &Path,
    sheets: &[SheetModel],
    delimiter: u8,
) -> Result<Vec<PathBuf>, ExtractError> {
    ensure_unique_sheet_names(sheets)?;
    std::fs::create_dir_all(dir)?;

    sheets
        .iter()
        .map(|sheet| {
            let path = dir.join(format!("{}.csv", sheet.name));
            let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(&path)?;
            write_rows(&mut writer, sheet)?;
            Ok(path)
        })
        .collect()
}

/// # Errors
///
/// Fails when the CSV writer fails.
pub fn write_sheet_csv_to_string(sheet: &SheetModel, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    write_rows(&mut writer, sheet)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Io(error.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
