use std::{collections::BTreeMap, path::Path, rc::Rc};

use log::info;
use rust_xlsxwriter::{Color, Format, Workbook as XlsxWorkbook, Worksheet as XlsxWorksheet};

use crate::{
    error::{ErrorContext, XlError, XlResult},
    types::{cell::CellValue, color::Rgb},
};

use super::{MemoryBook, MemorySheet, Workbook, Worksheet};

fn fill_format(fill: Rgb) -> Format {
    Format::new().set_background_color(Color::RGB(fill.hex()))
}

fn write_cell(
    worksheet: &mut XlsxWorksheet,
    (row, column): (u32, u16),
    value: &CellValue,
    format: Option<&Format>,
) -> XlResult<()> {
    match (value, format) {
        (CellValue::Empty, Some(format)) => worksheet.write_blank(row, column, format),
        (CellValue::Empty, None) => return Ok(()),
        (CellValue::String(s), Some(format)) => {
            worksheet.write_string_with_format(row, column, s, format)
        }
        (CellValue::String(s), None) => worksheet.write_string(row, column, s),
        (CellValue::Float(f), Some(format)) => {
            worksheet.write_number_with_format(row, column, *f, format)
        }
        (CellValue::Float(f), None) => worksheet.write_number(row, column, *f),
        (CellValue::Int(i), Some(format)) => {
            worksheet.write_number_with_format(row, column, *i as f64, format)
        }
        (CellValue::Int(i), None) => worksheet.write_number(row, column, *i as f64),
        (CellValue::Bool(b), Some(format)) => {
            worksheet.write_boolean_with_format(row, column, *b, format)
        }
        (CellValue::Bool(b), None) => worksheet.write_boolean(row, column, *b),
    }?;
    Ok(())
}

fn export_sheet(workbook: &mut XlsxWorkbook, sheet: &MemorySheet) -> XlResult<usize> {
    let name = sheet.name();
    let worksheet = workbook.add_worksheet().set_name(&name)?;

    let mut cells: BTreeMap<(u32, u32), (CellValue, Option<Rgb>)> = sheet
        .cells()
        .into_iter()
        .map(|(coord, value)| (coord, (value, None)))
        .collect();
    for (coord, fill) in sheet.fills() {
        cells.entry(coord).or_default().1 = Some(fill);
    }

    for (&(row, column), (value, fill)) in &cells {
        // Sheet coordinates are 1-based and bounded by the xlsx limits
        let position = (row - 1, (column - 1) as u16);
        let format = fill.map(fill_format);
        write_cell(worksheet, position, value, format.as_ref())
            .with_context(|| format!("could not write cell ({row}, {column}) of \"{name}\""))?;
    }
    Ok(cells.len())
}

/// Writes `sheets`, values and fills, to a new xlsx file at `path`.
pub fn export_sheets(sheets: &[Rc<MemorySheet>], path: impl AsRef<Path>) -> XlResult<()> {
    let path = path.as_ref();
    let mut workbook = XlsxWorkbook::new();
    let mut exported = 0;
    for sheet in sheets {
        exported += export_sheet(&mut workbook, sheet)?;
    }
    workbook
        .save(path)
        .map_err(XlError::from)
        .with_context(|| format!("could not save {}", path.display()))?;
    info!(
        "exported {} sheet(s), {exported} cell(s) to {}",
        sheets.len(),
        path.display()
    );
    Ok(())
}

/// Writes every sheet of `book` to a new xlsx file at `path`.
pub fn export_book(book: &MemoryBook, path: impl AsRef<Path>) -> XlResult<()> {
    export_sheets(&book.sheets(), path).with_context(|| format!("exporting {}", book.name()))
}
