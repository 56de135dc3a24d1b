#![allow(dead_code)]

use std::{path::Path, rc::Rc};

use anyhow::{Context, Result};
use xlmigrate::{CellValue, Instruction, MemoryBook, MemoryHost, MemorySheet, MigrationPayload};

/// Builds rows of string cells, an empty string standing for an empty cell.
pub fn text_rows(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|row| row.iter().map(|value| CellValue::from(*value)).collect())
        .collect()
}

/// Adds a sheet holding `rows` from `A1` to the workbook `book` of `host`, creating the
/// workbook when needed.
pub fn add_sheet(host: &MemoryHost, book: &str, sheet: &str, rows: &[&[&str]]) -> Rc<MemorySheet> {
    let book = match host.book(&book.into()) {
        Ok(book) => book,
        Err(_) => host.add_book(MemoryBook::new(book)),
    };
    book.add_sheet(MemorySheet::from_rows(sheet, text_rows(rows)))
}

pub fn sheet(host: &MemoryHost, book: &str, sheet: &str) -> Result<Rc<MemorySheet>> {
    host.book(&book.into())
        .and_then(|book| book.sheet(&sheet.into()))
        .with_context(|| format!("could not find {book}/{sheet}"))
}

pub fn payload(overwriting: bool, target: Instruction, sources: Vec<Instruction>) -> MigrationPayload {
    MigrationPayload {
        overwriting,
        target,
        sources,
    }
}

/// Writes `sheets` to an xlsx workbook at `path`.
pub fn write_workbook(path: &Path, sheets: &[(&str, &[&[&str]])]) -> Result<()> {
    let sheets = sheets
        .iter()
        .map(|(name, rows)| Rc::new(MemorySheet::from_rows(*name, text_rows(rows))))
        .collect::<Vec<_>>();
    xlmigrate::export_sheets(&sheets, path).context("could not write fixture workbook")
}
