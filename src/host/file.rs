use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, info};
use serde_json::Value;

use crate::{
    error::{ErrorContext, XlError, XlErrorKind, XlResult},
    types::{
        cell::{CellValue, excel_float_to_string},
        idx_or_name::IdxOrName,
    },
};

use super::{Host, MemoryBook, MemoryHost, MemorySheet, Workbook};

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => CellValue::String(dt.to_string()),
            None => CellValue::String(excel_float_to_string(dt.as_f64())),
        },
        Data::Error(err) => CellValue::String(err.to_string()),
    }
}

/// Loads every sheet of the workbook at `path` into memory.
///
/// The workbook is named after its file name.
pub fn load_workbook(path: impl AsRef<Path>) -> XlResult<MemoryBook> {
    let path = path.as_ref();
    let mut sheets = open_workbook_auto(path)
        .map_err(|err| XlError::from(XlErrorKind::CalamineError(err)))
        .with_context(|| format!("could not open workbook at {}", path.display()))?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let book = MemoryBook::new(name);

    for sheet_name in sheets.sheet_names() {
        let range = sheets
            .worksheet_range(&sheet_name)
            .map_err(|err| XlError::from(XlErrorKind::CalamineError(err)))
            .with_context(|| format!("error while loading sheet {sheet_name}"))?;

        let sheet = MemorySheet::new(sheet_name.as_str());
        // `used_cells` positions are relative to the range start, both 0-based
        if let Some((start_row, start_column)) = range.start() {
            for (row, column, data) in range.used_cells() {
                // Calamine ranges never exceed the sheet limits
                sheet.set(
                    start_row + row as u32 + 1,
                    start_column + column as u32 + 1,
                    cell_value(data),
                );
            }
        }
        debug!(
            "loaded sheet \"{sheet_name}\" of {} ({} cells)",
            path.display(),
            sheet.cells().len()
        );
        book.add_sheet(sheet);
    }

    Ok(book)
}

/// A host serving the workbooks of a directory.
///
/// Workbooks are loaded on first access by file name and kept in memory afterwards, so that
/// edits made during a run stay visible until they are exported. Macros have no host to run
/// on: they are logged and return `Null`.
pub struct FileHost {
    dir: PathBuf,
    books: MemoryHost,
}

impl FileHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            books: MemoryHost::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The in-memory copy of a workbook, loading it when needed.
    pub fn book(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<MemoryBook>> {
        if let IdxOrName::Name(name) = idx_or_name {
            if !self.books.has_book(name) {
                let path = self.dir.join(name);
                if !path.is_file() {
                    return Err(XlError::from(XlErrorKind::BookNotFound(idx_or_name.clone()))
                        .with_context(|| format!("no such file: {}", path.display())));
                }
                info!("loading workbook {}", path.display());
                self.books.add_book(load_workbook(&path)?);
            }
        }
        self.books.book(idx_or_name)
    }
}

impl Host for FileHost {
    fn connect(&self) -> XlResult<()> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(XlErrorKind::HostConnectionFailure(format!(
                "{} is not a directory",
                self.dir.display()
            ))
            .into())
        }
    }

    fn disconnect(&self) {}

    fn workbook(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<dyn Workbook>> {
        self.book(idx_or_name)
            .map(|book| -> Rc<dyn Workbook> { book })
    }

    fn run_macro(&self, name: &str, args: &[Value]) -> XlResult<Value> {
        let args = args
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!("macro {name}({args})");
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Data::Empty, CellValue::Empty)]
    #[case(Data::String("a".to_string()), CellValue::from("a"))]
    #[case(Data::Float(13.37), CellValue::Float(13.37))]
    #[case(Data::Int(42), CellValue::Int(42))]
    #[case(Data::Bool(false), CellValue::Bool(false))]
    #[case(Data::Error(CellErrorType::NA), CellValue::from("#N/A"))]
    fn converts_calamine_data(#[case] data: Data, #[case] expected: CellValue) {
        assert_eq!(cell_value(&data), expected);
    }

    #[test]
    fn missing_directory_refuses_connections() {
        let host = FileHost::new("/this/directory/does/not/exist");
        let err = host.connect().unwrap_err();
        assert!(matches!(err.kind, XlErrorKind::HostConnectionFailure(_)));
    }

    #[test]
    fn missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let host = FileHost::new(dir.path());
        host.connect().unwrap();
        let err = host.workbook(&"missing.xlsx".into()).err().unwrap();
        assert!(matches!(err.kind, XlErrorKind::BookNotFound(_)));
    }
}
