use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use log::{debug, info};
use serde_json::Value;

use crate::{
    error::{ErrorContext, XlError, XlErrorKind, XlResult},
    types::{
        address::Address,
        cell::{CellValue, RangeValue},
        color::Rgb,
        idx_or_name::IdxOrName,
    },
};

use super::{Host, Workbook, Worksheet};

/// A sparse worksheet held in memory. Empty cells are not stored.
#[derive(Debug, Default)]
pub struct MemorySheet {
    name: String,
    values: RefCell<BTreeMap<(u32, u32), CellValue>>,
    fills: RefCell<BTreeMap<(u32, u32), Rgb>>,
}

/// Every `(row, column)` of a fully bounded area, row by row.
fn area_cells(area: &Address) -> impl Iterator<Item = (u32, u32)> {
    let (top, left) = (area.row(), area.column());
    let (bottom, right) = (area.last_row(), area.last_column());
    (top..=bottom).flat_map(move |row| (left..=right).map(move |column| (row, column)))
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A sheet whose top-left value lands on `A1`.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let sheet = Self::new(name);
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, value) in row.into_iter().enumerate() {
                // Fixtures never come close to the sheet limits
                sheet.set(row_idx as u32 + 1, col_idx as u32 + 1, value);
            }
        }
        sheet
    }

    pub fn set(&self, row: u32, column: u32, value: impl Into<CellValue>) {
        let value = value.into();
        let mut values = self.values.borrow_mut();
        if value.is_empty() {
            values.remove(&(row, column));
        } else {
            values.insert((row, column), value);
        }
    }

    pub fn get(&self, row: u32, column: u32) -> CellValue {
        self.values
            .borrow()
            .get(&(row, column))
            .cloned()
            .unwrap_or_default()
    }

    /// Non-empty cells, row by row.
    pub fn cells(&self) -> Vec<((u32, u32), CellValue)> {
        self.values
            .borrow()
            .iter()
            .map(|(coord, value)| (*coord, value.clone()))
            .collect()
    }

    /// Filled cells, row by row.
    pub fn fills(&self) -> Vec<((u32, u32), Rgb)> {
        self.fills
            .borrow()
            .iter()
            .map(|(coord, fill)| (*coord, *fill))
            .collect()
    }
}

impl Worksheet for MemorySheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read(&self, area: &Address) -> Vec<Vec<CellValue>> {
        let values = self.values.borrow();
        (area.row()..=area.last_row())
            .map(|row| {
                (area.column()..=area.last_column())
                    .map(|column| values.get(&(row, column)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// A scalar (or a one-cell matrix) is broadcast to the whole area. A larger matrix is
    /// written from the top-left corner and clipped to the area.
    fn write(&self, area: &Address, value: &RangeValue) {
        let broadcast = match value {
            RangeValue::Scalar(value) => Some(value),
            RangeValue::Matrix(rows) => match rows.as_slice() {
                [row] if row.len() == 1 => row.first(),
                _ => None,
            },
        };

        if let Some(value) = broadcast {
            area_cells(area).for_each(|(row, column)| self.set(row, column, value.clone()));
            return;
        }

        if let RangeValue::Matrix(rows) = value {
            for (row, values) in (area.row()..=area.last_row()).zip(rows) {
                for (column, value) in (area.column()..=area.last_column()).zip(values) {
                    self.set(row, column, value.clone());
                }
            }
        }
    }

    fn fill(&self, row: u32, column: u32) -> Option<Rgb> {
        self.fills.borrow().get(&(row, column)).copied()
    }

    fn set_fill(&self, area: &Address, fill: Option<Rgb>) {
        let mut fills = self.fills.borrow_mut();
        for coord in area_cells(area) {
            match fill {
                Some(fill) => fills.insert(coord, fill),
                None => fills.remove(&coord),
            };
        }
    }

    fn used_range(&self) -> Option<Address> {
        let values = self.values.borrow();
        let (&(first_row, _), _) = values.first_key_value()?;
        let (&(last_row, _), _) = values.last_key_value()?;
        let first_column = values.keys().map(|(_, column)| *column).min()?;
        let last_column = values.keys().map(|(_, column)| *column).max()?;
        Some(Address::from_bounds(
            first_row,
            first_column,
            last_row,
            last_column,
        ))
    }
}

/// A workbook of in-memory sheets.
#[derive(Debug, Default)]
pub struct MemoryBook {
    name: String,
    sheets: RefCell<Vec<Rc<MemorySheet>>>,
}

impl MemoryBook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds `sheet`, replacing any sheet of the same name.
    pub fn add_sheet(&self, sheet: MemorySheet) -> Rc<MemorySheet> {
        let sheet = Rc::new(sheet);
        let mut sheets = self.sheets.borrow_mut();
        match sheets.iter().position(|existing| existing.name == sheet.name) {
            Some(idx) => sheets[idx] = Rc::clone(&sheet),
            None => sheets.push(Rc::clone(&sheet)),
        }
        sheet
    }

    pub fn sheet(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<MemorySheet>> {
        let sheets = self.sheets.borrow();
        let names = sheets
            .iter()
            .map(|sheet| sheet.name.as_str())
            .collect::<Vec<_>>();
        idx_or_name
            .position_in(&names)
            .and_then(|idx| sheets.get(idx))
            .cloned()
            .ok_or_else(|| XlError::from(XlErrorKind::SheetNotFound(idx_or_name.clone())))
            .with_context(|| format!("available sheets in \"{}\": {names:?}", self.name))
    }

    pub fn sheets(&self) -> Vec<Rc<MemorySheet>> {
        self.sheets.borrow().clone()
    }
}

impl Workbook for MemoryBook {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .borrow()
            .iter()
            .map(|sheet| sheet.name.clone())
            .collect()
    }

    fn worksheet(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<dyn Worksheet>> {
        self.sheet(idx_or_name)
            .map(|sheet| -> Rc<dyn Worksheet> { sheet })
    }
}

/// A macro invocation recorded by a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<Value>,
}

type MacroHandler = Box<dyn Fn(&[Value]) -> XlResult<Value>>;

/// A host keeping its workbooks in memory.
///
/// Macro invocations are recorded and answered by the handler registered under their name,
/// `Null` when there is none.
#[derive(Default)]
pub struct MemoryHost {
    books: RefCell<Vec<Rc<MemoryBook>>>,
    locked: Cell<bool>,
    connected: Cell<bool>,
    calls: RefCell<Vec<MacroCall>>,
    handlers: RefCell<HashMap<String, MacroHandler>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `book`, replacing any workbook of the same name.
    pub fn add_book(&self, book: MemoryBook) -> Rc<MemoryBook> {
        let book = Rc::new(book);
        let mut books = self.books.borrow_mut();
        match books.iter().position(|existing| existing.name == book.name) {
            Some(idx) => books[idx] = Rc::clone(&book),
            None => books.push(Rc::clone(&book)),
        }
        book
    }

    pub fn book(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<MemoryBook>> {
        let books = self.books.borrow();
        let names = books
            .iter()
            .map(|book| book.name.as_str())
            .collect::<Vec<_>>();
        idx_or_name
            .position_in(&names)
            .and_then(|idx| books.get(idx))
            .cloned()
            .ok_or_else(|| XlError::from(XlErrorKind::BookNotFound(idx_or_name.clone())))
            .with_context(|| format!("available workbooks: {names:?}"))
    }

    pub fn has_book(&self, name: &str) -> bool {
        self.books.borrow().iter().any(|book| book.name == name)
    }

    /// A locked host refuses connections, as an application busy with a modal dialog would.
    pub fn set_locked(&self, locked: bool) {
        self.locked.set(locked);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn on_macro<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[Value]) -> XlResult<Value> + 'static,
    {
        self.handlers
            .borrow_mut()
            .insert(name.into(), Box::new(handler));
    }

    pub fn macro_calls(&self) -> Vec<MacroCall> {
        self.calls.borrow().clone()
    }
}

impl Host for MemoryHost {
    fn connect(&self) -> XlResult<()> {
        if self.locked.get() {
            return Err(XlErrorKind::HostConnectionFailure(
                "the application does not accept connections".to_string(),
            )
            .into());
        }
        self.connected.set(true);
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.set(false);
    }

    fn workbook(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<dyn Workbook>> {
        self.book(idx_or_name)
            .map(|book| -> Rc<dyn Workbook> { book })
    }

    fn run_macro(&self, name: &str, args: &[Value]) -> XlResult<Value> {
        debug!("running macro {name} with {} argument(s)", args.len());
        self.calls.borrow_mut().push(MacroCall {
            name: name.to_string(),
            args: args.to_vec(),
        });
        match self.handlers.borrow().get(name) {
            Some(handler) => handler(args).with_context(|| format!("in macro {name}")),
            None => {
                info!("no handler for macro {name}");
                Ok(Value::Null)
            }
        }
    }
}
