//! The spreadsheet application seen from the migration core: workbooks and worksheets
//! resolved by index or name, live cell areas, and host-side macros.

mod export;
mod file;
mod memory;

use std::{ops::Deref, rc::Rc};

use log::debug;
use serde_json::Value;

use crate::{
    error::XlResult,
    types::{
        address::Address,
        cell::{CellValue, RangeValue},
        color::Rgb,
        idx_or_name::IdxOrName,
    },
};

pub use export::{export_book, export_sheets};
pub use file::{FileHost, load_workbook};
pub use memory::{MacroCall, MemoryBook, MemoryHost, MemorySheet};

/// A worksheet's live cell store.
///
/// Areas are fully bounded sheet addresses. Writes go through `&self`: a worksheet is a
/// handle on cells owned by the host.
pub trait Worksheet {
    fn name(&self) -> String;

    /// Values of `area`, as rows of columns.
    fn read(&self, area: &Address) -> Vec<Vec<CellValue>>;

    /// Writes `value` to `area`. How a value is distributed over the area is up to the host.
    fn write(&self, area: &Address, value: &RangeValue);

    fn fill(&self, row: u32, column: u32) -> Option<Rgb>;

    /// Sets the fill of every cell in `area`, `None` clearing it.
    fn set_fill(&self, area: &Address, fill: Option<Rgb>);

    /// Bounding box of all non-empty cells, `None` for an empty sheet.
    fn used_range(&self) -> Option<Address>;
}

pub trait Workbook {
    fn name(&self) -> String;

    fn sheet_names(&self) -> Vec<String>;

    fn worksheet(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<dyn Worksheet>>;
}

pub trait Host {
    /// Opens a session with the application. Fails when the application is unreachable.
    fn connect(&self) -> XlResult<()>;

    fn disconnect(&self);

    fn workbook(&self, idx_or_name: &IdxOrName) -> XlResult<Rc<dyn Workbook>>;

    /// Runs a host-side routine with positional arguments.
    fn run_macro(&self, name: &str, args: &[Value]) -> XlResult<Value>;
}

/// A connected host. The session is closed when dropped.
pub struct HostSession<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<'h, H: Host + ?Sized> HostSession<'h, H> {
    pub fn open(host: &'h H) -> XlResult<Self> {
        host.connect()?;
        debug!("host session opened");
        Ok(Self { host })
    }
}

impl<H: Host + ?Sized> Deref for HostSession<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: Host + ?Sized> Drop for HostSession<'_, H> {
    fn drop(&mut self) {
        self.host.disconnect();
        debug!("host session closed");
    }
}

/// A macro (or user defined function) of the host, run by calling [`Macro::run`].
pub struct Macro<'h, H: Host + ?Sized> {
    host: &'h H,
    name: String,
}

impl<'h, H: Host + ?Sized> Macro<'h, H> {
    pub fn new(host: &'h H, name: impl Into<String>) -> Self {
        Self {
            host,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self, args: &[Value]) -> XlResult<Value> {
        self.host.run_macro(&self.name, args)
    }
}
