//! Key/value reconciliation between worksheets.
//!
//! Source worksheets are read into a key/value table, then every data row of the target
//! worksheet is compared against that table. Each comparison is classified as an
//! [`Outcome`], counted in a [`Summary`] and marked on the target cells with the outcome's
//! fill color.

mod controller;
mod options;
mod payload;
mod summary;

use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    rc::Rc,
};

use log::{debug, info, warn};

use crate::{
    error::{ErrorContext, XlErrorKind, XlResult},
    host::{Host, Workbook, Worksheet},
    types::{
        address::Address,
        idx_or_name::IdxOrName,
        range::{RangeView, Span},
    },
};

pub use controller::{EXIT_CALLBACK, RESULT_CALLBACK, XlController};
pub use options::{MigrationOptions, Outcome, Palette};
pub use payload::{Instruction, MigrationPayload};
pub use summary::{MigrationReport, Phase, Progress, Summary};

/// Where the keys and values of one worksheet live.
///
/// Key and value columns are sheet columns, data rows run from the row below the headers to
/// the last used row of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WorkingArea {
    keys: (u32, u32),
    values: (u32, u32),
    first_row: u32,
    last_row: u32,
}

impl WorkingArea {
    fn resolve(sheet: &dyn Worksheet, key: &str, value: &str) -> XlResult<Self> {
        let key_headers = RangeView::parse(sheet, key)?;
        let value_headers = RangeView::parse(sheet, value)?;

        if key_headers.row_count() != 1
            || value_headers.row_count() != 1
            || key_headers.row() != value_headers.row()
        {
            return Err(XlErrorKind::MisalignedKeyValue(
                key_headers.address().to_string(),
                value_headers.address().to_string(),
            )
            .into());
        }

        let header_row = key_headers.row();
        let last_row = sheet
            .used_range()
            .map(|used| used.last_row())
            .unwrap_or(header_row);
        let columns = |headers: &RangeView<'_>| {
            (
                headers.column(),
                headers.column() + headers.column_count() - 1,
            )
        };

        Ok(Self {
            keys: columns(&key_headers),
            values: columns(&value_headers),
            first_row: header_row + 1,
            last_row,
        })
    }

    fn row_count(&self) -> u32 {
        (self.last_row + 1).saturating_sub(self.first_row)
    }

    /// Key and value cells of one data row.
    fn row_views<'s>(
        &self,
        sheet: &'s dyn Worksheet,
        row: u32,
    ) -> XlResult<(RangeView<'s>, RangeView<'s>)> {
        let left = self.keys.0.min(self.values.0);
        let right = self.keys.1.max(self.values.1);
        let line = RangeView::new(sheet, Address::from_bounds(row, left, row, right));

        let relative = |(first, last): (u32, u32)| {
            Span::ordinals(i64::from(first - left + 1), i64::from(last - left + 1))
        };
        Ok((
            line.by_span(relative(self.keys))?,
            line.by_span(relative(self.values))?,
        ))
    }
}

fn all_empty(texts: &[String]) -> bool {
    texts.iter().all(String::is_empty)
}

/// Reconciles the key/value columns of source worksheets into a target worksheet.
pub struct XlMigrator<'h, H: Host + ?Sized> {
    host: &'h H,
    options: MigrationOptions,
    target: Instruction,
    sources: Vec<Instruction>,
    books: HashMap<String, Rc<dyn Workbook>>,
    sheets: HashMap<(String, String), Rc<dyn Worksheet>>,
    data: HashMap<Vec<String>, Vec<String>>,
    redundants: HashSet<Vec<String>>,
    summary: Summary,
    started: bool,
}

impl<'h, H: Host + ?Sized> XlMigrator<'h, H> {
    pub fn new(
        host: &'h H,
        options: MigrationOptions,
        target: Instruction,
        sources: Vec<Instruction>,
    ) -> XlResult<Self> {
        options.validate()?;
        Ok(Self {
            host,
            summary: Summary::new(options.ordering),
            options,
            target,
            sources,
            books: HashMap::new(),
            sheets: HashMap::new(),
            data: HashMap::new(),
            redundants: HashSet::new(),
            started: false,
        })
    }

    /// A migrator for `payload`, whose overwrite flag takes precedence over `options`.
    pub fn from_payload(
        host: &'h H,
        options: MigrationOptions,
        payload: MigrationPayload,
    ) -> XlResult<Self> {
        let options = options.with_overwrite(payload.overwriting);
        Self::new(host, options, payload.target, payload.sources)
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Number of distinct keys read from the sources.
    pub fn distinct_keys(&self) -> usize {
        self.data.len()
    }

    pub fn is_redundant(&self, key: &[String]) -> bool {
        self.redundants.contains(key)
    }

    /// The value kept for `key`: the first one found in the sources.
    pub fn value_of(&self, key: &[String]) -> Option<&[String]> {
        self.data.get(key).map(Vec::as_slice)
    }

    pub fn report(&self) -> MigrationReport {
        MigrationReport::new(self.summary, self.data.len())
    }

    /// Runs both phases, handing every progress snapshot to `on_progress`.
    pub fn run<F>(&mut self, mut on_progress: F) -> XlResult<Summary>
    where
        F: FnMut(&Progress),
    {
        for progress in self.progress() {
            on_progress(&progress?);
        }
        Ok(self.summary)
    }

    /// The run as an iterator of snapshots, one per batch of rows and a final one once the
    /// summary is complete. A migrator runs once.
    pub fn progress(&mut self) -> MigrationRun<'_, 'h, H> {
        let state = if self.started {
            RunState::Rejected
        } else {
            RunState::Open(0)
        };
        self.started = true;
        MigrationRun {
            migrator: self,
            state,
            rows_processed: 0,
            since_batch: 0,
        }
    }

    fn get_worksheet(&mut self, book: &str, sheet: &str) -> XlResult<Rc<dyn Worksheet>> {
        let book_sheet = (book.to_string(), sheet.to_string());
        if let Some(worksheet) = self.sheets.get(&book_sheet) {
            return Ok(Rc::clone(worksheet));
        }

        let workbook = match self.books.get(book) {
            Some(workbook) => Rc::clone(workbook),
            None => {
                let workbook = self.host.workbook(&IdxOrName::from(book))?;
                self.books.insert(book.to_string(), Rc::clone(&workbook));
                workbook
            }
        };

        let worksheet = workbook
            .worksheet(&IdxOrName::from(sheet))
            .with_context(|| format!("in workbook \"{book}\""))?;
        self.sheets.insert(book_sheet, Rc::clone(&worksheet));
        Ok(worksheet)
    }

    fn load_row(&mut self, keys: &RangeView<'_>, values: &RangeView<'_>) {
        let key = keys.texts();
        let value = values.texts();
        if all_empty(&key) || all_empty(&value) {
            return;
        }

        match self.data.entry(key) {
            Entry::Occupied(entry) => {
                info!(
                    "multiple values for {:?}: {value:?} vs {:?}",
                    entry.key(),
                    entry.get()
                );
                self.redundants.insert(entry.key().clone());
            }
            Entry::Vacant(entry) => {
                info!("found {:?}: {value:?}", entry.key());
                entry.insert(value);
            }
        }
    }

    fn write_row(&mut self, keys: &RangeView<'_>, values: &RangeView<'_>) -> XlResult<()> {
        let key = keys.texts();
        let current = values.texts();

        let Some(data) = self
            .data
            .get(&key)
            .filter(|_| !all_empty(&key))
            .cloned()
        else {
            self.update_cell_record(Outcome::Mismatched, keys, None);
            return Ok(());
        };

        if self.redundants.contains(&key) {
            self.update_cell_record(Outcome::Redundant, keys, None);
        }

        for (idx, current) in current.iter().enumerate() {
            let new = match data.get(idx) {
                Some(new) => new.as_str(),
                None => {
                    warn!("no source value at position {idx} for {key:?}, using an empty one");
                    ""
                }
            };
            info!("compare {key:?}: <value>{current} vs <new value>{new}");

            // `idx` is bounded by the value column count
            let cell = values.by_ordinal(idx as i64 + 1)?;
            if current.is_empty() {
                self.update_cell_record(Outcome::FilledIn, &cell, Some(new));
            } else if current == new {
                self.update_cell_record(Outcome::Ignored, &cell, None);
            } else if self.options.overwrite {
                self.update_cell_record(Outcome::Overwritten, &cell, Some(new));
            } else {
                self.update_cell_record(Outcome::Different, &cell, None);
            }
        }
        Ok(())
    }

    /// Counts `outcome` and marks `cells` with its color, writing `data` when given.
    ///
    /// Without data to write, empty cells are left unmarked.
    fn update_cell_record(&mut self, outcome: Outcome, cells: &RangeView<'_>, data: Option<&str>) {
        self.summary.record(outcome);

        match data.filter(|data| !data.is_empty()) {
            Some(data) => cells.set_value(data),
            None if cells.is_empty() => return,
            None => {}
        }
        cells.set_color(Some(self.options.palette.color(outcome)));
    }

    fn make_summary(&mut self) -> Summary {
        self.summary
            .finalize_unused(self.data.len(), &self.options.unused_deductions);
        self.summary
    }
}

/// Rows left to process on one worksheet.
struct RowCursor {
    instruction: usize,
    sheet: Rc<dyn Worksheet>,
    area: WorkingArea,
    next_row: u32,
}

enum RunState {
    /// Resolve the instruction at this position, the target coming after every source
    Open(usize),
    Rows(RowCursor),
    Finishing,
    Exhausted,
    Rejected,
}

/// A migration in progress. See [`XlMigrator::progress`].
pub struct MigrationRun<'m, 'h, H: Host + ?Sized> {
    migrator: &'m mut XlMigrator<'h, H>,
    state: RunState,
    rows_processed: usize,
    since_batch: usize,
}

impl<H: Host + ?Sized> MigrationRun<'_, '_, H> {
    fn phase_of(&self, instruction: usize) -> Phase {
        if instruction < self.migrator.sources.len() {
            Phase::Read
        } else {
            Phase::Write
        }
    }

    fn snapshot(&self, phase: Phase) -> Progress {
        Progress {
            phase,
            rows_processed: self.rows_processed,
            summary: self.migrator.summary,
        }
    }

    fn open(&mut self, instruction: usize) -> XlResult<RunState> {
        let sources = self.migrator.sources.len();
        if instruction > sources {
            return Ok(RunState::Finishing);
        }
        let Instruction {
            book,
            sheet,
            key,
            value,
        } = match self.migrator.sources.get(instruction) {
            Some(source) => source.clone(),
            None => self.migrator.target.clone(),
        };

        let worksheet = self.migrator.get_worksheet(&book, &sheet)?;
        let area = WorkingArea::resolve(worksheet.as_ref(), &key, &value)
            .with_context(|| format!("in worksheet \"{sheet}\" of \"{book}\""))?;
        info!(
            "{} {book}/{sheet}: keys at {key}, values at {value}, {} data rows",
            if instruction < sources { "reading" } else { "writing" },
            area.row_count()
        );
        Ok(RunState::Rows(RowCursor {
            instruction,
            sheet: worksheet,
            area,
            next_row: area.first_row,
        }))
    }

    /// Processes the next row of `cursor`, `false` once its rows are exhausted.
    fn process_row(&mut self, cursor: &mut RowCursor) -> XlResult<bool> {
        if cursor.next_row > cursor.area.last_row {
            return Ok(false);
        }
        let row = cursor.next_row;
        cursor.next_row += 1;

        let sheet = Rc::clone(&cursor.sheet);
        let (keys, values) = cursor.area.row_views(sheet.as_ref(), row)?;
        match self.phase_of(cursor.instruction) {
            Phase::Read => self.migrator.load_row(&keys, &values),
            _ => self.migrator.write_row(&keys, &values)?,
        }
        self.rows_processed += 1;
        self.since_batch += 1;
        Ok(true)
    }

    fn advance(&mut self) -> XlResult<Option<Progress>> {
        loop {
            match std::mem::replace(&mut self.state, RunState::Exhausted) {
                RunState::Open(instruction) => self.state = self.open(instruction)?,
                RunState::Rows(mut cursor) => {
                    if !self.process_row(&mut cursor)? {
                        self.state = RunState::Open(cursor.instruction + 1);
                        continue;
                    }
                    let phase = self.phase_of(cursor.instruction);
                    self.state = RunState::Rows(cursor);
                    let batch_size = self.migrator.options.batch_size;
                    if batch_size > 0 && self.since_batch >= batch_size {
                        self.since_batch = 0;
                        debug!("{} rows processed", self.rows_processed);
                        return Ok(Some(self.snapshot(phase)));
                    }
                }
                RunState::Finishing => {
                    self.migrator.make_summary();
                    return Ok(Some(self.snapshot(Phase::Done)));
                }
                RunState::Exhausted => return Ok(None),
                RunState::Rejected => {
                    return Err(XlErrorKind::InvalidArguments(
                        "a migrator can only run once".to_string(),
                    )
                    .into());
                }
            }
        }
    }
}

impl<H: Host + ?Sized> Iterator for MigrationRun<'_, '_, H> {
    type Item = XlResult<Progress>;

    /// Errors end the run: no snapshot follows them.
    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
