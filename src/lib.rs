mod error;
mod host;
mod migrate;
mod types;

pub use error::{ErrorContext, XlError, XlErrorKind, XlResult};
pub use host::{
    FileHost, Host, HostSession, Macro, MacroCall, MemoryBook, MemoryHost, MemorySheet, Workbook,
    Worksheet, export_book, export_sheets, load_workbook,
};
pub use migrate::{
    EXIT_CALLBACK, Instruction, MigrationOptions, MigrationPayload, MigrationReport,
    MigrationRun, Outcome, Palette, Phase, Progress, RESULT_CALLBACK, Summary, XlController,
    XlMigrator,
};
pub use types::{
    address::{
        Address, AddressMatrix, Coord, MAX_COLUMNS, MAX_ROWS,
        codec::{column_to_letters, decode, encode, letters_to_column},
    },
    cell::{CellValue, RangeValue},
    color::{NamedColor, Rgb},
    idx_or_name::IdxOrName,
    range::{CellArg, RangeView, Span, ViewKind},
};

/// Runs the migration described by `payload` on `host` and returns its report.
///
/// Progress is only logged. Use [`XlController`] to be notified of progress and exit status.
pub fn migrate<H: Host + ?Sized>(
    host: &H,
    payload: MigrationPayload,
    options: MigrationOptions,
) -> XlResult<MigrationReport> {
    let _session = HostSession::open(host)?;
    let mut migrator = XlMigrator::from_payload(host, options, payload)?;
    migrator
        .run(|progress| log::debug!("{progress:?}"))
        .with_context(|| "migration failed")?;
    let report = migrator.report();
    log::info!("\n{report}");
    Ok(report)
}
