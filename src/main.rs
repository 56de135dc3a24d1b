use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};
use xlmigrate::{
    FileHost, Host, IdxOrName, MigrationOptions, MigrationPayload, XlController, export_book,
};

/// Migrates key/value columns from source worksheets into a target worksheet.
#[derive(Debug, Parser)]
#[command(name = "xlmigrate", version)]
struct Cli {
    /// Workbook the migration was launched from. Sibling workbooks are looked up in its
    /// directory
    workbook: PathBuf,
    /// Worksheet the migration was launched from
    sheet: String,
    /// Base64 encoded JSON migration payload
    payload: String,
    /// Rows between two progress reports, 0 to only report at the end
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    /// Writes the target workbook, with its outcome colors, to this xlsx file
    #[arg(long)]
    save: Option<PathBuf>,
    /// Writes the migration report as JSON to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn try_main(cli: Cli) -> Result<u8> {
    let Some(book_name) = cli.workbook.file_name().map(|name| name.to_string_lossy()) else {
        bail!("{} is not a workbook path", cli.workbook.display());
    };
    let dir = match cli.workbook.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let payload = MigrationPayload::from_base64(&cli.payload)?;

    let host = FileHost::new(dir);
    let launcher = host
        .workbook(&IdxOrName::from(book_name.to_string()))
        .context("could not open the launching workbook")?;
    launcher
        .worksheet(&IdxOrName::from(cli.sheet.as_str()))
        .context("could not find the launching worksheet")?;
    info!("launched from {}/{}", launcher.name(), cli.sheet);

    let target_book = payload.target.book.clone();
    let options = MigrationOptions::new().with_batch_size(cli.batch_size);
    let mut controller = XlController::with_macro_callbacks(&host, options);
    let status = controller.execute(payload);

    if let Some(report) = controller.last_report() {
        if let Some(path) = &cli.summary_json {
            let json = serde_json::to_string_pretty(report)?;
            fs::write(path, json)
                .with_context(|| format!("could not write the report to {}", path.display()))?;
        }
        if let Some(path) = &cli.save {
            let book = host.book(&IdxOrName::from(target_book))?;
            export_book(&book, path)?;
        }
    }

    // Statuses are 0, 1 or 2
    Ok(status as u8)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match try_main(Cli::parse()) {
        Ok(status) => ExitCode::from(status),
        Err(err) => {
            error!("{err:?}");
            ExitCode::from(2)
        }
    }
}
