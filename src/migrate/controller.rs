use log::{debug, error, info};
use serde_json::Value;

use crate::{
    error::{ErrorContext, XlResult},
    host::{Host, HostSession, Macro},
};

use super::{MigrationOptions, MigrationPayload, MigrationReport, Progress, XlMigrator};

/// Host macro receiving `(0, summary JSON)` once a run succeeds.
pub const RESULT_CALLBACK: &str = "Migration.OnResultCallBack";
/// Host macro invoked with no argument when a run ends, whatever its outcome.
pub const EXIT_CALLBACK: &str = "Migration.OnExitCallBack";

type ProgressCallback<'h> = Box<dyn FnMut(&Progress) + 'h>;
type ExitCallback<'h> = Box<dyn FnMut(i32) + 'h>;

/// Drives a migration on behalf of a host: opens the session, runs the migrator, reports the
/// summary and turns failures into an exit status.
///
/// Exit statuses: 0 on success, 1 when the host could not be reached, 2 for any other error.
pub struct XlController<'h, H: Host + ?Sized> {
    host: &'h H,
    options: MigrationOptions,
    on_progress: ProgressCallback<'h>,
    on_exit: ExitCallback<'h>,
    last_report: Option<MigrationReport>,
}

impl<'h, H: Host + ?Sized> XlController<'h, H> {
    pub fn new<P, E>(host: &'h H, options: MigrationOptions, on_progress: P, on_exit: E) -> Self
    where
        P: FnMut(&Progress) + 'h,
        E: FnMut(i32) + 'h,
    {
        Self {
            host,
            options,
            on_progress: Box::new(on_progress),
            on_exit: Box::new(on_exit),
            last_report: None,
        }
    }

    /// A controller logging progress and calling [`EXIT_CALLBACK`] on the host when done.
    pub fn with_macro_callbacks(host: &'h H, options: MigrationOptions) -> Self {
        let on_progress = |progress: &Progress| {
            debug!(
                "{:?}: {} rows, {}",
                progress.phase,
                progress.rows_processed,
                serde_json::to_string(&progress.summary).unwrap_or_default()
            );
        };
        let on_exit = move |status: i32| {
            debug!("exiting with status {status}");
            if let Err(err) = Macro::new(host, EXIT_CALLBACK).run(&[]) {
                error!("{err}");
            }
        };
        Self::new(host, options, on_progress, on_exit)
    }

    /// The report of the last successful run.
    pub fn last_report(&self) -> Option<&MigrationReport> {
        self.last_report.as_ref()
    }

    /// Runs the migration described by `payload` within a host session and reports its
    /// summary through [`RESULT_CALLBACK`].
    pub fn run(&mut self, payload: MigrationPayload) -> XlResult<MigrationReport> {
        let _session = HostSession::open(self.host)?;

        let mut migrator = XlMigrator::from_payload(self.host, self.options.clone(), payload)?;
        let on_progress = &mut self.on_progress;
        let summary = migrator.run(|progress| on_progress(progress))?;

        let summary_json = serde_json::to_string(&summary)?;
        Macro::new(self.host, RESULT_CALLBACK)
            .run(&[Value::from(0), Value::from(summary_json)])
            .with_context(|| "could not report the migration summary")?;

        Ok(migrator.report())
    }

    /// Runs the migration, logs its outcome, then signals the exit callback with the exit
    /// status, which is also returned.
    pub fn execute(&mut self, payload: MigrationPayload) -> i32 {
        let status = match self.run(payload) {
            Ok(report) => {
                info!("\n{report}");
                self.last_report = Some(report);
                0
            }
            Err(err) => {
                error!("{err}");
                err.exit_status()
            }
        };
        (self.on_exit)(status);
        status
    }
}
