//! Upload orchestration.
//!
//! One sequential pass: log in, plan, upload each task in plan order and
//! fold every outcome into a [`Report`]. Login and planning errors end the
//! run; a failure on one file is recorded and the next file is attempted.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::{HttpStatus, Remote};
use crate::config::UploadConfig;
use crate::error::UploadError;
use crate::planner::{self, UploadTask};
use crate::ui;

/// Result of one upload attempt: the server's status line, or the local or
/// connection error that kept the exchange from completing.
pub type UploadOutcome = Result<HttpStatus, UploadError>;

/// Exit status used with `--fail-on-error` when some file did not make it.
const PARTIAL_FAILURE_EXIT: u8 = 2;

/// Key of a report line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportKey {
    Status(HttpStatus),
    /// No HTTP exchange completed.
    Failed(&'static str),
}

impl ReportKey {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReportKey::Failed(_))
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKey::Status(status) => write!(f, "{status}"),
            ReportKey::Failed(kind) => write!(f, "failed: {kind}"),
        }
    }
}

impl From<&UploadOutcome> for ReportKey {
    fn from(outcome: &UploadOutcome) -> Self {
        match outcome {
            Ok(status) => ReportKey::Status(status.clone()),
            Err(e) => ReportKey::Failed(e.report_key()),
        }
    }
}

/// Count of upload outcomes per status line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    counts: BTreeMap<ReportKey, usize>,
}

impl Report {
    pub fn record(&mut self, outcome: &UploadOutcome) {
        *self.counts.entry(ReportKey::from(outcome)).or_insert(0) += 1;
    }

    /// Entries sorted by key: status lines by code, then failures.
    pub fn entries(&self) -> impl Iterator<Item = (&ReportKey, usize)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    /// Count for a key in its printed form, e.g. `"200 OK"`.
    pub fn count(&self, key: &str) -> usize {
        self.entries()
            .find(|(k, _)| k.to_string() == key)
            .map_or(0, |(_, n)| n)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// True when every recorded upload got a 2xx answer.
    pub fn all_succeeded(&self) -> bool {
        self.counts.keys().all(|k| match k {
            ReportKey::Status(status) => status.is_success(),
            ReportKey::Failed(_) => false,
        })
    }
}

/// What a finished run hands back to the CLI layer.
#[derive(Debug)]
pub struct RunSummary {
    pub dry_run: bool,
    pub tasks: Vec<UploadTask>,
    pub report: Report,
}

impl RunSummary {
    /// Process exit status. Failed files only turn into a non-zero status
    /// when `fail_on_error` is set.
    pub fn exit_status(&self, fail_on_error: bool) -> u8 {
        if fail_on_error && !self.report.all_succeeded() {
            PARTIAL_FAILURE_EXIT
        } else {
            0
        }
    }
}

/// Run a whole upload session against `remote`.
///
/// Dry runs skip the login as well as the uploads, so they touch the
/// network not at all, but they walk the exact same plan.
pub fn run<R: Remote>(config: &UploadConfig, remote: &R) -> Result<RunSummary, UploadError> {
    let token = if config.dry_run {
        None
    } else {
        Some(remote.login(&config.credentials)?)
    };

    let tasks = planner::plan(
        &config.source,
        &config.api,
        &config.destination,
        config.only_folder_content,
    )?;
    tracing::debug!(tasks = tasks.len(), dry_run = config.dry_run, "plan ready");
    ui::announce_mode(config.source.is_dir());

    let mut report = Report::default();
    for task in &tasks {
        ui::print_task(task);
        let Some(token) = &token else {
            continue;
        };

        let outcome = remote.upload(task, token, config.override_existing, !config.no_progress);
        if let Err(e) = &outcome {
            tracing::warn!(file = %task.local_path.display(), error = %e, "upload failed");
        }
        ui::print_outcome(&outcome);
        report.record(&outcome);
    }

    Ok(RunSummary {
        dry_run: config.dry_run,
        tasks,
        report,
    })
}
