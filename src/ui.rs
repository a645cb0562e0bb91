// UI layer: everything the user sees on the terminal. Prompts use
// `dialoguer`, per-file transfer bars use `indicatif`, and the plan and
// report go to stdout with plain `println!`.

use std::path::Path;

use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};

use crate::planner::UploadTask;
use crate::upload::{ReportKey, RunSummary, UploadOutcome};

const BAR_TEMPLATE: &str =
    "{percent:>3}%|{bar:30}| {bytes}/{total_bytes} [{elapsed_precise}<{eta_precise}, {bytes_per_sec}]";

pub fn welcome() {
    println!("Welcome to filebrowser-upload");
}

pub fn config_loaded(path: &Path) {
    println!("Configuration loaded from: {}", path.display());
}

/// Ask for the password without echoing it.
pub fn prompt_password(username: &str) -> std::io::Result<String> {
    Password::new()
        .with_prompt(format!("Password for {username}"))
        .allow_empty_password(true)
        .interact()
}

/// Byte progress bar for one file transfer.
pub fn transfer_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}

pub fn announce_mode(is_dir: bool) {
    if is_dir {
        println!("Folder upload detected...\n");
    } else {
        println!("File upload detected...\n");
    }
}

/// Printed before the request goes out, so a hang points at its file.
pub fn print_task(task: &UploadTask) {
    println!("Uploading {} to {}", task.local_path.display(), task.remote_url);
}

pub fn print_outcome(outcome: &UploadOutcome) {
    match outcome {
        Ok(status) => println!("{status}\n"),
        Err(e) => println!("FAILED: {e}\n"),
    }
}

pub fn print_summary(summary: &RunSummary) {
    for line in summary_lines(summary) {
        println!("{line}");
    }
}

/// Closing lines of a run, one per report key.
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    if summary.dry_run {
        return vec!["\nThis was a dry-run session. Nothing changed.".to_string()];
    }

    let mut lines = vec!["\nUpload completed with the following report:".to_string()];
    lines.extend(summary.report.entries().map(|(key, count)| match key {
        ReportKey::Failed(kind) => format!("\t{count} item(s) failed with {kind}"),
        ReportKey::Status(status) => format!("\t{count} item(s) uploaded with code {status}"),
    }));
    lines
}
