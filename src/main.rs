// Entrypoint for the CLI application.
// - Keeps `main` small: resolve the configuration, build the API client
//   and hand both to the upload session.
// - Login and planning failures come back as errors and exit non-zero.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use filebrowser_upload::api::ApiClient;
use filebrowser_upload::cli::Args;
use filebrowser_upload::config::{self, UploadConfig};
use filebrowser_upload::{ui, upload};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    ui::welcome();

    let file_config = match config::load_config(args.config.as_deref())? {
        Some((path, file_config)) => {
            ui::config_loaded(&path);
            file_config
        }
        None => config::FileConfig::default(),
    };
    let config = UploadConfig::resolve(&args, file_config, ui::prompt_password)?;

    let api = ApiClient::new(config.api.clone(), config.insecure_tls)
        .context("Failed to build HTTP client")?;
    let summary = upload::run(&config, &api)?;

    ui::print_summary(&summary);
    Ok(ExitCode::from(summary.exit_status(config.fail_on_error)))
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}
