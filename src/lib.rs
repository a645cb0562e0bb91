// Library root
// -----------
// This crate exposes the upload core as a library. The binary
// (`main.rs`) only parses arguments, resolves the configuration and
// hands it to `upload::run`.
//
// Module responsibilities:
// - `planner`: turns a local file or folder into the list of upload tasks.
// - `api`: HTTP calls to the File Browser server (login, file upload).
// - `progress`: progress-reporting reader used for upload bodies.
// - `upload`: runs the session and aggregates the outcome report.
// - `config` / `cli`: command line and config file handling.
// - `ui`: terminal output, prompts and progress bars.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod planner;
pub mod progress;
pub mod ui;
pub mod upload;

pub use error::UploadError;
