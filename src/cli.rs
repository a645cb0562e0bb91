//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Upload a file or a folder to a File Browser server.
#[derive(Parser, Debug, Clone)]
#[command(name = "filebrowser-upload", author, version, about)]
pub struct Args {
    /// Source file or folder
    pub src: String,

    /// File Browser API URL, e.g. https://files.example.com/api
    #[arg(long)]
    pub api: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    /// Inline password (prompted for when missing)
    #[arg(long)]
    pub password: Option<String>,

    /// Destination file or folder (default is the user's home).
    /// A trailing `/` marks a folder.
    #[arg(long, default_value = "")]
    pub dest: String,

    /// Read settings from this TOML file instead of the default locations
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Allow insecure server connections when using SSL
    #[arg(long)]
    pub insecure: bool,

    /// Disable progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Replace files that already exist on the server
    #[arg(long = "override")]
    pub override_existing: bool,

    /// Print the upload plan without sending anything
    #[arg(long)]
    pub dry_run: bool,

    /// Upload only the content of the source folder, not the folder itself
    #[arg(long)]
    pub only_folder_content: bool,

    /// Exit with status 2 when any file was not uploaded successfully
    #[arg(long)]
    pub fail_on_error: bool,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
