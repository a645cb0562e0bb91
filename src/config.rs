//! Upload configuration.
//!
//! Settings come from the command line, then from an optional TOML file,
//! then (password only) from an interactive prompt. The file holds a
//! single `[filebrowser]` table:
//!
//! ```toml
//! [filebrowser]
//! api = "https://files.example.com/api"
//! username = "admin"
//! password = "secret"
//! ```
//!
//! Searched locations, first existing wins:
//! - `~/.config/filebrowser_upload/filebrowser_upload.toml`
//! - the platform config dir, e.g. `~/Library/Application Support/...` on
//!   macOS or `%APPDATA%\...` on Windows

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;

use crate::api::Credentials;
use crate::cli::Args;
use crate::error::UploadError;
use crate::planner::Destination;

pub const CONFIG_DIR_NAME: &str = "filebrowser_upload";
pub const CONFIG_FILE_NAME: &str = "filebrowser_upload.toml";

/// Values read from the `[filebrowser]` table of a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    pub api: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    filebrowser: FileConfig,
}

/// Fully validated settings for one run.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// API base URL without trailing slash.
    pub api: Url,
    pub credentials: Credentials,
    pub source: PathBuf,
    pub destination: Destination,
    pub insecure_tls: bool,
    pub no_progress: bool,
    pub override_existing: bool,
    pub dry_run: bool,
    pub only_folder_content: bool,
    pub fail_on_error: bool,
}

impl UploadConfig {
    /// Merge CLI arguments over the file config and validate the result.
    ///
    /// `prompt_password` is only called when neither source provides a
    /// password and the run is not a dry run (dry runs never log in).
    pub fn resolve<F>(args: &Args, file: FileConfig, prompt_password: F) -> Result<Self, UploadError>
    where
        F: FnOnce(&str) -> std::io::Result<String>,
    {
        let api = args.api.clone().or(file.api).ok_or_else(|| {
            UploadError::ConfigInvalid("a valid api param must be provided, use -h for help".into())
        })?;
        let username = args.username.clone().or(file.username).ok_or_else(|| {
            UploadError::ConfigInvalid("a valid username param must be provided, use -h for help".into())
        })?;
        let api = normalize_api(&api)?;

        let password = match args.password.clone().or(file.password) {
            Some(password) => password,
            None if args.dry_run => String::new(),
            None => prompt_password(&username)
                .map_err(|e| UploadError::ConfigInvalid(format!("cannot read password: {e}")))?,
        };

        Ok(UploadConfig {
            api,
            credentials: Credentials { username, password },
            source: expand_source(&args.src),
            destination: Destination::parse(&args.dest)?,
            insecure_tls: args.insecure,
            no_progress: args.no_progress,
            override_existing: args.override_existing,
            dry_run: args.dry_run,
            only_folder_content: args.only_folder_content,
            fail_on_error: args.fail_on_error,
        })
    }
}

/// Trim the API URL, drop trailing slashes and check it can carry a path.
pub fn normalize_api(raw: &str) -> Result<Url, UploadError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| UploadError::ConfigInvalid(format!("invalid api URL {trimmed:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(UploadError::ConfigInvalid(format!(
            "api URL must be an absolute http(s) URL, got {trimmed:?}"
        )));
    }
    Ok(url)
}

/// Expand a leading `~` and drop trailing slashes.
pub fn expand_source(raw: &str) -> PathBuf {
    let trimmed = match raw.trim_end_matches('/') {
        "" if raw.starts_with('/') => "/",
        t => t,
    };
    match (trimmed, dirs::home_dir()) {
        ("~", Some(home)) => home,
        (t, Some(home)) if t.starts_with("~/") => home.join(&t[2..]),
        (t, _) => PathBuf::from(t),
    }
}

/// Candidate config file locations for this platform, in lookup order.
pub fn possible_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = dirs::config_dir() {
        let path = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Load the config file named on the command line, or the first existing
/// default one. Returns the path used along with its values.
pub fn load_config(explicit: Option<&Path>) -> Result<Option<(PathBuf, FileConfig)>, UploadError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(UploadError::ConfigInvalid(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return read_config(path).map(|c| Some((path.to_path_buf(), c)));
    }

    match find_config(&possible_config_paths()) {
        Some(path) => read_config(&path).map(|c| Some((path, c))),
        None => {
            tracing::debug!("no config file found");
            Ok(None)
        }
    }
}

fn find_config(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

/// Read the `[filebrowser]` table of a TOML file.
pub fn read_config(path: &Path) -> Result<FileConfig, UploadError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| UploadError::ConfigInvalid(format!("cannot read {}: {e}", path.display())))?;
    let doc: ConfigDocument = toml::from_str(&content)
        .map_err(|e| UploadError::ConfigInvalid(format!("cannot parse {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "configuration file parsed");
    Ok(doc.filebrowser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["filebrowser-upload", "some/folder/"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn no_prompt(_: &str) -> std::io::Result<String> {
        panic!("password prompt should not be shown")
    }

    #[test]
    fn cli_overrides_file_values() {
        let file = FileConfig {
            api: Some("https://file.example/api".into()),
            username: Some("file-user".into()),
            password: Some("file-pw".into()),
        };
        let cfg = UploadConfig::resolve(
            &args(&["--api", "https://cli.example/api/", "--username", "cli-user"]),
            file,
            no_prompt,
        )
        .unwrap();

        assert_eq!(cfg.api.as_str(), "https://cli.example/api");
        assert_eq!(cfg.credentials.username, "cli-user");
        assert_eq!(cfg.credentials.password, "file-pw");
        assert_eq!(cfg.source, PathBuf::from("some/folder"));
    }

    #[test]
    fn missing_api_is_rejected() {
        let err = UploadConfig::resolve(&args(&["--username", "u"]), FileConfig::default(), no_prompt)
            .unwrap_err();
        assert!(matches!(err, UploadError::ConfigInvalid(msg) if msg.contains("api")));
    }

    #[test]
    fn missing_username_is_rejected() {
        let err = UploadConfig::resolve(&args(&["--api", "http://x"]), FileConfig::default(), no_prompt)
            .unwrap_err();
        assert!(matches!(err, UploadError::ConfigInvalid(msg) if msg.contains("username")));
    }

    #[test]
    fn password_is_prompted_when_missing() {
        let cfg = UploadConfig::resolve(
            &args(&["--api", "http://x", "--username", "bob"]),
            FileConfig::default(),
            |user| {
                assert_eq!(user, "bob");
                Ok("typed".into())
            },
        )
        .unwrap();
        assert_eq!(cfg.credentials.password, "typed");
    }

    #[test]
    fn dry_run_skips_password_prompt() {
        let cfg = UploadConfig::resolve(
            &args(&["--api", "http://x", "--username", "bob", "--dry-run"]),
            FileConfig::default(),
            no_prompt,
        )
        .unwrap();
        assert!(cfg.dry_run);
        assert!(cfg.credentials.password.is_empty());
    }

    #[test]
    fn flags_and_destination_are_carried() {
        let cfg = UploadConfig::resolve(
            &args(&[
                "--api",
                "http://x",
                "--username",
                "u",
                "--password",
                "p",
                "--dest",
                " /backup/2024/ ",
                "--insecure",
                "--no-progress",
                "--override",
                "--only-folder-content",
                "--fail-on-error",
            ]),
            FileConfig::default(),
            no_prompt,
        )
        .unwrap();
        assert_eq!(cfg.destination.path(), "backup/2024");
        assert!(cfg.destination.is_folder());
        assert!(cfg.insecure_tls);
        assert!(cfg.no_progress);
        assert!(cfg.override_existing);
        assert!(cfg.only_folder_content);
        assert!(cfg.fail_on_error);
        assert!(!cfg.dry_run);
    }

    #[test]
    fn destination_climbing_out_is_rejected() {
        let err = UploadConfig::resolve(
            &args(&["--api", "http://x", "--username", "u", "--password", "p", "--dest", "../x"]),
            FileConfig::default(),
            no_prompt,
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::ConfigInvalid(msg) if msg.contains("..")));
    }

    #[test]
    fn api_url_validation() {
        assert_eq!(normalize_api("  http://host:8080/api// ").unwrap().as_str(), "http://host:8080/api");
        assert!(normalize_api("not a url").is_err());
        assert!(normalize_api("ftp://host/api").is_err());
        assert!(normalize_api("mailto:someone@example.com").is_err());
    }

    #[test]
    fn source_expansion() {
        assert_eq!(expand_source("/"), PathBuf::from("/"));
        assert_eq!(expand_source("/data/photos//"), PathBuf::from("/data/photos"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_source("~/docs"), home.join("docs"));
            assert_eq!(expand_source("~"), home);
        }
    }

    #[test]
    fn reads_filebrowser_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[filebrowser]\napi = \"https://files/api\"\nusername = \"admin\"\n",
        )
        .unwrap();

        let cfg = read_config(&path).unwrap();
        assert_eq!(cfg.api.as_deref(), Some("https://files/api"));
        assert_eq!(cfg.username.as_deref(), Some("admin"));
        assert_eq!(cfg.password, None);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[filebrowser\napi = ").unwrap();
        assert!(matches!(read_config(&path), Err(UploadError::ConfigInvalid(_))));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("a.toml");
        let second = dir.path().join("b.toml");
        let third = dir.path().join("c.toml");
        fs::write(&second, "").unwrap();
        fs::write(&third, "").unwrap();

        assert_eq!(find_config(&[missing.clone(), second.clone(), third]), Some(second));
        assert_eq!(find_config(&[missing]), None);
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, UploadError::ConfigInvalid(_)));

        let path = dir.path().join("custom.toml");
        fs::write(&path, "[filebrowser]\nusername = \"x\"\n").unwrap();
        let (used, cfg) = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(used, path);
        assert_eq!(cfg.username.as_deref(), Some("x"));
    }
}
