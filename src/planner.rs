//! Upload planning.
//!
//! Turns a local source path into the ordered list of `(local file, remote
//! URL)` pairs the orchestrator uploads. Remote paths always use `/` as
//! separator, whatever the local platform uses.

use std::fs;
use std::path::{Component, Path, PathBuf};

use reqwest::Url;
use walkdir::{DirEntry, WalkDir};

use crate::error::UploadError;

/// Remote destination under the server's `resources` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    path: String,
    is_folder: bool,
}

impl Destination {
    /// Normalize a raw `--dest` value.
    ///
    /// An empty value or one ending in `/` names a folder; anything else
    /// names the target file when a single file is uploaded. `.` and `..`
    /// segments are rejected since URLs resolve them away.
    pub fn parse(raw: &str) -> Result<Self, UploadError> {
        let trimmed = raw.trim().trim_start_matches('/');
        if trimmed.split('/').any(|s| s == "." || s == "..") {
            return Err(UploadError::ConfigInvalid(format!(
                "destination {trimmed:?} must not contain '.' or '..' segments"
            )));
        }
        Ok(Destination {
            is_folder: trimmed.is_empty() || trimmed.ends_with('/'),
            path: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

/// The user's home folder on the server.
impl Default for Destination {
    fn default() -> Self {
        Destination {
            path: String::new(),
            is_folder: true,
        }
    }
}

/// One planned transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Absolute path of the local regular file.
    pub local_path: PathBuf,
    /// Path below the `resources` root, `/`-separated, never starting with `/`.
    pub remote_path: String,
    /// `{api}/resources/{remote_path}`, segments percent-encoded.
    pub remote_url: Url,
}

/// Build the full upload plan for `source`.
///
/// A regular file yields exactly one task. A directory is walked top-down
/// (files of a directory before its subdirectories, siblings sorted by
/// name) and yields one task per regular file. When `only_folder_content`
/// is false the directory's own name is kept as the first remote segment
/// below the destination.
///
/// Symlinks found inside the walk are not followed and are skipped, like
/// every other non-regular entry. The file list is captured when this
/// function runs; later changes on disk are not reflected.
pub fn plan(
    source: &Path,
    api: &Url,
    dest: &Destination,
    only_folder_content: bool,
) -> Result<Vec<UploadTask>, UploadError> {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(UploadError::NotFound(source.to_path_buf()))
        }
        Err(source_err) => {
            return Err(UploadError::FileUnreadable {
                path: source.to_path_buf(),
                source: source_err,
            })
        }
    };

    let root = absolute_source(source)?;

    if metadata.is_file() {
        plan_file(&root, api, dest).map(|task| vec![task])
    } else if metadata.is_dir() {
        plan_dir(&root, api, dest, only_folder_content)
    } else {
        Err(UploadError::InvalidPath(source.to_path_buf()))
    }
}

fn plan_file(root: &Path, api: &Url, dest: &Destination) -> Result<UploadTask, UploadError> {
    let mut segments: Vec<String> = dest.segments().map(str::to_string).collect();
    if dest.is_folder() {
        let name = root
            .file_name()
            .ok_or_else(|| UploadError::InvalidPath(root.to_path_buf()))?;
        segments.push(name.to_string_lossy().into_owned());
    }
    task(root.to_path_buf(), api, segments)
}

fn plan_dir(
    root: &Path,
    api: &Url,
    dest: &Destination,
    only_folder_content: bool,
) -> Result<Vec<UploadTask>, UploadError> {
    let mut prefix: Vec<String> = dest.segments().map(str::to_string).collect();
    if !only_folder_content {
        if let Some(name) = root.file_name() {
            prefix.push(name.to_string_lossy().into_owned());
        }
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        });

    let mut tasks = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| UploadError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if !entry.file_type().is_file() {
            tracing::warn!(path = %entry.path().display(), "skipping non-regular file");
            continue;
        }

        let mut segments = prefix.clone();
        segments.extend(relative_segments(root, &entry)?);
        tasks.push(task(entry.into_path(), api, segments)?);
    }

    tracing::debug!(root = %root.display(), files = tasks.len(), "directory planned");
    Ok(tasks)
}

fn relative_segments(root: &Path, entry: &DirEntry) -> Result<Vec<String>, UploadError> {
    let relative = entry
        .path()
        .strip_prefix(root)
        .map_err(|_| UploadError::InvalidPath(entry.path().to_path_buf()))?;
    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect())
}

fn task(local_path: PathBuf, api: &Url, segments: Vec<String>) -> Result<UploadTask, UploadError> {
    let segments: Vec<&str> = segments
        .iter()
        .map(|s| s.trim_start_matches('/'))
        .filter(|s| !s.is_empty())
        .collect();
    Ok(UploadTask {
        remote_url: resources_url(api, &segments)?,
        remote_path: segments.join("/"),
        local_path,
    })
}

/// `{api}/resources/{segments...}` with every segment percent-encoded.
pub fn resources_url(api: &Url, segments: &[&str]) -> Result<Url, UploadError> {
    let mut url = api.clone();
    url.path_segments_mut()
        .map_err(|_| UploadError::ConfigInvalid(format!("{api} cannot carry a path")))?
        .pop_if_empty()
        .push("resources")
        .extend(segments);
    Ok(url)
}

/// Absolute form of the source path that still ends in a real name.
///
/// `.`, `..` or `dir/..` have no name of their own, so those are resolved
/// against the filesystem instead.
fn absolute_source(source: &Path) -> Result<PathBuf, UploadError> {
    let resolved = if source.file_name().is_some() {
        std::path::absolute(source)
    } else {
        fs::canonicalize(source)
    };
    resolved.map_err(|e| UploadError::FileUnreadable {
        path: source.to_path_buf(),
        source: e,
    })
}
