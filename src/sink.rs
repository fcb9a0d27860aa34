//! Where downloaded images end up.
//!
//! The session never touches the filesystem itself. It hands each image to a
//! [`DownloadSink`] as a URL plus a relative target path and waits for the
//! sink to report success or failure, one file at a time.
//!
//! [`FsSink`] is the sink used by the command line front-end: it fetches the
//! image over HTTP and writes it below a root directory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::net::shared_client;

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    /// Save under a new name: `photo.jpg`, `photo (1).jpg`, `photo (2).jpg`, ...
    #[default]
    Uniquify,
    /// Replace the existing file.
    Overwrite,
}

/// One file for the sink to save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,

    /// Relative target path using `/` as separator, e.g. `Garden/roses.jpg`
    pub filename: String,

    pub conflict_action: ConflictAction,
}

/// Saves files on behalf of a download session.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Saves one file and returns once it is complete.
    ///
    /// # Errors
    ///
    /// * [`Error::DownloadSink`] - the file could not be fetched or stored
    async fn download(&self, request: DownloadRequest) -> Result<()>;
}

/// Sink writing files below a root directory.
///
/// # Examples
///
/// ```rust,no_run
/// use pinfetch::sink::{ConflictAction, DownloadRequest, DownloadSink, FsSink};
///
/// # async fn example() -> pinfetch::Result<()> {
/// let sink = FsSink::new("./downloads");
/// sink.download(DownloadRequest {
///     url: "https://i.pinimg.com/originals/aa/bb/cc.jpg".to_string(),
///     filename: "Garden/roses.jpg".to_string(),
///     conflict_action: ConflictAction::Uniquify,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative `/`-separated target below the root.
    ///
    /// Absolute paths and `..` components are rejected so a board or pin name
    /// cannot escape the root.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let relative = Path::new(filename);
        let mut path = self.root.clone();
        let mut has_file = false;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    has_file = true;
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::sink(format!("Invalid target path: {}", filename)));
                }
            }
        }

        if !has_file {
            return Err(Error::sink(format!("Invalid target path: {}", filename)));
        }
        Ok(path)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = shared_client()
            .get(url)
            .send()
            .await
            .map_err(|e| Error::sink(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::sink(format!("{}: HTTP {}", url, response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::sink(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn write(&self, target: &Path, bytes: &[u8], conflict: ConflictAction) -> Result<PathBuf> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::sink(format!("Failed to create directory: {}", e)))?;
        }

        let (mut file, path) = match conflict {
            ConflictAction::Overwrite => {
                let file = fs::File::create(target)
                    .await
                    .map_err(|e| Error::sink(format!("Failed to create file: {}", e)))?;
                (file, target.to_path_buf())
            }
            ConflictAction::Uniquify => create_unique(target).await?,
        };

        file.write_all(bytes)
            .await
            .map_err(|e| Error::sink(format!("Failed to write file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| Error::sink(format!("Failed to write file: {}", e)))?;

        Ok(path)
    }
}

/// Returns the `n`th alternative name for `path`: `stem (n).ext`.
pub fn numbered_path(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{} ({}).{}", stem, n, ext.to_string_lossy()),
        None => format!("{} ({})", stem, n),
    };
    path.with_file_name(name)
}

/// Creates the first free file among `path`, `stem (1).ext`, `stem (2).ext`, ...
async fn create_unique(path: &Path) -> Result<(fs::File, PathBuf)> {
    let mut candidate = path.to_path_buf();
    let mut n = 0u32;

    loop {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                n += 1;
                candidate = numbered_path(path, n);
            }
            Err(e) => return Err(Error::sink(format!("Failed to create file: {}", e))),
        }
    }
}

#[async_trait]
impl DownloadSink for FsSink {
    async fn download(&self, request: DownloadRequest) -> Result<()> {
        let target = self.resolve(&request.filename)?;
        let bytes = self.fetch(&request.url).await?;
        let saved = self.write(&target, &bytes, request.conflict_action).await?;

        debug!(url = %request.url, path = %saved.display(), bytes = bytes.len(), "Saved file");
        Ok(())
    }
}
