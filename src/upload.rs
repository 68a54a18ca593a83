//! Attachments on local disk.
//!
//! Files are referenced from the database by their URL path
//! (`uploads/<folder>/<name>`), which is also where the request boundary
//! serves them. Writes happen before the owning row is stored; callers pass
//! the database outcome through [`UploadStore::settle`] so a failed write
//! never leaves an orphan behind.

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use std::{
    ffi::OsStr,
    fmt,
    io,
    path::{Component, Path, PathBuf},
};
use tokio::{fs, io::AsyncWriteExt};

use crate::Result;

pub const URL_PREFIX: &str = "uploads";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Folder {
    Tweets,
    ProfilePictures,
}

impl Folder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tweets => "tweets",
            Self::ProfilePictures => "profile_pictures",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file received in a multipart form, not yet written anywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, folder: Folder, upload: &Upload) -> Result<String> {
        self.save_at(folder, upload, Utc::now()).await
    }

    /// Write `upload` under `folder`, named after `now` with a numeric suffix
    /// on collision, and return its reference.
    pub async fn save_at(&self, folder: Folder, upload: &Upload, now: DateTime<Utc>) -> Result<String> {
        let dir = self.root.join(folder.as_str());
        fs::create_dir_all(&dir).await?;

        let stem = now.format("%Y%m%d%H%M%S").to_string();
        let ext = extension(&upload.file_name);

        let mut counter = 0u32;
        loop {
            let name = if counter == 0 {
                format!("{stem}{ext}")
            } else {
                format!("{stem}{counter}{ext}")
            };
            let path = dir.join(&name);

            // `create_new` makes the name claim atomic.
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    if let Err(err) = write_all(&mut file, &upload.bytes).await {
                        drop(file);
                        fs::remove_file(&path).await.ok();
                        return Err(err.into());
                    }
                    let reference = format!("{URL_PREFIX}/{folder}/{name}");
                    tracing::debug!(%reference, size = upload.bytes.len(), "stored upload");
                    return Ok(reference);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => counter += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Map a reference back to its path on disk. `None` for anything that
    /// is not a plain relative path under the upload root.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference.strip_prefix(URL_PREFIX)?.strip_prefix('/')?;
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        (plain && relative.components().next().is_some()).then(|| self.root.join(relative))
    }

    /// Best-effort removal; failures are logged, never returned.
    pub async fn discard(&self, reference: &str) {
        let Some(path) = self.resolve(reference) else {
            tracing::warn!(%reference, "refusing to discard an unrecognised upload reference");
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(%reference, "discarded upload"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(%reference, error = %err, "could not discard upload"),
        }
    }

    /// Second phase of a file-then-row write: if the row write failed, remove
    /// the file that was written for it.
    pub async fn settle<T>(&self, written: Option<&str>, result: Result<T>) -> Result<T> {
        if result.is_err() {
            if let Some(reference) = written {
                self.discard(reference).await;
            }
        }
        result
    }
}

async fn write_all(file: &mut fs::File, bytes: &[u8]) -> io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// The lower-cased extension of `file_name` with its dot, or an empty string
/// when there is none worth keeping.
fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}
