use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::error::{StorageError, ValidationError};
use crate::filename::{extension_of, sanitize_filename, validate_relative_path};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Check a declared upload filename and return its sanitized form.
///
/// `allowed_extensions` holds lowercase extensions with their leading dot.
pub fn validate_upload(
    declared_filename: &str,
    allowed_extensions: &[String],
) -> Result<String, ValidationError> {
    let name = sanitize_filename(declared_filename)?;

    let ext = extension_of(&name).unwrap_or_default();
    if !allowed_extensions.iter().any(|allowed| *allowed == ext) {
        let shown = if ext.is_empty() { "(none)" } else { ext.as_str() };
        return Err(ValidationError::new(format!(
            "Invalid file type '{shown}'. Only {} allowed.",
            allowed_extensions.join(", ")
        )));
    }

    Ok(name)
}

/// The directory all uploads are written below.
///
/// Primary files sit at the top level, optional attachments in fixed
/// per-slot subdirectories. Nothing is ever overwritten.
pub struct UploadRoot {
    base_path: PathBuf,
    max_size: u64,
}

impl UploadRoot {
    /// Open the upload root, creating it if absent.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a relative path onto the upload root after validating it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let relative = validate_relative_path(relative).map_err(StorageError::UnsafePath)?;
        Ok(self.base_path.join(relative))
    }

    /// Check whether something already exists at `relative`.
    pub async fn exists(&self, relative: &str) -> Result<bool, StorageError> {
        let path = self.resolve(relative)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Stream `reader` to `relative`, refusing to replace an existing file.
    ///
    /// The destination is created with `create_new`, so two concurrent writers
    /// of the same name cannot both succeed. A failed write never leaves a
    /// partial file behind.
    pub async fn persist(
        &self,
        mut reader: BoxReader,
        relative: &str,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.resolve(relative)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::Conflict(relative.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let result = async {
            let mut buf = vec![0u8; 64 * 1024];
            let mut total_bytes: u64 = 0;

            loop {
                let n = reader.read(&mut buf).await?;
                if n == 0 {
                    break;
                }

                total_bytes += n as u64;
                if total_bytes > self.max_size {
                    return Err(StorageError::SizeLimitExceeded {
                        actual: total_bytes,
                        limit: self.max_size,
                    });
                }

                file.write_all(&buf[..n]).await?;
            }

            file.flush().await?;
            Ok::<u64, StorageError>(total_bytes)
        }
        .await;

        drop(file);

        match result {
            Ok(size) => {
                debug!(path = %dest.display(), size, "Upload persisted");
                Ok(dest)
            }
            Err(e) => {
                if let Err(rm_err) = fs::remove_file(&dest).await {
                    warn!(path = %dest.display(), error = %rm_err, "Failed to remove partial upload");
                }
                Err(e)
            }
        }
    }

    /// Delete a file written earlier. Returns `false` if it was already gone.
    pub async fn remove(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Open a stored file for download, returning the handle and its size.
    pub async fn open(&self, relative: &str) -> Result<(fs::File, u64), StorageError> {
        let path = self.resolve(relative)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(relative.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(StorageError::NotAFile(relative.to_string()));
        }

        let file = fs::File::open(&path).await?;
        Ok((file, meta.len()))
    }
}

/// Remove files from a synchronous context such as `Drop`.
///
/// The removal is spawned on the current tokio runtime when there is one and
/// runs inline otherwise. Files that are already gone are ignored.
pub fn remove_detached(paths: Vec<PathBuf>) {
    if paths.is_empty() {
        return;
    }

    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                for path in &paths {
                    if let Err(e) = fs::remove_file(path).await
                        && e.kind() != ErrorKind::NotFound
                    {
                        warn!(path = %path.display(), error = %e, "Failed to remove file");
                    }
                }
            });
        }
        Err(_) => {
            for path in &paths {
                if let Err(e) = std::fs::remove_file(path)
                    && e.kind() != ErrorKind::NotFound
                {
                    warn!(path = %path.display(), error = %e, "Failed to remove file");
                }
            }
        }
    }
}
