use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::storage::{BoxReader, remove_detached};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{AttachmentSlot, MetadataField, PRIMARY_FILE_FIELDS};
use crate::error::AppError;
use crate::service::{FilePart, UploadRequest};

struct StagedFile {
    file_name: String,
    path: PathBuf,
}

/// A multipart upload with every file part spooled to a temporary file.
///
/// The workflow needs the parts in a fixed order while clients may send them
/// in any order. Temporary files are removed when this value is dropped.
#[derive(Default)]
pub struct StagedUpload {
    primary: Option<StagedFile>,
    attachments: HashMap<AttachmentSlot, StagedFile>,
    fields: HashMap<String, String>,
    temp_paths: Vec<PathBuf>,
}

impl StagedUpload {
    /// Read the whole multipart body. Unknown parts are ignored.
    pub async fn from_multipart(mut multipart: Multipart, max_size: u64) -> Result<Self, AppError> {
        let mut staged = StagedUpload::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if PRIMARY_FILE_FIELDS.contains(&name.as_str()) {
                if staged.primary.is_some() {
                    debug!(field = %name, "Ignoring extra primary file part");
                    continue;
                }
                let file = staged.stage_file(field, max_size).await?;
                staged.primary = Some(file);
            } else if let Some(slot) = AttachmentSlot::from_form_field(&name) {
                let declared = field.file_name().unwrap_or_default();
                if declared.trim().is_empty() || staged.attachments.contains_key(&slot) {
                    continue;
                }
                let file = staged.stage_file(field, max_size).await?;
                staged.attachments.insert(slot, file);
            } else if MetadataField::from_name(&name).is_some() {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read field '{name}': {e}"))
                })?;
                staged.fields.insert(name, text.trim().to_string());
            } else {
                debug!(field = %name, "Ignoring unknown multipart field");
            }
        }

        Ok(staged)
    }

    /// Stream a multipart field to a temp file.
    async fn stage_file(
        &mut self,
        mut field: Field<'_>,
        max_size: u64,
    ) -> Result<StagedFile, AppError> {
        let file_name = field.file_name().unwrap_or_default().to_string();
        let temp_path = std::env::temp_dir().join(format!("gapfill-upload-{}", Uuid::new_v4()));
        self.temp_paths.push(temp_path.clone());

        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(StagedFile {
            file_name,
            path: temp_path,
        })
    }

    /// Reopen the staged files as readers for the upload workflow.
    pub async fn to_request(&self) -> Result<UploadRequest, AppError> {
        let primary = match &self.primary {
            Some(file) => Some(open_staged(file).await?),
            None => None,
        };

        let mut attachments = HashMap::with_capacity(self.attachments.len());
        for (slot, file) in &self.attachments {
            attachments.insert(*slot, open_staged(file).await?);
        }

        Ok(UploadRequest {
            primary,
            attachments,
            fields: self.fields.clone(),
        })
    }
}

async fn open_staged(file: &StagedFile) -> Result<FilePart, AppError> {
    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
    let reader: BoxReader = Box::new(handle);
    Ok(FilePart {
        file_name: file.file_name.clone(),
        reader,
    })
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        remove_detached(std::mem::take(&mut self.temp_paths));
    }
}
