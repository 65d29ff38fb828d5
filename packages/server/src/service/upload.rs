use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use common::filename::{extension_of, sanitize_filename};
use common::storage::{
    BoxReader, StorageError, UploadRoot, ValidationError, remove_detached, validate_upload,
};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::{AttachmentSlot, MetadataField};
use crate::config::CatalogConfig;
use crate::entity::gapfill_model;
use crate::store::{CatalogStore, NewCatalogRecord, StoreError};

const ATTACHMENT_EXTENSION: &str = ".tsv";

/// A file supplied by the client: its declared name and its content.
pub struct FilePart {
    pub file_name: String,
    pub reader: BoxReader,
}

/// One upload as received from the client.
#[derive(Default)]
pub struct UploadRequest {
    pub primary: Option<FilePart>,
    pub attachments: HashMap<AttachmentSlot, FilePart>,
    /// Metadata text fields keyed by form field name.
    pub fields: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Io(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for UploadError {
    fn from(err: ValidationError) -> Self {
        UploadError::Validation(err.reason)
    }
}

/// How far an upload got. A failure after `Validating` cleans up every file
/// this request wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Validating,
    PrimaryFileSaved,
    OptionalFilesProcessed,
    MetadataValidated,
    Committed,
}

/// Files written by the current request.
///
/// Dropped before the row is committed, it removes them. That covers a
/// request abandoned mid-upload as well as one that returned an error.
struct UploadProgress {
    stage: UploadStage,
    written: Vec<PathBuf>,
}

impl UploadProgress {
    fn new() -> Self {
        Self {
            stage: UploadStage::Validating,
            written: Vec::new(),
        }
    }

    async fn discard(&mut self, uploads: &UploadRoot) {
        while let Some(path) = self.written.pop() {
            match uploads.remove(&path).await {
                Ok(_) => debug!(path = %path.display(), "Removed file from failed upload"),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to clean up uploaded file")
                }
            }
        }
    }
}

impl Drop for UploadProgress {
    fn drop(&mut self) {
        if self.stage == UploadStage::Committed || self.written.is_empty() {
            return;
        }
        warn!(
            stage = ?self.stage,
            files_written = self.written.len(),
            "Upload abandoned before commit, removing its files"
        );
        remove_detached(std::mem::take(&mut self.written));
    }
}

/// Relative paths of the optional attachments recorded for a model.
#[derive(Debug, Default)]
struct AttachmentPaths {
    growth_file: Option<String>,
    biomass_5mm: Option<String>,
    biomass_20mm: Option<String>,
}

impl AttachmentPaths {
    fn set(&mut self, slot: AttachmentSlot, path: String) {
        match slot {
            AttachmentSlot::GrowthFile => self.growth_file = Some(path),
            AttachmentSlot::Biomass5mM => self.biomass_5mm = Some(path),
            AttachmentSlot::Biomass20mM => self.biomass_20mm = Some(path),
        }
    }
}

/// Trimmed, non-blank metadata values.
struct Metadata(HashMap<MetadataField, String>);

impl Metadata {
    fn take(&mut self, field: MetadataField) -> Option<String> {
        self.0.remove(&field)
    }
}

/// Runs the upload workflow: validate, store the primary file, store the
/// optional attachments, validate metadata, record the row.
pub struct UploadService {
    store: Arc<dyn CatalogStore>,
    uploads: Arc<UploadRoot>,
    settings: CatalogConfig,
}

impl UploadService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        uploads: Arc<UploadRoot>,
        settings: CatalogConfig,
    ) -> Self {
        Self {
            store,
            uploads,
            settings,
        }
    }

    /// Register one model. Either the row and its primary file both exist
    /// afterwards, or neither does.
    pub async fn upload(
        &self,
        request: UploadRequest,
    ) -> Result<gapfill_model::Model, UploadError> {
        let mut progress = UploadProgress::new();

        let result = self.run(request, &mut progress).await;

        if let Err(e) = &result {
            warn!(
                stage = ?progress.stage,
                files_written = progress.written.len(),
                error = %e,
                "Upload failed"
            );
            progress.discard(&self.uploads).await;
        }

        result
    }

    #[instrument(skip_all)]
    async fn run(
        &self,
        request: UploadRequest,
        progress: &mut UploadProgress,
    ) -> Result<gapfill_model::Model, UploadError> {
        let UploadRequest {
            primary,
            mut attachments,
            fields,
        } = request;

        let primary = primary.ok_or_else(|| {
            UploadError::Validation("No main model file part ('modelUpload') provided.".into())
        })?;
        let file_name = validate_upload(&primary.file_name, &self.settings.allowed_extensions)?;

        let path = self
            .uploads
            .persist(primary.reader, &file_name)
            .await
            .map_err(|e| match e {
                StorageError::Conflict(_) => UploadError::Conflict(format!(
                    "Main file '{file_name}' already exists. Upload cancelled."
                )),
                StorageError::SizeLimitExceeded { limit, .. } => {
                    UploadError::Validation(format!("File exceeds maximum size of {limit} bytes"))
                }
                StorageError::UnsafePath(reason) => UploadError::Validation(reason.into()),
                other => UploadError::Io(format!("Failed to save main model file: {other}")),
            })?;
        progress.written.push(path);
        progress.stage = UploadStage::PrimaryFileSaved;
        info!(file_name = %file_name, "Primary file saved");

        let mut saved = AttachmentPaths::default();
        if self.settings.optional_attachments {
            for slot in AttachmentSlot::ALL {
                if let Some(part) = attachments.remove(&slot)
                    && let Some(relative) = self.save_attachment(slot, part, progress).await
                {
                    saved.set(slot, relative);
                }
            }
        } else if !attachments.is_empty() {
            debug!(count = attachments.len(), "Optional attachments disabled, ignoring");
        }
        progress.stage = UploadStage::OptionalFilesProcessed;

        let mut metadata = self.validate_metadata(&fields)?;
        progress.stage = UploadStage::MetadataValidated;

        let record = NewCatalogRecord {
            growth_media: metadata.take(MetadataField::GrowthMedia),
            gapfill_algorithm: metadata.take(MetadataField::GapfillAlgorithm),
            annotation_tool: metadata.take(MetadataField::AnnotationTool),
            biomass_type: metadata.take(MetadataField::BiomassType),
            growth_data: metadata.take(MetadataField::GrowthData),
            growth_yes_or_no: metadata.take(MetadataField::GrowthYesOrNo),
            file_link: file_name.clone(),
            file_name,
            growth_file: saved.growth_file,
            biomass_file_5mm: saved.biomass_5mm,
            biomass_file_20mm: saved.biomass_20mm,
        };

        let model = self.store.insert(record).await?;
        progress.stage = UploadStage::Committed;
        info!(id = model.id, file_name = %model.file_name, "Model registered");

        Ok(model)
    }

    /// Store one optional attachment. Returns its relative path, or `None`
    /// when the slot ends up empty. Never fails the upload.
    async fn save_attachment(
        &self,
        slot: AttachmentSlot,
        part: FilePart,
        progress: &mut UploadProgress,
    ) -> Option<String> {
        let name = match sanitize_filename(&part.file_name) {
            Ok(name) => name,
            Err(e) => {
                warn!(slot = slot.form_field(), reason = e.message(), "Skipping optional file");
                return None;
            }
        };
        if extension_of(&name).as_deref() != Some(ATTACHMENT_EXTENSION) {
            warn!(slot = slot.form_field(), file_name = %name, "Skipping optional file that is not .tsv");
            return None;
        }

        let relative = format!("{}/{}", slot.subdir(), name);
        match self.uploads.persist(part.reader, &relative).await {
            Ok(path) => {
                progress.written.push(path);
                Some(relative)
            }
            Err(StorageError::Conflict(_)) => {
                info!(path = %relative, "Optional file already exists, reusing it");
                Some(relative)
            }
            Err(e) => {
                error!(slot = slot.form_field(), path = %relative, error = %e, "Failed to save optional file");
                None
            }
        }
    }

    fn validate_metadata(&self, fields: &HashMap<String, String>) -> Result<Metadata, UploadError> {
        let values: HashMap<MetadataField, String> = MetadataField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = fields.get(field.name())?.trim();
                (!value.is_empty()).then(|| (field, value.to_string()))
            })
            .collect();

        let missing: Vec<&str> = self
            .settings
            .required_fields
            .iter()
            .filter(|field| !values.contains_key(field))
            .map(|field| field.name())
            .collect();
        if !missing.is_empty() {
            return Err(UploadError::Validation(format!(
                "Missing required form fields: {}",
                missing.join(", ")
            )));
        }

        if let Some(growth) = values.get(&MetadataField::GrowthYesOrNo)
            && growth != "Yes"
            && growth != "No"
        {
            return Err(UploadError::Validation(
                "Invalid value for 'growth_yes_or_no'. Must be 'Yes' or 'No'.".into(),
            ));
        }

        Ok(Metadata(values))
    }
}
