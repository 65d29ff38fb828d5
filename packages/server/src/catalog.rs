//! Names shared by the upload form, the workflow and the configuration.

use serde::{Deserialize, Serialize};

/// A metadata text field accepted alongside an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    GrowthMedia,
    GapfillAlgorithm,
    AnnotationTool,
    BiomassType,
    GrowthData,
    GrowthYesOrNo,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        MetadataField::GrowthMedia,
        MetadataField::GapfillAlgorithm,
        MetadataField::AnnotationTool,
        MetadataField::BiomassType,
        MetadataField::GrowthData,
        MetadataField::GrowthYesOrNo,
    ];

    /// Form field and column name.
    pub fn name(self) -> &'static str {
        match self {
            MetadataField::GrowthMedia => "growth_media",
            MetadataField::GapfillAlgorithm => "gapfill_algorithm",
            MetadataField::AnnotationTool => "annotation_tool",
            MetadataField::BiomassType => "biomass_type",
            MetadataField::GrowthData => "growth_data",
            MetadataField::GrowthYesOrNo => "growth_yes_or_no",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// One of the fixed optional attachment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    GrowthFile,
    Biomass5mM,
    Biomass20mM,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 3] = [
        AttachmentSlot::GrowthFile,
        AttachmentSlot::Biomass5mM,
        AttachmentSlot::Biomass20mM,
    ];

    /// Multipart part name carrying this slot's file.
    pub fn form_field(self) -> &'static str {
        match self {
            AttachmentSlot::GrowthFile => "growth_file_upload",
            AttachmentSlot::Biomass5mM => "biomass_5mM_upload",
            AttachmentSlot::Biomass20mM => "biomass_20mM_upload",
        }
    }

    /// Subdirectory of the upload root the slot's files are written to.
    pub fn subdir(self) -> &'static str {
        match self {
            AttachmentSlot::GrowthFile => "growth_file",
            AttachmentSlot::Biomass5mM => "5mM",
            AttachmentSlot::Biomass20mM => "20mM",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.form_field() == name)
    }
}

/// Multipart part names accepted for the primary model file.
pub const PRIMARY_FILE_FIELDS: [&str; 2] = ["modelUpload", "xmlUpload"];
