use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded metabolic model and its descriptive metadata.
///
/// Rows are written once by the upload workflow and never updated.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gapfill_models")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    // Metadata values are free text; file and path columns stay varchar.
    #[sea_orm(column_type = "Text")]
    pub growth_media: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub gapfill_algorithm: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub annotation_tool: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub biomass_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub growth_data: Option<String>,
    /// `Yes` or `No`.
    #[sea_orm(column_type = "Text", nullable)]
    pub growth_yes_or_no: Option<String>,

    /// Sanitized base name of the primary file.
    #[sea_orm(unique)]
    pub file_name: String,

    /// Path of the primary file relative to the upload root.
    pub file_link: String,

    pub growth_file: Option<String>,

    #[sea_orm(column_name = "biomass_file_5mM")]
    #[serde(rename = "biomass_file_5mM")]
    pub biomass_file_5mm: Option<String>,

    #[sea_orm(column_name = "biomass_file_20mM")]
    #[serde(rename = "biomass_file_20mM")]
    pub biomass_file_20mm: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
