use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::gapfill_model;

/// Response DTO for a single catalog record.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CatalogRecordResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "LB")]
    pub growth_media: String,
    #[schema(example = "gapseq")]
    pub gapfill_algorithm: Option<String>,
    #[schema(example = "prokka")]
    pub annotation_tool: Option<String>,
    pub biomass_type: Option<String>,
    pub growth_data: Option<String>,
    /// `Yes` or `No`.
    #[schema(example = "Yes")]
    pub growth_yes_or_no: Option<String>,
    /// Sanitized name of the primary file.
    #[schema(example = "model1.xml")]
    pub file_name: String,
    /// Primary file path relative to the upload root; download it from
    /// `/download/{file_link}`.
    #[schema(example = "model1.xml")]
    pub file_link: String,
    #[schema(example = "growth_file/growth.tsv")]
    pub growth_file: Option<String>,
    #[serde(rename = "biomass_file_5mM")]
    #[schema(example = "5mM/biomass.tsv")]
    pub biomass_file_5mm: Option<String>,
    #[serde(rename = "biomass_file_20mM")]
    pub biomass_file_20mm: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<gapfill_model::Model> for CatalogRecordResponse {
    fn from(model: gapfill_model::Model) -> Self {
        Self {
            id: model.id,
            growth_media: model.growth_media,
            gapfill_algorithm: model.gapfill_algorithm,
            annotation_tool: model.annotation_tool,
            biomass_type: model.biomass_type,
            growth_data: model.growth_data,
            growth_yes_or_no: model.growth_yes_or_no,
            file_name: model.file_name,
            file_link: model.file_link,
            growth_file: model.growth_file,
            biomass_file_5mm: model.biomass_file_5mm,
            biomass_file_20mm: model.biomass_file_20mm,
            created_at: model.created_at,
        }
    }
}

/// Form posted by the search box on the catalog page.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub media_search: String,
}
