use std::path::PathBuf;

use common::retry::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::catalog::MetadataField;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty or `*` allows any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URL. When set, the individual parts are ignored.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            encode_userinfo(&self.user),
            encode_userinfo(&self.password),
            self.host,
            self.port,
            self.name
        )
    }
}

/// Percent-encode a URL userinfo component.
fn encode_userinfo(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub upload_root: PathBuf,
    /// Maximum request body and per-file size, in bytes.
    pub max_upload_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Extensions accepted for the primary file, lowercase with leading dot.
    pub allowed_extensions: Vec<String>,
    pub required_fields: Vec<MetadataField>,
    /// Number of rows shown on the index page. `None` shows everything.
    pub index_page_limit: Option<u64>,
    /// Whether the growth/biomass attachment slots are processed.
    pub optional_attachments: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![".xml".into(), ".tsv".into()],
            required_fields: vec![
                MetadataField::GrowthMedia,
                MetadataField::GapfillAlgorithm,
                MetadataField::AnnotationTool,
                MetadataField::GrowthYesOrNo,
            ],
            index_page_limit: Some(5),
            optional_attachments: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "gapfill")?
            .set_default("database.password", "")?
            .set_default("database.name", "gapfill_db")?
            .set_default("database.max_connections", 10)?
            .set_default("storage.upload_root", "./uploads")?
            .set_default("storage.max_upload_size", 16 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., GAPFILL__DATABASE__PASSWORD)
            .add_source(Environment::with_prefix("GAPFILL").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.catalog.normalize()?;
        Ok(config)
    }
}

impl CatalogConfig {
    /// Lowercase extensions, add missing leading dots and reject an empty set.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        let mut normalized: Vec<String> = Vec::with_capacity(self.allowed_extensions.len());
        for ext in &self.allowed_extensions {
            let ext = ext.trim().to_ascii_lowercase();
            if ext.is_empty() || ext == "." {
                continue;
            }
            let ext = if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            };
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }

        if normalized.is_empty() {
            return Err(ConfigError::Message(
                "catalog.allowed_extensions must name at least one extension".into(),
            ));
        }

        self.allowed_extensions = normalized;
        Ok(())
    }
}
