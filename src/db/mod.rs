use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};

#[cfg(target_arch = "wasm32")]
const SETTINGS_KEY: &str = "tubemusic.catalog_settings";

/// Catalog connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub api_key: String,
    #[serde(default = "default_region_code")]
    pub region_code: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_category_id")]
    pub category_id: String,
}

fn default_region_code() -> String {
    "US".to_string()
}

fn default_max_results() -> u32 {
    27
}

// YouTube's "Music" video category.
fn default_category_id() -> String {
    "10".to_string()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            api_key: option_env!("YOUTUBE_API_KEY").unwrap_or_default().to_string(),
            region_code: default_region_code(),
            max_results: default_max_results(),
            category_id: default_category_id(),
        }
    }
}

impl CatalogSettings {
    /// Trim user input and fall back to defaults for blank fields.
    pub fn normalized(mut self) -> Self {
        self.api_key = self.api_key.trim().to_string();
        self.region_code = self.region_code.trim().to_ascii_uppercase();
        if self.region_code.len() != 2 {
            self.region_code = default_region_code();
        }
        self.max_results = self.max_results.clamp(1, 50);
        if self.category_id.trim().is_empty() {
            self.category_id = default_category_id();
        }
        self
    }
}

fn settings_error(err: impl std::fmt::Display) -> AppError {
    AppError::Settings(err.to_string())
}

#[cfg(target_arch = "wasm32")]
pub async fn save_settings(settings: CatalogSettings) -> Result<()> {
    LocalStorage::set(SETTINGS_KEY, settings).map_err(settings_error)
}

#[cfg(target_arch = "wasm32")]
pub async fn load_settings() -> Result<CatalogSettings> {
    match LocalStorage::get::<CatalogSettings>(SETTINGS_KEY) {
        Ok(settings) => Ok(settings.normalized()),
        Err(_) => Ok(CatalogSettings::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn save_settings(settings: CatalogSettings) -> Result<()> {
    let conn = get_db_connection()?;
    let settings_json = serde_json::to_string(&settings).map_err(settings_error)?;

    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES ('catalog_settings', ?1)",
        [&settings_json],
    )
    .map_err(settings_error)?;

    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_settings() -> Result<CatalogSettings> {
    let conn = get_db_connection()?;

    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM settings WHERE key = 'catalog_settings'",
        [],
        |row: &rusqlite::Row| row.get(0),
    );

    match result {
        Ok(json) => serde_json::from_str::<CatalogSettings>(&json)
            .map(CatalogSettings::normalized)
            .map_err(settings_error),
        Err(_) => Ok(CatalogSettings::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn get_db_connection() -> Result<rusqlite::Connection> {
    let data_dir = dirs::data_local_dir()
        .map(|dir| dir.join("tubemusic"))
        .unwrap_or_else(|| std::path::PathBuf::from(".tubemusic"));
    std::fs::create_dir_all(&data_dir).map_err(settings_error)?;

    let conn = rusqlite::Connection::open(data_dir.join("tubemusic.db"))
        .map_err(|e| AppError::Settings(format!("Failed to open database: {e}")))?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .map_err(settings_error)?;
    Ok(conn)
}
