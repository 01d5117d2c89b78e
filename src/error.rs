//! Error kinds surfaced by the catalog, metadata and player layers.
//!
//! None of these ever escape to the presentation layer as a panic: callers turn them into
//! banner text or session flags at the point the async call completes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Search or trending listing failed.
    #[error("Failed to fetch videos: {0}")]
    CatalogFetch(String),

    /// Title/thumbnail lookup for the selected video failed.
    #[error("Failed to load video details: {0}")]
    MetadataFetch(String),

    /// The embedded player could not be created or reported an error.
    #[error("Failed to start the player: {0}")]
    EngineBind(String),

    /// Settings could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),
}

impl AppError {
    /// Text shown to the user; the detail goes to the log instead.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CatalogFetch(_) => "Failed to fetch videos. Please try again.",
            Self::MetadataFetch(_) | Self::EngineBind(_) => {
                "Error loading video details. Please try again later."
            }
            Self::Settings(_) => "Could not save settings.",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
