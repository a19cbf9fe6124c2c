//! Error type shared by the persistence, export and configuration layers.
//!
//! The scheduler itself never fails; everything around it reports through
//! [`StudyError`].

use crate::models::ContentType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Unknown config key '{0}' (expected study.user_id, study.session_limit or database.path)")]
    UnknownConfigKey(String),

    #[error("Invalid value '{value}' for config key '{key}'")]
    InvalidConfigValue { key: String, value: String },

    #[error("Unknown content type '{0}' (expected flashcard, book_section or legal_article)")]
    UnknownContentType(String),

    /// A review was submitted for a content unit the user never scheduled.
    #[error("'{content_id}' ({content_type}) is not scheduled for user '{user_id}'")]
    NotScheduled {
        user_id: String,
        content_id: String,
        content_type: ContentType,
    },

    #[error("Stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("Database connection lock was poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StudyError>;
