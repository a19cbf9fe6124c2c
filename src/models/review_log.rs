use super::ContentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submitted review. quality_level is stored already clamped to 0-5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub quality_level: i32,
    pub interval_days: u32,
    pub reviewed_at: DateTime<Utc>,
}
