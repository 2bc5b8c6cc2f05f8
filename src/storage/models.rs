//! Data models for client storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub dark_mode: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
