//! A row of the environment table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One key/value configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentEntry {
    pub key_code: String,
    pub values: String,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl EnvironmentEntry {
    /// A freshly created entry stamped with the current time.
    pub fn new(key_code: impl Into<String>, values: impl Into<String>, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key_code: key_code.into(),
            values: values.into(),
            created_by: created_by.into(),
            updated_by: None,
            created_at: now,
            updated_at: Some(now),
        }
    }

    /// Copy with the value replaced by a mask.
    pub fn masked(&self) -> Self {
        Self {
            values: "********".to_string(),
            ..self.clone()
        }
    }
}
