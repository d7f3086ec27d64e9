//! Store settings rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `store_config` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfigEntry {
    pub key: String,
    pub value: String,
    pub is_public: bool,
    pub description: Option<String>,
    pub group: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub value_type: String,
    #[serde(rename = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /api/admin/config`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfigUpdate {
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
}

impl StoreConfigUpdate {
    /// Settings values are stored as text; numbers and booleans are written
    /// in their JSON form.
    #[must_use]
    pub fn value_text(&self) -> String {
        match &self.value {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serializes_like_the_admin_ui_expects() {
        let entry = StoreConfigEntry {
            key: "store_name".to_owned(),
            value: "Yemeni Market".to_owned(),
            is_public: true,
            description: None,
            group: "general".to_owned(),
            value_type: "text".to_owned(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["isPublic"], true);
        assert_eq!(value["type"], "text");
        assert_eq!(value["group"], "general");
    }

    #[test]
    fn test_update_value_text() {
        let update: StoreConfigUpdate =
            serde_json::from_value(json!({ "key": "smtp_port", "value": 587 })).unwrap();
        assert_eq!(update.value_text(), "587");
        let update: StoreConfigUpdate =
            serde_json::from_value(json!({ "key": "store_name", "value": "YM" })).unwrap();
        assert_eq!(update.value_text(), "YM");
    }
}
