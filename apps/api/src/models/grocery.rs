use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the free text inside the grocery document.
pub const CONTENT_FIELD: &str = "content";

/// The shared grocery list singleton.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroceryList {
    pub content: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl GroceryList {
    /// Reads the list out of a raw document. A missing or non-string `content`
    /// field reads as an empty list.
    pub fn from_document(data: &Map<String, Value>, updated_at: Option<DateTime<Utc>>) -> Self {
        let content = data
            .get(CONTENT_FIELD)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        Self {
            content,
            updated_at,
        }
    }

    /// The partial document written on save. Merged into the stored document field by field.
    pub fn patch(content: &str) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert(CONTENT_FIELD.to_string(), Value::String(content.to_string()));
        patch
    }
}
