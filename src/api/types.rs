// src/api/types.rs
//! Request and response shapes shared by the Notion client.

use serde::{Deserialize, Serialize};

/// Generic paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Result of draining a paginated endpoint.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySort {
    pub property: String,
    pub direction: SortDirection,
}

/// Body of a database query, minus the pagination fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<PropertySort>,
}

impl DatabaseQuery {
    /// Every row, in Notion's default order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, property: impl Into<String>, direction: SortDirection) -> Self {
        self.sorts.push(PropertySort {
            property: property.into(),
            direction,
        });
        self
    }

    /// Request body for one page of results.
    pub fn page_body(&self, page_size: u32, cursor: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}));
        body["page_size"] = serde_json::json!(page_size);
        if let Some(cursor) = cursor {
            body["start_cursor"] = serde_json::json!(cursor);
        }
        body
    }
}
