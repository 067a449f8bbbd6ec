//! Type definitions for the Notion API module.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One page of a cursor-paginated Notion listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// A final page holding `results`.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            object: self.object,
            results: self.results.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

/// Every item of a fully drained listing, in source order.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub total_fetched: usize,
    pub pages_fetched: u32,
}

/// How a status property is typed in the database schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPropertyKind {
    Select,
    Status,
}

impl StatusPropertyKind {
    pub fn from_schema_type(kind: &str) -> Option<Self> {
        match kind {
            "select" => Some(Self::Select),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Status => "status",
        }
    }
}

/// `property equals value` filter for a database query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    pub property: String,
    pub kind: StatusPropertyKind,
    pub value: String,
}

impl StatusFilter {
    pub fn to_json(&self) -> Value {
        json!({
            "property": self.property,
            (self.kind.as_str()): { "equals": self.value }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_json_uses_property_kind() {
        let filter = StatusFilter {
            property: "상태".to_string(),
            kind: StatusPropertyKind::Status,
            value: "발행됨".to_string(),
        };
        assert_eq!(
            filter.to_json(),
            json!({"property": "상태", "status": {"equals": "발행됨"}})
        );
    }

    #[test]
    fn paginated_response_defaults_missing_cursor() {
        let page: PaginatedResponse<u8> =
            serde_json::from_value(json!({"object": "list", "results": [1, 2]})).unwrap();
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }
}
