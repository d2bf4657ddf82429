//! Request/response bodies shared by the HTTP and direct-invocation paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Page reported when the caller does not say which page was visited.
pub const DEFAULT_PAGE: &str = "home";

/// Visit notification. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
    /// Missing or `null` both mean [`DEFAULT_PAGE`].
    #[serde(default = "default_page", deserialize_with = "page_or_default")]
    pub page: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for VisitRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            user_agent: None,
        }
    }
}

fn default_page() -> String {
    DEFAULT_PAGE.into()
}

fn page_or_default<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_page))
}

/// Counter value as seen by the caller.
///
/// On failure `count` is 0 and `success` is false; the caller never sees the
/// underlying error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitResponse {
    pub count: u64,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

impl VisitResponse {
    pub fn success(count: u64) -> Self {
        Self {
            count,
            timestamp: Utc::now(),
            success: true,
        }
    }

    pub fn failure() -> Self {
        Self {
            count: 0,
            timestamp: Utc::now(),
            success: false,
        }
    }
}
