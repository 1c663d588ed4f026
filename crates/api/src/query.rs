//! Query parameter types for API handlers.
//!
//! Required string parameters default to empty so a missing value reaches
//! the core and is reported as a JSON error instead of an extractor
//! rejection. Pagination fields are repeated per struct: `serde(flatten)`
//! does not deserialize numbers from query strings.

use serde::Deserialize;
use tenders_core::error::CoreError;
use tenders_core::tender::ServiceType;

/// `GET /tenders?service_type=Construction,Delivery&limit=&offset=`
#[derive(Debug, Deserialize)]
pub struct TenderListParams {
    pub service_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TenderListParams {
    /// Comma-separated service types; blank entries are ignored.
    pub fn service_types(&self) -> Result<Vec<ServiceType>, CoreError> {
        self.service_type
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

/// Listings scoped to the acting user (`?username=&limit=&offset=`).
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    #[serde(default)]
    pub username: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?username=`
#[derive(Debug, Deserialize)]
pub struct ActorParams {
    #[serde(default)]
    pub username: String,
}

/// `?status=&username=`
#[derive(Debug, Deserialize)]
pub struct StatusUpdateParams {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub username: String,
}

/// `?username=&version=`; `version` turns the edit into a compare-and-swap.
#[derive(Debug, Deserialize)]
pub struct EditParams {
    #[serde(default)]
    pub username: String,
    pub version: Option<i32>,
}

/// `?decision=&username=`
#[derive(Debug, Deserialize)]
pub struct DecisionParams {
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub username: String,
}

/// `?bidFeedback=&username=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackParams {
    #[serde(default)]
    pub bid_feedback: String,
    #[serde(default)]
    pub username: String,
}

/// `?authorUsername=&requesterUsername=&limit=&offset=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewParams {
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub requester_username: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
