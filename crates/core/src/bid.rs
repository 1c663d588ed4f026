//! Bid domain types: author kinds, statuses, decisions, feedback, and the
//! create/patch DTOs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp, Version};

/// Maximum length of a feedback text.
pub const MAX_FEEDBACK_LEN: usize = 1000;

/// Who a bid is submitted on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorType {
    Organization,
    User,
}

impl AuthorType {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorType::Organization => "Organization",
            AuthorType::User => "User",
        }
    }
}

impl fmt::Display for AuthorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Organization" => Ok(AuthorType::Organization),
            "User" => Ok(AuthorType::User),
            other => Err(CoreError::Validation(format!(
                "Unknown author type '{other}'"
            ))),
        }
    }
}

/// Bid lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
    Approved,
    Rejected,
}

impl BidStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BidStatus::Created => "Created",
            BidStatus::Published => "Published",
            BidStatus::Canceled => "Canceled",
            BidStatus::Approved => "Approved",
            BidStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for BidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BidStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(BidStatus::Created),
            "Published" => Ok(BidStatus::Published),
            "Canceled" => Ok(BidStatus::Canceled),
            "Approved" => Ok(BidStatus::Approved),
            "Rejected" => Ok(BidStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown bid status '{other}'"
            ))),
        }
    }
}

/// Verdict issued on a published bid by the tender owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        }
    }

    /// The bid status a decision moves the bid into.
    pub fn resulting_status(self) -> BidStatus {
        match self {
            Decision::Approved => BidStatus::Approved,
            Decision::Rejected => BidStatus::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(Decision::Approved),
            "Rejected" => Ok(Decision::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown decision '{other}'. Must be one of: Approved, Rejected"
            ))),
        }
    }
}

/// Identifies a bid author: an employee (`User`) or an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorRef {
    pub author_type: AuthorType,
    pub author_id: DbId,
}

impl AuthorRef {
    pub fn user(id: DbId) -> Self {
        Self {
            author_type: AuthorType::User,
            author_id: id,
        }
    }

    pub fn organization(id: DbId) -> Self {
        Self {
            author_type: AuthorType::Organization,
            author_id: id,
        }
    }
}

/// The editable (versioned) fields of a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidContent {
    pub name: String,
    pub description: String,
}

/// The live bid record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: DbId,
    pub tender_id: DbId,
    pub author_type: AuthorType,
    pub author_id: DbId,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub version: Version,
    pub created_at: Timestamp,
}

impl Bid {
    pub fn author(&self) -> AuthorRef {
        AuthorRef {
            author_type: self.author_type,
            author_id: self.author_id,
        }
    }

    pub fn content(&self) -> BidContent {
        BidContent {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    pub fn set_content(&mut self, content: BidContent) {
        self.name = content.name;
        self.description = content.description;
    }
}

/// Request body for creating a bid.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBid {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: String,
    pub tender_id: DbId,
    pub author_type: AuthorType,
    pub author_id: DbId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub creator_username: String,
}

/// Partial update of a bid's editable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BidPatch {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: Option<String>,
}

impl BidPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Produce the content that results from applying this patch.
    pub fn apply(&self, content: &BidContent) -> Result<BidContent, CoreError> {
        self.validate()?;
        if self.is_empty() {
            return Err(CoreError::Validation(
                "Patch must set at least one of name, description".into(),
            ));
        }
        Ok(BidContent {
            name: self.name.clone().unwrap_or_else(|| content.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| content.description.clone()),
        })
    }
}

/// The recorded decision on a bid. At most one per bid; a later decision
/// replaces an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidDecisionRecord {
    pub bid_id: DbId,
    pub decision: Decision,
    pub decided_by: DbId,
    pub decided_at: Timestamp,
}

/// Review text left on a bid by the tender owner. Single slot per bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidFeedback {
    pub id: DbId,
    pub bid_id: DbId,
    pub reviewer_id: DbId,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validate a feedback text (non-empty, bounded).
pub fn validate_feedback(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Feedback must not be empty".into()));
    }
    if text.chars().count() > MAX_FEEDBACK_LEN {
        return Err(CoreError::Validation(format!(
            "Feedback must be at most {MAX_FEEDBACK_LEN} characters"
        )));
    }
    Ok(())
}
