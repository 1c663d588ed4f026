//! Bid, bid version, decision and feedback rows.

use serde::Serialize;
use sqlx::FromRow;
use tenders_core::bid::{Bid, BidContent, BidDecisionRecord, BidFeedback};
use tenders_core::store::{Snapshot, StoreError};
use tenders_core::types::{DbId, Timestamp, Version};

use super::parse_column;

/// A row from the `bids` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BidRow {
    pub id: DbId,
    pub tender_id: DbId,
    pub author_type: String,
    pub author_id: DbId,
    pub name: String,
    pub description: String,
    pub status: String,
    pub version: Version,
    pub created_at: Timestamp,
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Bid {
            author_type: parse_column("bids", "author_type", &row.author_type)?,
            status: parse_column("bids", "status", &row.status)?,
            id: row.id,
            tender_id: row.tender_id,
            author_id: row.author_id,
            name: row.name,
            description: row.description,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// A row from the `bid_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BidVersionRow {
    pub bid_id: DbId,
    pub version: Version,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

impl From<BidVersionRow> for Snapshot<BidContent> {
    fn from(row: BidVersionRow) -> Self {
        Snapshot {
            entity_id: row.bid_id,
            version: row.version,
            content: BidContent {
                name: row.name,
                description: row.description,
            },
            created_at: row.created_at,
        }
    }
}

/// A row from the `bid_decisions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BidDecisionRow {
    pub bid_id: DbId,
    pub decision: String,
    pub decided_by: DbId,
    pub decided_at: Timestamp,
}

impl TryFrom<BidDecisionRow> for BidDecisionRecord {
    type Error = StoreError;

    fn try_from(row: BidDecisionRow) -> Result<Self, Self::Error> {
        Ok(BidDecisionRecord {
            decision: parse_column("bid_decisions", "decision", &row.decision)?,
            bid_id: row.bid_id,
            decided_by: row.decided_by,
            decided_at: row.decided_at,
        })
    }
}

/// A row from the `bid_feedback` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BidFeedbackRow {
    pub id: DbId,
    pub bid_id: DbId,
    pub reviewer_id: DbId,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<BidFeedbackRow> for BidFeedback {
    fn from(row: BidFeedbackRow) -> Self {
        BidFeedback {
            id: row.id,
            bid_id: row.bid_id,
            reviewer_id: row.reviewer_id,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
