//! Tender and tender version rows.

use serde::Serialize;
use sqlx::FromRow;
use tenders_core::store::{Snapshot, StoreError};
use tenders_core::tender::{Tender, TenderContent};
use tenders_core::types::{DbId, Timestamp, Version};

use super::parse_column;

/// A row from the `tenders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenderRow {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub status: String,
    pub version: Version,
    pub created_at: Timestamp,
}

impl TryFrom<TenderRow> for Tender {
    type Error = StoreError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Tender {
            service_type: parse_column("tenders", "service_type", &row.service_type)?,
            status: parse_column("tenders", "status", &row.status)?,
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// A row from the `tender_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenderVersionRow {
    pub tender_id: DbId,
    pub version: Version,
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub created_at: Timestamp,
}

impl TryFrom<TenderVersionRow> for Snapshot<TenderContent> {
    type Error = StoreError;

    fn try_from(row: TenderVersionRow) -> Result<Self, Self::Error> {
        Ok(Snapshot {
            entity_id: row.tender_id,
            version: row.version,
            content: TenderContent {
                service_type: parse_column(
                    "tender_versions",
                    "service_type",
                    &row.service_type,
                )?,
                name: row.name,
                description: row.description,
            },
            created_at: row.created_at,
        })
    }
}
