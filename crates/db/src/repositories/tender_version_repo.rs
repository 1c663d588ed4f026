//! Repository for the `tender_versions` table.
//!
//! Rows are immutable snapshots written inside the edit/rollback transaction.

use sqlx::PgExecutor;
use tenders_core::tender::TenderContent;
use tenders_core::types::{DbId, Timestamp, Version};

use crate::models::tender::TenderVersionRow;

const COLUMNS: &str = "tender_id, version, name, description, service_type, created_at";

pub struct TenderVersionRepo;

impl TenderVersionRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        tender_id: DbId,
        version: Version,
        content: &TenderContent,
        created_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tender_versions (tender_id, version, name, description, service_type, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(tender_id)
        .bind(version)
        .bind(&content.name)
        .bind(&content.description)
        .bind(content.service_type.as_str())
        .bind(created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        tender_id: DbId,
        version: Version,
    ) -> Result<Option<TenderVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tender_versions
             WHERE tender_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, TenderVersionRow>(&query)
            .bind(tender_id)
            .bind(version)
            .fetch_optional(executor)
            .await
    }

    /// All versions of a tender, oldest first.
    pub async fn list_by_tender<'e>(
        executor: impl PgExecutor<'e>,
        tender_id: DbId,
    ) -> Result<Vec<TenderVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tender_versions
             WHERE tender_id = $1
             ORDER BY version ASC"
        );
        sqlx::query_as::<_, TenderVersionRow>(&query)
            .bind(tender_id)
            .fetch_all(executor)
            .await
    }
}
