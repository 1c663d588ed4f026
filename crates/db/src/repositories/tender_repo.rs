//! Repository for the `tenders` table.

use sqlx::PgExecutor;
use tenders_core::pagination::Page;
use tenders_core::store::TenderFilter;
use tenders_core::tender::{Tender, TenderContent, TenderStatus};
use tenders_core::types::{DbId, Version};

use crate::models::tender::TenderRow;

/// Column list for tenders queries.
const COLUMNS: &str =
    "id, organization_id, name, description, service_type, status, version, created_at";

pub struct TenderRepo;

impl TenderRepo {
    pub async fn create<'e>(executor: impl PgExecutor<'e>, tender: &Tender) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tenders
                (id, organization_id, name, description, service_type, status, version, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(tender.id)
        .bind(tender.organization_id)
        .bind(&tender.name)
        .bind(&tender.description)
        .bind(tender.service_type.as_str())
        .bind(tender.status.as_str())
        .bind(tender.version)
        .bind(tender.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<TenderRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenders WHERE id = $1");
        sqlx::query_as::<_, TenderRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Read the row and hold a write lock on it until the transaction ends.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<TenderRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tenders WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, TenderRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Newest first, ties by id.
    pub async fn list<'e>(
        executor: impl PgExecutor<'e>,
        filter: &TenderFilter,
        page: Page,
    ) -> Result<Vec<TenderRow>, sqlx::Error> {
        let service_types: Vec<String> = filter
            .service_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();
        let query = format!(
            "SELECT {COLUMNS} FROM tenders
             WHERE ($1::uuid[] IS NULL OR organization_id = ANY($1))
               AND (cardinality($2::text[]) = 0 OR service_type = ANY($2))
             ORDER BY created_at DESC, id ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, TenderRow>(&query)
            .bind(filter.organization_ids.clone())
            .bind(service_types)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(executor)
            .await
    }

    pub async fn update_content<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        content: &TenderContent,
        version: Version,
    ) -> Result<TenderRow, sqlx::Error> {
        let query = format!(
            "UPDATE tenders SET name = $2, description = $3, service_type = $4, version = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TenderRow>(&query)
            .bind(id)
            .bind(&content.name)
            .bind(&content.description)
            .bind(content.service_type.as_str())
            .bind(version)
            .fetch_one(executor)
            .await
    }

    pub async fn update_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: TenderStatus,
    ) -> Result<TenderRow, sqlx::Error> {
        let query = format!("UPDATE tenders SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, TenderRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(executor)
            .await
    }
}
