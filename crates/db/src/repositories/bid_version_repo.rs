//! Repository for the `bid_versions` table.

use sqlx::PgExecutor;
use tenders_core::bid::BidContent;
use tenders_core::types::{DbId, Timestamp, Version};

use crate::models::bid::BidVersionRow;

const COLUMNS: &str = "bid_id, version, name, description, created_at";

pub struct BidVersionRepo;

impl BidVersionRepo {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        bid_id: DbId,
        version: Version,
        content: &BidContent,
        created_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bid_versions (bid_id, version, name, description, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(bid_id)
        .bind(version)
        .bind(&content.name)
        .bind(&content.description)
        .bind(created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        bid_id: DbId,
        version: Version,
    ) -> Result<Option<BidVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bid_versions WHERE bid_id = $1 AND version = $2");
        sqlx::query_as::<_, BidVersionRow>(&query)
            .bind(bid_id)
            .bind(version)
            .fetch_optional(executor)
            .await
    }

    /// All versions of a bid, oldest first.
    pub async fn list_by_bid<'e>(
        executor: impl PgExecutor<'e>,
        bid_id: DbId,
    ) -> Result<Vec<BidVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bid_versions
             WHERE bid_id = $1
             ORDER BY version ASC"
        );
        sqlx::query_as::<_, BidVersionRow>(&query)
            .bind(bid_id)
            .fetch_all(executor)
            .await
    }
}
