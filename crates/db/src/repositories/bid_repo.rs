//! Repositories for `bids`, `bid_decisions` and `bid_feedback`.

use sqlx::PgExecutor;
use tenders_core::bid::{AuthorRef, Bid, BidContent, BidDecisionRecord, BidFeedback, BidStatus};
use tenders_core::pagination::Page;
use tenders_core::store::BidFilter;
use tenders_core::types::{DbId, Version};

use crate::models::bid::{BidDecisionRow, BidFeedbackRow, BidRow};

/// Column list for bids queries.
const COLUMNS: &str =
    "id, tender_id, author_type, author_id, name, description, status, version, created_at";

/// Split author refs into the parallel arrays `UNNEST` expects.
fn author_arrays(authors: &[AuthorRef]) -> (Vec<String>, Vec<DbId>) {
    authors
        .iter()
        .map(|a| (a.author_type.as_str().to_string(), a.author_id))
        .unzip()
}

pub struct BidRepo;

impl BidRepo {
    pub async fn create<'e>(executor: impl PgExecutor<'e>, bid: &Bid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bids
                (id, tender_id, author_type, author_id, name, description, status, version, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(bid.id)
        .bind(bid.tender_id)
        .bind(bid.author_type.as_str())
        .bind(bid.author_id)
        .bind(&bid.name)
        .bind(&bid.description)
        .bind(bid.status.as_str())
        .bind(bid.version)
        .bind(bid.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<BidRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bids WHERE id = $1");
        sqlx::query_as::<_, BidRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Read the row and hold a write lock on it until the transaction ends.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<BidRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bids WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BidRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Newest first, ties by id.
    pub async fn list<'e>(
        executor: impl PgExecutor<'e>,
        filter: &BidFilter,
        page: Page,
    ) -> Result<Vec<BidRow>, sqlx::Error> {
        let (author_types, author_ids) = match &filter.authors {
            Some(authors) => {
                let (types, ids) = author_arrays(authors);
                (Some(types), Some(ids))
            }
            None => (None, None),
        };
        let statuses: Option<Vec<String>> = filter
            .statuses
            .as_ref()
            .map(|s| s.iter().map(|st| st.as_str().to_string()).collect());

        let query = format!(
            "SELECT {COLUMNS} FROM bids
             WHERE ($1::uuid IS NULL OR tender_id = $1)
               AND ($2::text[] IS NULL
                    OR (author_type, author_id) IN (SELECT * FROM UNNEST($2::text[], $3::uuid[])))
               AND ($4::text[] IS NULL OR status = ANY($4))
             ORDER BY created_at DESC, id ASC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, BidRow>(&query)
            .bind(filter.tender_id)
            .bind(author_types)
            .bind(author_ids)
            .bind(statuses)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(executor)
            .await
    }

    pub async fn update_content<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        content: &BidContent,
        version: Version,
    ) -> Result<BidRow, sqlx::Error> {
        let query = format!(
            "UPDATE bids SET name = $2, description = $3, version = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BidRow>(&query)
            .bind(id)
            .bind(&content.name)
            .bind(&content.description)
            .bind(version)
            .fetch_one(executor)
            .await
    }

    pub async fn update_status<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        status: BidStatus,
    ) -> Result<BidRow, sqlx::Error> {
        let query = format!("UPDATE bids SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, BidRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_one(executor)
            .await
    }
}

pub struct BidDecisionRepo;

impl BidDecisionRepo {
    /// Insert or replace the decision for a bid.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        record: &BidDecisionRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bid_decisions (bid_id, decision, decided_by, decided_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (bid_id) DO UPDATE SET
                decision = EXCLUDED.decision,
                decided_by = EXCLUDED.decided_by,
                decided_at = EXCLUDED.decided_at",
        )
        .bind(record.bid_id)
        .bind(record.decision.as_str())
        .bind(record.decided_by)
        .bind(record.decided_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        bid_id: DbId,
    ) -> Result<Option<BidDecisionRow>, sqlx::Error> {
        sqlx::query_as::<_, BidDecisionRow>(
            "SELECT bid_id, decision, decided_by, decided_at FROM bid_decisions WHERE bid_id = $1",
        )
        .bind(bid_id)
        .fetch_optional(executor)
        .await
    }
}

const FEEDBACK_COLUMNS: &str = "id, bid_id, reviewer_id, description, created_at, updated_at";

pub struct BidFeedbackRepo;

impl BidFeedbackRepo {
    /// Insert or overwrite the single feedback slot of a bid. An existing
    /// row keeps its id and `created_at`.
    pub async fn upsert<'e>(
        executor: impl PgExecutor<'e>,
        feedback: &BidFeedback,
    ) -> Result<BidFeedbackRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO bid_feedback (id, bid_id, reviewer_id, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (bid_id) DO UPDATE SET
                reviewer_id = EXCLUDED.reviewer_id,
                description = EXCLUDED.description,
                updated_at = EXCLUDED.updated_at
             RETURNING {FEEDBACK_COLUMNS}"
        );
        sqlx::query_as::<_, BidFeedbackRow>(&query)
            .bind(feedback.id)
            .bind(feedback.bid_id)
            .bind(feedback.reviewer_id)
            .bind(&feedback.description)
            .bind(feedback.created_at)
            .bind(feedback.updated_at)
            .fetch_one(executor)
            .await
    }

    /// Feedback on bids by any of `authors`, newest first.
    pub async fn list_by_authors<'e>(
        executor: impl PgExecutor<'e>,
        authors: &[AuthorRef],
        page: Page,
    ) -> Result<Vec<BidFeedbackRow>, sqlx::Error> {
        let (author_types, author_ids) = author_arrays(authors);
        let query = "SELECT f.id, f.bid_id, f.reviewer_id, f.description, f.created_at, f.updated_at
             FROM bid_feedback f
             JOIN bids b ON b.id = f.bid_id
             WHERE (b.author_type, b.author_id) IN (SELECT * FROM UNNEST($1::text[], $2::uuid[]))
             ORDER BY f.created_at DESC, f.id ASC
             LIMIT $3 OFFSET $4";
        sqlx::query_as::<_, BidFeedbackRow>(query)
            .bind(author_types)
            .bind(author_ids)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(executor)
            .await
    }
}
