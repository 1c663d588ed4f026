//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept any `PgExecutor` as the first argument, so the same method
//! runs against the pool or inside an open transaction.

pub mod bid_repo;
pub mod bid_version_repo;
pub mod directory_repo;
pub mod tender_repo;
pub mod tender_version_repo;

pub use bid_repo::{BidDecisionRepo, BidFeedbackRepo, BidRepo};
pub use bid_version_repo::BidVersionRepo;
pub use directory_repo::DirectoryRepo;
pub use tender_repo::TenderRepo;
pub use tender_version_repo::TenderVersionRepo;
