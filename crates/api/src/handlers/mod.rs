pub mod bids;
pub mod tenders;
