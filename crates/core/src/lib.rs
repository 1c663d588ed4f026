pub mod access;
pub mod bid;
pub mod deadline;
pub mod directory;
pub mod error;
pub mod lifecycle;
pub mod pagination;
pub mod query;
pub mod service;
pub mod store;
pub mod tender;
pub mod types;
pub mod versioning;

pub use error::CoreError;
pub use service::{Procurement, ServiceSettings};
