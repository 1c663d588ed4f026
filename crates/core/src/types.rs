use serde::Serialize;

/// All entity ids are UUIDs (v7, so they sort roughly by creation time).
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Per-entity content version. Starts at 1.
pub type Version = i32;

/// Generate a fresh server-assigned id.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}

/// The two versioned entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Tender,
    Bid,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Tender => "Tender",
            EntityKind::Bid => "Bid",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
