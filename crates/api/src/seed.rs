//! Directory seeding for the in-memory backend.
//!
//! Employees and organizations are provisioned outside the service. With
//! `STORE_BACKEND=postgres` they live in the database; with `memory` they
//! are read from a JSON file at startup:
//!
//! ```json
//! {
//!   "employees": [{ "username": "alice", "firstName": "Alice" }],
//!   "organizations": [
//!     { "name": "Acme", "organizationType": "LLC", "responsible": ["alice"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use tenders_core::directory::{Employee, Organization, OrganizationType};
use tenders_core::store::{InMemoryStore, StoreError};
use tenders_core::types::{new_id, DbId};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("organization '{organization}' lists unknown employee '{username}'")]
    UnknownEmployee {
        organization: String,
        username: String,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub employees: Vec<SeedEmployee>,
    #[serde(default)]
    pub organizations: Vec<SeedOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEmployee {
    pub id: Option<DbId>,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOrganization {
    pub id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub organization_type: OrganizationType,
    /// Usernames of the employees responsible for this organization.
    #[serde(default)]
    pub responsible: Vec<String>,
}

impl DirectorySeed {
    pub fn from_file(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Insert every employee and organization into `store`.
    pub fn apply(self, store: &InMemoryStore) -> Result<(), SeedError> {
        let now = Utc::now();
        let mut ids_by_username = HashMap::new();

        for e in self.employees {
            let id = e.id.unwrap_or_else(new_id);
            ids_by_username.insert(e.username.clone(), id);
            store.add_employee(Employee {
                id,
                username: e.username,
                first_name: e.first_name,
                last_name: e.last_name,
                created_at: now,
            })?;
        }

        for o in self.organizations {
            let id = o.id.unwrap_or_else(new_id);
            store.add_organization(Organization {
                id,
                name: o.name.clone(),
                description: o.description,
                organization_type: o.organization_type,
                created_at: now,
            })?;
            for username in o.responsible {
                let employee_id = ids_by_username.get(&username).copied().ok_or_else(|| {
                    SeedError::UnknownEmployee {
                        organization: o.name.clone(),
                        username: username.clone(),
                    }
                })?;
                store.assign_responsible(id, employee_id)?;
            }
        }

        tracing::info!(
            employees = ids_by_username.len(),
            "Directory seeded into in-memory store"
        );
        Ok(())
    }
}
