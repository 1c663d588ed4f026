//! Employees and organizations.
//!
//! These records are provisioned outside the service (seed data); the core
//! only reads them to identify the acting user and check who may act on
//! behalf of which organization.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// A person who can create and manage tenders and bids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: DbId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: Timestamp,
}

/// Legal form of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganizationType {
    #[serde(rename = "IE")]
    Ie,
    #[serde(rename = "LLC")]
    Llc,
    #[serde(rename = "JSC")]
    Jsc,
}

impl OrganizationType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrganizationType::Ie => "IE",
            OrganizationType::Llc => "LLC",
            OrganizationType::Jsc => "JSC",
        }
    }
}

impl FromStr for OrganizationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IE" => Ok(OrganizationType::Ie),
            "LLC" => Ok(OrganizationType::Llc),
            "JSC" => Ok(OrganizationType::Jsc),
            other => Err(CoreError::Validation(format!(
                "Unknown organization type '{other}'"
            ))),
        }
    }
}

/// An organization that owns tenders and may author bids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub organization_type: OrganizationType,
    pub created_at: Timestamp,
}
