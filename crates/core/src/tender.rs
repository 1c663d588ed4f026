//! Tender domain types: service types, statuses, the live record, its
//! editable content, and the create/patch DTOs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp, Version};

/// Kind of service a tender procures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Construction => "Construction",
            ServiceType::Delivery => "Delivery",
            ServiceType::Manufacture => "Manufacture",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Construction" => Ok(ServiceType::Construction),
            "Delivery" => Ok(ServiceType::Delivery),
            "Manufacture" => Ok(ServiceType::Manufacture),
            other => Err(CoreError::Validation(format!(
                "Unknown service type '{other}'. Must be one of: Construction, Delivery, Manufacture"
            ))),
        }
    }
}

/// Tender lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TenderStatus::Created => "Created",
            TenderStatus::Published => "Published",
            TenderStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(TenderStatus::Created),
            "Published" => Ok(TenderStatus::Published),
            "Closed" => Ok(TenderStatus::Closed),
            other => Err(CoreError::Validation(format!(
                "Unknown tender status '{other}'"
            ))),
        }
    }
}

/// The editable (versioned) fields of a tender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderContent {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
}

/// The live tender record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub version: Version,
    pub created_at: Timestamp,
}

impl Tender {
    pub fn content(&self) -> TenderContent {
        TenderContent {
            name: self.name.clone(),
            description: self.description.clone(),
            service_type: self.service_type,
        }
    }

    pub fn set_content(&mut self, content: TenderContent) {
        self.name = content.name;
        self.description = content.description;
        self.service_type = content.service_type;
    }
}

/// Request body for creating a tender.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTender {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: String,
    pub service_type: ServiceType,
    pub organization_id: DbId,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub creator_username: String,
}

/// Partial update of a tender's editable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TenderPatch {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
}

impl TenderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.service_type.is_none()
    }

    /// Produce the content that results from applying this patch.
    pub fn apply(&self, content: &TenderContent) -> Result<TenderContent, CoreError> {
        self.validate()?;
        if self.is_empty() {
            return Err(CoreError::Validation(
                "Patch must set at least one of name, description, serviceType".into(),
            ));
        }
        Ok(TenderContent {
            name: self.name.clone().unwrap_or_else(|| content.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| content.description.clone()),
            service_type: self.service_type.unwrap_or(content.service_type),
        })
    }
}
