//! Who may act on what.
//!
//! The acting user is named by username. Ownership of a tender means being
//! responsible for its organization; a bid is owned by its author, which is
//! either the employee directly or an organization they are responsible for.

use crate::bid::{AuthorRef, AuthorType, Bid};
use crate::deadline::StoreHandle;
use crate::directory::Employee;
use crate::error::CoreError;
use crate::tender::Tender;
use crate::types::DbId;

/// A resolved employee plus the organizations they act for.
#[derive(Debug, Clone)]
pub struct Actor {
    pub employee: Employee,
    pub organizations: Vec<DbId>,
}

impl Actor {
    pub fn id(&self) -> DbId {
        self.employee.id
    }

    pub fn username(&self) -> &str {
        &self.employee.username
    }

    pub fn is_responsible_for(&self, organization_id: DbId) -> bool {
        self.organizations.contains(&organization_id)
    }

    /// Every author identity this actor may use for a bid.
    pub fn author_refs(&self) -> Vec<AuthorRef> {
        std::iter::once(AuthorRef::user(self.employee.id))
            .chain(self.organizations.iter().copied().map(AuthorRef::organization))
            .collect()
    }

    pub fn may_author_as(&self, author: AuthorRef) -> bool {
        match author.author_type {
            AuthorType::User => author.author_id == self.employee.id,
            AuthorType::Organization => self.is_responsible_for(author.author_id),
        }
    }

    pub fn owns_tender(&self, tender: &Tender) -> bool {
        self.is_responsible_for(tender.organization_id)
    }

    pub fn owns_bid(&self, bid: &Bid) -> bool {
        self.may_author_as(bid.author())
    }

    pub fn ensure_owns_tender(&self, tender: &Tender) -> Result<(), CoreError> {
        if self.owns_tender(tender) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "{} is not responsible for the organization owning tender {}",
                self.username(),
                tender.id
            )))
        }
    }

    pub fn ensure_owns_bid(&self, bid: &Bid) -> Result<(), CoreError> {
        if self.owns_bid(bid) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "{} is not the author of bid {}",
                self.username(),
                bid.id
            )))
        }
    }
}

/// Look up `username` and the organizations they are responsible for.
///
/// An unknown or empty username is `Unauthorized`.
pub async fn resolve_actor(db: StoreHandle<'_>, username: &str) -> Result<Actor, CoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::Unauthorized("username is required".into()));
    }
    let employee = db
        .run(|s| s.find_employee(username))
        .await?
        .ok_or_else(|| CoreError::Unauthorized(format!("unknown user '{username}'")))?;
    let employee_id = employee.id;
    let organizations = db
        .run(|s| s.responsible_organizations(employee_id))
        .await?;
    Ok(Actor {
        employee,
        organizations,
    })
}
