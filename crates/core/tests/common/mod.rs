#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use tenders_core::bid::{AuthorType, Bid, CreateBid};
use tenders_core::directory::{Employee, Organization, OrganizationType};
use tenders_core::store::InMemoryStore;
use tenders_core::tender::{CreateTender, ServiceType, Tender, TenderStatus};
use tenders_core::types::{new_id, DbId};
use tenders_core::{Procurement, ServiceSettings};

/// A procurement facade over a fresh in-memory store.
pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub service: Procurement,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let service = Procurement::new(store.clone(), ServiceSettings::default());
        Self { store, service }
    }

    pub fn employee(&self, username: &str) -> DbId {
        let id = new_id();
        self.store
            .add_employee(Employee {
                id,
                username: username.to_string(),
                first_name: None,
                last_name: None,
                created_at: Utc::now(),
            })
            .unwrap();
        id
    }

    pub fn organization(&self, name: &str) -> DbId {
        let id = new_id();
        self.store
            .add_organization(Organization {
                id,
                name: name.to_string(),
                description: None,
                organization_type: OrganizationType::Llc,
                created_at: Utc::now(),
            })
            .unwrap();
        id
    }

    /// An organization with one responsible employee.
    pub fn organization_with(&self, name: &str, username: &str) -> DbId {
        let org = self.organization(name);
        let employee = self.employee(username);
        self.store.assign_responsible(org, employee).unwrap();
        org
    }

    pub async fn tender(&self, org: DbId, username: &str, name: &str) -> Tender {
        self.service
            .create_tender(CreateTender {
                name: name.to_string(),
                description: format!("{name} description"),
                service_type: ServiceType::Construction,
                organization_id: org,
                creator_username: username.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn published_tender(&self, org: DbId, username: &str, name: &str) -> Tender {
        let tender = self.tender(org, username, name).await;
        self.service
            .update_tender_status(tender.id, username, TenderStatus::Published)
            .await
            .unwrap()
    }

    /// A bid submitted by `username` in their own name.
    pub async fn user_bid(&self, tender_id: DbId, username: &str, author_id: DbId) -> Bid {
        self.service
            .create_bid(CreateBid {
                name: format!("{username} offer"),
                description: "We can do it".to_string(),
                tender_id,
                author_type: AuthorType::User,
                author_id,
                creator_username: username.to_string(),
            })
            .await
            .unwrap()
    }
}
