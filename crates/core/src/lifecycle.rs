//! Status lifecycles and the status machine.
//!
//! Tender: `Created -> Published -> Closed`, plus `Created -> Closed`.
//! Bid: `Created -> Published -> Canceled`; `Published -> Approved | Rejected`
//! only through a decision. Status changes never bump the version.

use std::fmt;

use crate::bid::{Bid, BidDecisionRecord, BidStatus, Decision};
use crate::deadline::StoreHandle;
use crate::directory::Employee;
use crate::error::CoreError;
use crate::tender::{Tender, TenderStatus};
use crate::types::EntityKind;
use crate::versioning::Versioned;

/// A status enum with a fixed set of manual transitions.
pub trait Lifecycle: Copy + PartialEq + fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// States reachable from `self` by an explicit status update.
    fn manual_targets(self) -> &'static [Self];

    /// Terminal states accept no further edits or status changes.
    fn is_terminal(self) -> bool;

    fn can_transition_to(self, target: Self) -> bool {
        self.manual_targets().contains(&target)
    }
}

impl Lifecycle for TenderStatus {
    fn manual_targets(self) -> &'static [Self] {
        match self {
            TenderStatus::Created => &[TenderStatus::Published, TenderStatus::Closed],
            TenderStatus::Published => &[TenderStatus::Closed],
            TenderStatus::Closed => &[],
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, TenderStatus::Closed)
    }
}

impl Lifecycle for BidStatus {
    fn manual_targets(self) -> &'static [Self] {
        match self {
            BidStatus::Created => &[BidStatus::Published],
            BidStatus::Published => &[BidStatus::Canceled],
            BidStatus::Canceled | BidStatus::Approved | BidStatus::Rejected => &[],
        }
    }

    fn is_terminal(self) -> bool {
        matches!(
            self,
            BidStatus::Canceled | BidStatus::Approved | BidStatus::Rejected
        )
    }
}

/// Reject any status change not listed in [`Lifecycle::manual_targets`].
pub fn ensure_transition<S: Lifecycle>(
    kind: EntityKind,
    from: S,
    to: S,
) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: kind.as_str(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Applies status changes and bid decisions.
pub struct StatusMachine<'a> {
    db: StoreHandle<'a>,
}

impl<'a> StatusMachine<'a> {
    pub fn new(db: StoreHandle<'a>) -> Self {
        Self { db }
    }

    /// Move `current` to `target`, keeping its version.
    pub async fn update_status<E: Versioned>(
        &self,
        current: &E,
        target: E::Status,
    ) -> Result<E, CoreError> {
        ensure_transition(E::KIND, current.status(), target)?;
        let id = current.id();
        let expected = current.revision();
        self.db
            .run(|s| E::write_status(s, id, expected, target))
            .await
    }

    /// Record `decision` on `bid` and move it to the matching terminal state.
    ///
    /// The caller must already have established that `actor` is responsible
    /// for the tender's organization; the status checks here are repeated
    /// atomically by the store.
    pub async fn submit_decision(
        &self,
        bid: &Bid,
        tender: &Tender,
        actor: &Employee,
        decision: Decision,
    ) -> Result<(Bid, BidDecisionRecord), CoreError> {
        if tender.status != TenderStatus::Published {
            return Err(CoreError::InvalidState(format!(
                "Tender {} is {}; decisions need a Published tender",
                tender.id, tender.status
            )));
        }
        if bid.status != BidStatus::Published {
            return Err(CoreError::InvalidState(format!(
                "Bid {} is {}; only Published bids can be decided",
                bid.id, bid.status
            )));
        }

        let record = BidDecisionRecord {
            bid_id: bid.id,
            decision,
            decided_by: actor.id,
            decided_at: chrono::Utc::now(),
        };
        let expected = bid.revision();
        let updated = self
            .db
            .run(|s| s.record_decision(&record, expected, TenderStatus::Published))
            .await?;
        Ok((updated, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tender_transitions() {
        assert!(TenderStatus::Created.can_transition_to(TenderStatus::Published));
        assert!(TenderStatus::Created.can_transition_to(TenderStatus::Closed));
        assert!(TenderStatus::Published.can_transition_to(TenderStatus::Closed));
        assert!(!TenderStatus::Published.can_transition_to(TenderStatus::Created));
        assert!(!TenderStatus::Closed.can_transition_to(TenderStatus::Published));
    }

    #[test]
    fn same_state_is_not_a_transition() {
        assert!(!TenderStatus::Created.can_transition_to(TenderStatus::Created));
        assert!(!BidStatus::Published.can_transition_to(BidStatus::Published));
    }

    #[test]
    fn decided_states_are_not_manual_targets() {
        assert!(!BidStatus::Published.can_transition_to(BidStatus::Approved));
        assert!(!BidStatus::Published.can_transition_to(BidStatus::Rejected));
        assert!(BidStatus::Published.can_transition_to(BidStatus::Canceled));
        assert!(!BidStatus::Created.can_transition_to(BidStatus::Canceled));
    }

    #[test]
    fn terminal_states() {
        assert!(TenderStatus::Closed.is_terminal());
        assert!(!TenderStatus::Published.is_terminal());
        for status in [BidStatus::Canceled, BidStatus::Approved, BidStatus::Rejected] {
            assert!(status.is_terminal());
            assert!(status.manual_targets().is_empty());
        }
    }

    #[test]
    fn ensure_transition_reports_both_states() {
        let err = ensure_transition(EntityKind::Bid, BidStatus::Canceled, BidStatus::Published)
            .unwrap_err();
        match err {
            CoreError::InvalidTransition { entity, from, to } => {
                assert_eq!(entity, "Bid");
                assert_eq!(from, "Canceled");
                assert_eq!(to, "Published");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
