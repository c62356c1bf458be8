//! Authorization and lifecycle rules
//!
//! Services never compare user ids themselves. They load records through
//! [`AccessPolicy::load`], which yields NotFound for a missing record before
//! it checks ownership, and Forbidden only for a record that exists.

pub mod ownership;
pub mod status;

use tracing::warn;

use crate::auth::Principal;
use crate::db::UnitOfWork;
use crate::types::MemberError;

pub use ownership::{Action, Guarded};
pub use status::{ConnectionStatus, MeetingStatus, ReferralStatus};

/// Message carried by every Forbidden error
pub const FORBIDDEN_MESSAGE: &str = "Not allowed.";

/// Deployment-level authorization switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Limit referral status changes to the referrer and the referred user
    pub restrict_referral_updates: bool,
}

impl AccessPolicy {
    pub fn new(restrict_referral_updates: bool) -> Self {
        Self {
            restrict_referral_updates,
        }
    }

    /// Check `principal` may perform `action` on an already loaded record
    pub fn authorize<R: Guarded>(
        &self,
        principal: Principal,
        record: &R,
        action: Action,
    ) -> Result<(), MemberError> {
        if record.permits(principal, action, self) {
            return Ok(());
        }

        warn!(
            principal = %principal,
            kind = R::KIND,
            id = record.id(),
            action = %action,
            "Access denied"
        );
        Err(MemberError::Forbidden(FORBIDDEN_MESSAGE.into()))
    }

    /// Fetch a record by id and authorize `action` on it
    pub fn load<R: Guarded>(
        &self,
        uow: &UnitOfWork<'_>,
        principal: Principal,
        id: i64,
        action: Action,
    ) -> Result<R, MemberError> {
        let record: R = uow.require(id)?;
        self.authorize(principal, &record, action)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, Meeting, NewMeeting, NewUser};
    use chrono::Utc;

    fn seed(db: &Database) -> (i64, i64, i64) {
        db.unit_of_work(|uow| {
            let owner = uow.insert(&NewUser {
                email: "owner@test.com".into(),
                password_hash: "h".into(),
            })?;
            let other = uow.insert(&NewUser {
                email: "other@test.com".into(),
                password_hash: "h".into(),
            })?;
            let meeting = uow.insert(&NewMeeting {
                user_id: owner.id,
                title: "Review".into(),
                scheduled_for: Utc::now(),
                notes: None,
                location: None,
            })?;
            Ok((owner.id, other.id, meeting.id))
        })
        .unwrap()
    }

    #[test]
    fn test_load_owner() {
        let db = Database::open_in_memory().unwrap();
        let (owner, _, meeting) = seed(&db);
        let policy = AccessPolicy::default();

        let loaded: Meeting = db
            .unit_of_work(|uow| policy.load(uow, Principal::new(owner), meeting, Action::Update))
            .unwrap();
        assert_eq!(loaded.id, meeting);
    }

    #[test]
    fn test_load_other_is_forbidden() {
        let db = Database::open_in_memory().unwrap();
        let (_, other, meeting) = seed(&db);
        let policy = AccessPolicy::default();

        let err = db
            .unit_of_work(|uow| {
                policy.load::<Meeting>(uow, Principal::new(other), meeting, Action::Read)
            })
            .unwrap_err();
        assert!(matches!(err, MemberError::Forbidden(_)));
        assert_eq!(err.message(), FORBIDDEN_MESSAGE);
    }

    #[test]
    fn test_missing_record_is_not_found_for_everyone() {
        let db = Database::open_in_memory().unwrap();
        let (_, other, _) = seed(&db);
        let policy = AccessPolicy::default();

        let err = db
            .unit_of_work(|uow| policy.load::<Meeting>(uow, Principal::new(other), 999, Action::Delete))
            .unwrap_err();
        assert!(matches!(err, MemberError::NotFound(_)));
    }
}
