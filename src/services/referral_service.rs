//! Referral service
//!
//! Status updates are open to any authenticated member unless the policy
//! restricts them to the two parties.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::Principal;
use crate::db::{Database, FieldMap, Filter, NewReferral, OrderBy, Referral};
use crate::policy::{AccessPolicy, Action};
use crate::types::MemberError;

use super::{required_text, StatusUpdate};

/// Referral creation body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferralInput {
    pub referred_id: i64,
    pub details: String,
}

pub struct ReferralService {
    db: Arc<Database>,
    policy: AccessPolicy,
}

impl ReferralService {
    pub fn new(db: Arc<Database>, policy: AccessPolicy) -> Self {
        Self { db, policy }
    }

    /// Referrals the principal gave or received
    pub fn list(&self, principal: Principal) -> Result<Vec<Referral>, MemberError> {
        let me = principal.user_id();
        let filter = Filter::Any(vec![
            Filter::eq("referrer_id", me),
            Filter::eq("referred_id", me),
        ]);
        self.db
            .unit_of_work(|uow| uow.find(&filter, &OrderBy::asc("id")))
    }

    pub fn create(&self, principal: Principal, input: ReferralInput) -> Result<Referral, MemberError> {
        let details = required_text("details", &input.details)?;

        let referral = self
            .db
            .unit_of_work(|uow| {
                uow.insert(&NewReferral {
                    referrer_id: principal.user_id(),
                    referred_id: input.referred_id,
                    details,
                })
            })
            .map_err(|e| match e {
                MemberError::NotFound(_) => {
                    MemberError::NotFound(format!("User {} not found", input.referred_id))
                }
                other => other,
            })?;

        info!(
            referral_id = referral.id,
            referrer = referral.referrer_id,
            referred = referral.referred_id,
            "Referral created"
        );
        Ok(referral)
    }

    pub fn get(&self, principal: Principal, id: i64) -> Result<Referral, MemberError> {
        self.db
            .unit_of_work(|uow| self.policy.load(uow, principal, id, Action::Read))
    }

    /// Set the referral status to any of open, closed or lost
    pub fn update_status(
        &self,
        principal: Principal,
        id: i64,
        input: StatusUpdate,
    ) -> Result<Referral, MemberError> {
        self.db.unit_of_work(|uow| {
            let referral: Referral = self.policy.load(uow, principal, id, Action::Update)?;
            let next = referral.status.transition(&input.status)?;

            let updated: Referral = uow.update(id, &FieldMap::new().set("status", next))?;
            info!(
                referral_id = id,
                user_id = principal.user_id(),
                from = %referral.status,
                to = %next,
                "Referral status changed"
            );
            Ok(updated)
        })
    }
}
