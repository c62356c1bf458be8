//! Service layer for memberhub
//!
//! Services hold the per-entity use cases between HTTP handlers and the
//! record store. Each operation:
//! - validates its input
//! - runs inside exactly one [`UnitOfWork`](crate::db::UnitOfWork)
//! - loads records through the [`AccessPolicy`] so NotFound precedes Forbidden
//!
//! ## Architecture
//!
//! ```text
//! HTTP Handlers (thin, routes/*.rs)
//!     ↓
//! Service Layer (validation + policy + status rules)
//!     ↓
//! UnitOfWork (db/store.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod connection_service;
pub mod identity_service;
pub mod meeting_service;
pub mod notification_service;
pub mod profile_service;
pub mod referral_service;

pub use connection_service::{ConnectionRequest, ConnectionService};
pub use identity_service::{Credentials, IdentityService, SessionToken};
pub use meeting_service::{MeetingInput, MeetingService, MeetingUpdate};
pub use notification_service::{NotificationInput, NotificationService};
pub use profile_service::{ProfileInput, ProfileService, ProfileUpdate};
pub use referral_service::{ReferralInput, ReferralService};

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::auth::{CredentialHasher, SessionIssuer};
use crate::db::Database;
use crate::policy::AccessPolicy;
use crate::types::MemberError;

/// Service container for dependency injection
///
/// Holds all services with a shared database. Pass this to the HTTP
/// server for handler access.
pub struct Services {
    pub identity: Arc<IdentityService>,
    pub profiles: Arc<ProfileService>,
    pub connections: Arc<ConnectionService>,
    pub referrals: Arc<ReferralService>,
    pub meetings: Arc<MeetingService>,
    pub notifications: Arc<NotificationService>,
    pub db: Arc<Database>,
}

impl Services {
    /// Create all services over one database and policy
    pub fn new(
        db: Arc<Database>,
        policy: AccessPolicy,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            identity: Arc::new(IdentityService::new(db.clone(), policy, hasher, sessions)),
            profiles: Arc::new(ProfileService::new(db.clone(), policy)),
            connections: Arc::new(ConnectionService::new(db.clone(), policy)),
            referrals: Arc::new(ReferralService::new(db.clone(), policy)),
            meetings: Arc::new(MeetingService::new(db.clone(), policy)),
            notifications: Arc::new(NotificationService::new(db.clone(), policy)),
            db,
        }
    }
}

/// `{"status": "..."}` body shared by connection and referral updates
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusUpdate {
    pub status: String,
}

/// Trimmed, non-empty text for a required field
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, MemberError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(MemberError::InvalidArgument(format!(
            "Field '{field}' is required and cannot be empty"
        )));
    }
    Ok(value.to_string())
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates. Use with `#[serde(default)]`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
