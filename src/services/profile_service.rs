//! Profile service - one optional profile per member

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::Principal;
use crate::db::{Database, FieldMap, Filter, NewProfile, OrderBy, Profile, UnitOfWork};
use crate::policy::{AccessPolicy, Action};
use crate::types::MemberError;

use super::present;

/// Profile creation body; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileInput {
    pub full_name: Option<String>,
    pub business: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
}

/// Partial profile update. Absent fields are kept; `null` clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, deserialize_with = "present")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub business: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin: Option<Option<String>>,
}

impl ProfileUpdate {
    fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        let pairs = [
            ("full_name", &self.full_name),
            ("business", &self.business),
            ("title", &self.title),
            ("phone", &self.phone),
            ("bio", &self.bio),
            ("location", &self.location),
            ("linkedin", &self.linkedin),
        ];
        for (column, value) in pairs {
            if let Some(value) = value {
                fields.insert(column, value.clone());
            }
        }
        fields
    }
}

pub struct ProfileService {
    db: Arc<Database>,
    policy: AccessPolicy,
}

impl ProfileService {
    pub fn new(db: Arc<Database>, policy: AccessPolicy) -> Self {
        Self { db, policy }
    }

    /// Every profile, in creation order
    pub fn list(&self, _principal: Principal) -> Result<Vec<Profile>, MemberError> {
        self.db
            .unit_of_work(|uow| uow.find(&Filter::All, &OrderBy::asc("id")))
    }

    /// Create the principal's profile; at most one per member
    pub fn create(&self, principal: Principal, input: ProfileInput) -> Result<Profile, MemberError> {
        let profile = self
            .db
            .unit_of_work(|uow| {
                if own_profile(uow, principal)?.is_some() {
                    return Err(profile_exists());
                }
                uow.insert(&NewProfile {
                    user_id: principal.user_id(),
                    full_name: input.full_name,
                    business: input.business,
                    title: input.title,
                    phone: input.phone,
                    bio: input.bio,
                    location: input.location,
                    linkedin: input.linkedin,
                })
            })
            .map_err(|e| match e {
                MemberError::Conflict(_) => profile_exists(),
                other => other,
            })?;

        info!(user_id = principal.user_id(), profile_id = profile.id, "Profile created");
        Ok(profile)
    }

    /// The principal's own profile
    pub fn me(&self, principal: Principal) -> Result<Profile, MemberError> {
        self.db.unit_of_work(|uow| {
            own_profile(uow, principal)?.ok_or_else(|| MemberError::NotFound("Profile not found".into()))
        })
    }

    /// Overwrite the given fields of the principal's own profile
    pub fn update_me(&self, principal: Principal, update: ProfileUpdate) -> Result<Profile, MemberError> {
        let fields = update.to_fields();

        self.db.unit_of_work(|uow| {
            let profile = own_profile(uow, principal)?
                .ok_or_else(|| MemberError::NotFound("Profile not found".into()))?;
            self.policy.authorize(principal, &profile, Action::Update)?;

            let updated = uow.update(profile.id, &fields)?;
            info!(user_id = principal.user_id(), fields = fields.len(), "Profile updated");
            Ok(updated)
        })
    }
}

fn own_profile(uow: &UnitOfWork<'_>, principal: Principal) -> Result<Option<Profile>, MemberError> {
    uow.find_one(&Filter::eq("user_id", principal.user_id()))
}

fn profile_exists() -> MemberError {
    MemberError::Conflict("Profile already exists.".into())
}
