//! Meeting service - owner-only meetings, the one deletable record

use std::sync::Arc;

use rusqlite::types::Value;
use serde::Deserialize;
use tracing::info;

use crate::auth::Principal;
use crate::db::models::{format_timestamp, parse_timestamp};
use crate::db::{Database, FieldMap, Filter, Meeting, NewMeeting, OrderBy};
use crate::policy::{AccessPolicy, Action, MeetingStatus};
use crate::types::MemberError;

use super::{present, required_text};

/// Meeting creation body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingInput {
    pub title: String,
    /// RFC 3339, or naive ISO 8601 read as UTC
    pub scheduled_for: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Partial meeting update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingUpdate {
    pub title: Option<String>,
    pub scheduled_for: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    pub status: Option<String>,
}

impl MeetingUpdate {
    fn to_fields(&self) -> Result<FieldMap, MemberError> {
        let mut fields = FieldMap::new();

        if let Some(title) = &self.title {
            fields.insert("title", required_text("title", title)?);
        }
        if let Some(raw) = &self.scheduled_for {
            fields.insert("scheduled_for", format_timestamp(&parse_timestamp(raw)?));
        }
        if let Some(notes) = &self.notes {
            fields.insert("notes", notes.clone());
        }
        if let Some(location) = &self.location {
            fields.insert("location", location.clone());
        }
        if let Some(status) = &self.status {
            fields.insert("status", Value::from(status.parse::<MeetingStatus>()?));
        }

        Ok(fields)
    }
}

pub struct MeetingService {
    db: Arc<Database>,
    policy: AccessPolicy,
}

impl MeetingService {
    pub fn new(db: Arc<Database>, policy: AccessPolicy) -> Self {
        Self { db, policy }
    }

    /// The principal's meetings, in creation order
    pub fn list(&self, principal: Principal) -> Result<Vec<Meeting>, MemberError> {
        self.db.unit_of_work(|uow| {
            uow.find(&Filter::eq("user_id", principal.user_id()), &OrderBy::asc("id"))
        })
    }

    pub fn create(&self, principal: Principal, input: MeetingInput) -> Result<Meeting, MemberError> {
        let new = NewMeeting {
            user_id: principal.user_id(),
            title: required_text("title", &input.title)?,
            scheduled_for: parse_timestamp(&input.scheduled_for)?,
            notes: input.notes,
            location: input.location,
        };

        let meeting = self.db.unit_of_work(|uow| uow.insert(&new))?;
        info!(meeting_id = meeting.id, user_id = principal.user_id(), "Meeting created");
        Ok(meeting)
    }

    pub fn get(&self, principal: Principal, id: i64) -> Result<Meeting, MemberError> {
        self.db
            .unit_of_work(|uow| self.policy.load(uow, principal, id, Action::Read))
    }

    /// Overwrite the given fields; others keep their values
    pub fn update(
        &self,
        principal: Principal,
        id: i64,
        update: MeetingUpdate,
    ) -> Result<Meeting, MemberError> {
        self.db.unit_of_work(|uow| {
            self.policy.load::<Meeting>(uow, principal, id, Action::Update)?;
            let fields = update.to_fields()?;

            let updated = uow.update(id, &fields)?;
            info!(meeting_id = id, user_id = principal.user_id(), "Meeting updated");
            Ok(updated)
        })
    }

    /// Remove the meeting permanently
    pub fn delete(&self, principal: Principal, id: i64) -> Result<(), MemberError> {
        self.db.unit_of_work(|uow| {
            self.policy.load::<Meeting>(uow, principal, id, Action::Delete)?;
            uow.delete::<Meeting>(id)?;
            info!(meeting_id = id, user_id = principal.user_id(), "Meeting deleted");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{member, services};
    use chrono::{Duration, Utc};

    fn meeting(title: &str, when: &str) -> MeetingInput {
        MeetingInput {
            title: title.into(),
            scheduled_for: when.into(),
            notes: None,
            location: Some("Cafe".into()),
        }
    }

    fn future() -> String {
        (Utc::now() + Duration::days(7)).to_rfc3339()
    }

    #[test]
    fn test_owner_lifecycle() {
        let services = services();
        let owner = member(&services, "owner@test.com");
        let other = member(&services, "other@test.com");

        let created = services
            .meetings
            .create(owner, meeting("Quarterly", &future()))
            .unwrap();
        assert_eq!(created.status, MeetingStatus::Scheduled);

        assert!(matches!(
            services.meetings.delete(other, created.id),
            Err(MemberError::Forbidden(_))
        ));
        assert!(matches!(
            services.meetings.get(other, created.id),
            Err(MemberError::Forbidden(_))
        ));

        services.meetings.delete(owner, created.id).unwrap();
        assert!(matches!(
            services.meetings.get(owner, created.id),
            Err(MemberError::NotFound(_))
        ));
        assert!(matches!(
            services.meetings.delete(owner, created.id),
            Err(MemberError::NotFound(_))
        ));
    }

    #[test]
    fn test_partial_update() {
        let services = services();
        let owner = member(&services, "owner@test.com");
        let created = services
            .meetings
            .create(owner, meeting("Quarterly", "2030-03-01T10:00:00"))
            .unwrap();

        let update: MeetingUpdate =
            serde_json::from_str(r#"{"notes": "Bring numbers", "status": "completed"}"#).unwrap();
        let updated = services.meetings.update(owner, created.id, update).unwrap();

        assert_eq!(updated.title, "Quarterly");
        assert_eq!(updated.scheduled_for, created.scheduled_for);
        assert_eq!(updated.location.as_deref(), Some("Cafe"));
        assert_eq!(updated.notes.as_deref(), Some("Bring numbers"));
        assert_eq!(updated.status, MeetingStatus::Completed);
    }

    #[test]
    fn test_update_validation() {
        let services = services();
        let owner = member(&services, "owner@test.com");
        let other = member(&services, "other@test.com");
        let created = services
            .meetings
            .create(owner, meeting("Quarterly", &future()))
            .unwrap();

        let bad_status = MeetingUpdate {
            status: Some("postponed".into()),
            ..Default::default()
        };
        assert!(matches!(
            services.meetings.update(owner, created.id, bad_status.clone()),
            Err(MemberError::InvalidArgument(_))
        ));

        // Ownership is checked before the body
        assert!(matches!(
            services.meetings.update(other, created.id, bad_status),
            Err(MemberError::Forbidden(_))
        ));

        let blank_title = MeetingUpdate {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            services.meetings.update(owner, created.id, blank_title),
            Err(MemberError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_validation() {
        let services = services();
        let owner = member(&services, "owner@test.com");

        assert!(matches!(
            services.meetings.create(owner, meeting("", &future())),
            Err(MemberError::InvalidArgument(_))
        ));
        assert!(matches!(
            services.meetings.create(owner, meeting("Sync", "tomorrow")),
            Err(MemberError::InvalidArgument(_))
        ));

        // Past dates are accepted
        assert!(services
            .meetings
            .create(owner, meeting("Retro", "2001-01-01T00:00:00Z"))
            .is_ok());
    }

    #[test]
    fn test_list_own_only() {
        let services = services();
        let owner = member(&services, "owner@test.com");
        let other = member(&services, "other@test.com");
        services.meetings.create(owner, meeting("A", &future())).unwrap();
        services.meetings.create(other, meeting("B", &future())).unwrap();
        services.meetings.create(owner, meeting("C", &future())).unwrap();

        let titles: Vec<String> = services
            .meetings
            .list(owner)
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }
}
