//! Notification service - self-addressed messages with a one-way read flag

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::Principal;
use crate::db::{Database, FieldMap, Filter, NewNotification, Notification, OrderBy};
use crate::policy::{AccessPolicy, Action};
use crate::types::MemberError;

use super::required_text;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationInput {
    pub message: String,
}

pub struct NotificationService {
    db: Arc<Database>,
    policy: AccessPolicy,
}

impl NotificationService {
    pub fn new(db: Arc<Database>, policy: AccessPolicy) -> Self {
        Self { db, policy }
    }

    /// The principal's notifications, newest first
    pub fn list(&self, principal: Principal) -> Result<Vec<Notification>, MemberError> {
        self.db.unit_of_work(|uow| {
            uow.find(
                &Filter::eq("user_id", principal.user_id()),
                &OrderBy::desc("created_at").then_desc("id"),
            )
        })
    }

    /// Create a notification addressed to the principal
    pub fn create(
        &self,
        principal: Principal,
        input: NotificationInput,
    ) -> Result<Notification, MemberError> {
        let new = NewNotification {
            user_id: principal.user_id(),
            message: required_text("message", &input.message)?,
        };
        let notification = self.db.unit_of_work(|uow| uow.insert(&new))?;
        info!(notification_id = notification.id, user_id = new.user_id, "Notification created");
        Ok(notification)
    }

    /// Mark as read; reading an already read notification is a no-op
    pub fn mark_read(&self, principal: Principal, id: i64) -> Result<Notification, MemberError> {
        self.db.unit_of_work(|uow| {
            let notification: Notification = self.policy.load(uow, principal, id, Action::Update)?;
            if notification.read {
                return Ok(notification);
            }

            let updated = uow.update(id, &FieldMap::new().set("read", true))?;
            info!(notification_id = id, user_id = principal.user_id(), "Notification read");
            Ok(updated)
        })
    }
}
