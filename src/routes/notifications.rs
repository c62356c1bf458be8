//! Notification routes (/notifications, /notifications/{id}/read)

use crate::auth::Principal;
use crate::services::{NotificationInput, Services};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn list(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.notifications.list(principal)?))
}

pub fn create(
    services: &Services,
    principal: Principal,
    input: NotificationInput,
) -> Result<HttpResponse, MemberError> {
    Ok(created(&services.notifications.create(principal, input)?))
}

pub fn mark_read(services: &Services, principal: Principal, id: i64) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.notifications.mark_read(principal, id)?))
}
