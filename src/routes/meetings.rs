//! Meeting routes (/meetings, /meetings/{id})

use serde_json::json;

use crate::auth::Principal;
use crate::services::{MeetingInput, MeetingUpdate, Services};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn list(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.meetings.list(principal)?))
}

pub fn create(
    services: &Services,
    principal: Principal,
    input: MeetingInput,
) -> Result<HttpResponse, MemberError> {
    Ok(created(&services.meetings.create(principal, input)?))
}

pub fn get(services: &Services, principal: Principal, id: i64) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.meetings.get(principal, id)?))
}

pub fn update(
    services: &Services,
    principal: Principal,
    id: i64,
    update: MeetingUpdate,
) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.meetings.update(principal, id, update)?))
}

pub fn delete(services: &Services, principal: Principal, id: i64) -> Result<HttpResponse, MemberError> {
    services.meetings.delete(principal, id)?;
    Ok(ok(&json!({ "message": "Deleted" })))
}
