//! Connection routes (/connections, /connections/{id})

use crate::auth::Principal;
use crate::services::{ConnectionRequest, Services, StatusUpdate};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn list(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.connections.list(principal)?))
}

pub fn create(
    services: &Services,
    principal: Principal,
    input: ConnectionRequest,
) -> Result<HttpResponse, MemberError> {
    Ok(created(&services.connections.create(principal, input)?))
}

pub fn get(services: &Services, principal: Principal, id: i64) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.connections.get(principal, id)?))
}

/// PATCH: the recipient answers with `{"status": "accepted" | "rejected"}`
pub fn answer(
    services: &Services,
    principal: Principal,
    id: i64,
    input: StatusUpdate,
) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.connections.answer(principal, id, input)?))
}
