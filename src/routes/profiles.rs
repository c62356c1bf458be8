//! Profile routes (/profiles, /profiles/me)

use crate::auth::Principal;
use crate::services::{ProfileInput, ProfileUpdate, Services};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn list(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.profiles.list(principal)?))
}

pub fn create(
    services: &Services,
    principal: Principal,
    input: ProfileInput,
) -> Result<HttpResponse, MemberError> {
    Ok(created(&services.profiles.create(principal, input)?))
}

pub fn me(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.profiles.me(principal)?))
}

pub fn update_me(
    services: &Services,
    principal: Principal,
    update: ProfileUpdate,
) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.profiles.update_me(principal, update)?))
}
