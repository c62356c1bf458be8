//! Authentication routes
//!
//! - POST /auth/register - create a user, answer 201 `{access_token}`
//! - POST /auth/login - answer 200 `{access_token}`
//! - GET /auth/me - the authenticated user (id, email, created_at)

use crate::auth::Principal;
use crate::services::{Credentials, Services};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn register(services: &Services, input: Credentials) -> Result<HttpResponse, MemberError> {
    let token = services.identity.register(input)?;
    Ok(created(&token))
}

pub fn login(services: &Services, input: Credentials) -> Result<HttpResponse, MemberError> {
    let token = services.identity.login(input)?;
    Ok(ok(&token))
}

pub fn me(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    let user = services.identity.current_user(principal)?;
    Ok(ok(&user))
}
