//! Referral routes (/referrals, /referrals/{id})

use crate::auth::Principal;
use crate::services::{ReferralInput, Services, StatusUpdate};
use crate::types::MemberError;

use super::response::{created, ok};
use super::HttpResponse;

pub fn list(services: &Services, principal: Principal) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.referrals.list(principal)?))
}

pub fn create(
    services: &Services,
    principal: Principal,
    input: ReferralInput,
) -> Result<HttpResponse, MemberError> {
    Ok(created(&services.referrals.create(principal, input)?))
}

pub fn get(services: &Services, principal: Principal, id: i64) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.referrals.get(principal, id)?))
}

pub fn update_status(
    services: &Services,
    principal: Principal,
    id: i64,
    input: StatusUpdate,
) -> Result<HttpResponse, MemberError> {
    Ok(ok(&services.referrals.update_status(principal, id, input)?))
}
