//! HTTP routes for memberhub
//!
//! [`handle_request`] is the single entry point. It resolves the path to a
//! [`Route`], answers 405 for a known path with the wrong method, reads and
//! decodes the JSON body within the configured size limit, resolves the
//! bearer token for protected routes, and then calls the matching service.

pub mod auth_routes;
pub mod connections;
pub mod health;
pub mod meetings;
pub mod notifications;
pub mod profiles;
pub mod referrals;
pub mod response;

pub use response::HttpResponse;

use std::error::Error as StdError;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{header, Method, Request};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::{extract_token_from_header, Principal};
use crate::server::AppState;
use crate::types::MemberError;

/// Every path the API serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Register,
    Login,
    Me,
    Profiles,
    ProfileMe,
    Connections,
    Connection(i64),
    Referrals,
    Referral(i64),
    Meetings,
    Meeting(i64),
    Notifications,
    NotificationRead(i64),
}

impl Route {
    /// Match a path (trailing slashes ignored); `None` for unknown paths
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let id = |raw: &str| raw.parse::<i64>().ok();

        match segments.as_slice() {
            ["health"] => Some(Self::Health),
            ["auth", "register"] => Some(Self::Register),
            ["auth", "login"] => Some(Self::Login),
            ["auth", "me"] => Some(Self::Me),
            ["profiles"] => Some(Self::Profiles),
            ["profiles", "me"] => Some(Self::ProfileMe),
            ["connections"] => Some(Self::Connections),
            ["connections", raw] => id(raw).map(Self::Connection),
            ["referrals"] => Some(Self::Referrals),
            ["referrals", raw] => id(raw).map(Self::Referral),
            ["meetings"] => Some(Self::Meetings),
            ["meetings", raw] => id(raw).map(Self::Meeting),
            ["notifications"] => Some(Self::Notifications),
            ["notifications", raw, "read"] => id(raw).map(Self::NotificationRead),
            _ => None,
        }
    }

    /// Methods the route answers (besides OPTIONS)
    pub fn methods(&self) -> &'static [&'static str] {
        match self {
            Self::Health | Self::Me => &["GET"],
            Self::Register | Self::Login | Self::NotificationRead(_) => &["POST"],
            Self::Profiles
            | Self::Connections
            | Self::Referrals
            | Self::Meetings
            | Self::Notifications => &["GET", "POST"],
            Self::ProfileMe => &["GET", "PUT"],
            Self::Connection(_) | Self::Referral(_) => &["GET", "PATCH"],
            Self::Meeting(_) => &["GET", "PUT", "DELETE"],
        }
    }

    /// Whether a bearer token is needed
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Health | Self::Register | Self::Login)
    }
}

/// Route an HTTP request to its handler
pub async fn handle_request<B>(state: &AppState, req: Request<B>) -> HttpResponse
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!(%method, path = %path, "Request");

    if method == Method::OPTIONS {
        return response::cors_preflight();
    }

    let Some(route) = Route::parse(&path) else {
        return response::not_found(&path);
    };

    let allowed = route.methods();
    if !allowed.contains(&method.as_str()) {
        return response::method_not_allowed(allowed);
    }

    match dispatch(state, route, req).await {
        Ok(response) => response,
        Err(err) => response::error_response(err),
    }
}

async fn dispatch<B>(
    state: &AppState,
    route: Route,
    req: Request<B>,
) -> Result<HttpResponse, MemberError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let principal = if route.requires_auth() {
        Some(authenticate(state, &req)?)
    } else {
        None
    };
    let method = req.method().clone();
    let limit = state.args.max_body_bytes;
    let services = &state.services;

    match (route, principal, method.as_str()) {
        (Route::Health, _, _) => Ok(health::health_check(services)),
        (Route::Register, _, _) => {
            auth_routes::register(services, read_json(req, limit).await?)
        }
        (Route::Login, _, _) => auth_routes::login(services, read_json(req, limit).await?),

        (_, None, _) => Err(missing_token()),

        (Route::Me, Some(p), _) => auth_routes::me(services, p),

        (Route::Profiles, Some(p), "GET") => profiles::list(services, p),
        (Route::Profiles, Some(p), _) => {
            profiles::create(services, p, read_json(req, limit).await?)
        }
        (Route::ProfileMe, Some(p), "GET") => profiles::me(services, p),
        (Route::ProfileMe, Some(p), _) => {
            profiles::update_me(services, p, read_json(req, limit).await?)
        }

        (Route::Connections, Some(p), "GET") => connections::list(services, p),
        (Route::Connections, Some(p), _) => {
            connections::create(services, p, read_json(req, limit).await?)
        }
        (Route::Connection(id), Some(p), "GET") => connections::get(services, p, id),
        (Route::Connection(id), Some(p), _) => {
            connections::answer(services, p, id, read_json(req, limit).await?)
        }

        (Route::Referrals, Some(p), "GET") => referrals::list(services, p),
        (Route::Referrals, Some(p), _) => {
            referrals::create(services, p, read_json(req, limit).await?)
        }
        (Route::Referral(id), Some(p), "GET") => referrals::get(services, p, id),
        (Route::Referral(id), Some(p), _) => {
            referrals::update_status(services, p, id, read_json(req, limit).await?)
        }

        (Route::Meetings, Some(p), "GET") => meetings::list(services, p),
        (Route::Meetings, Some(p), _) => {
            meetings::create(services, p, read_json(req, limit).await?)
        }
        (Route::Meeting(id), Some(p), "GET") => meetings::get(services, p, id),
        (Route::Meeting(id), Some(p), "DELETE") => meetings::delete(services, p, id),
        (Route::Meeting(id), Some(p), _) => {
            meetings::update(services, p, id, read_json(req, limit).await?)
        }

        (Route::Notifications, Some(p), "GET") => notifications::list(services, p),
        (Route::Notifications, Some(p), _) => {
            notifications::create(services, p, read_json(req, limit).await?)
        }
        (Route::NotificationRead(id), Some(p), _) => notifications::mark_read(services, p, id),
    }
}

fn missing_token() -> MemberError {
    MemberError::Unauthorized("Missing authorization token".into())
}

fn authenticate<B>(state: &AppState, req: &Request<B>) -> Result<Principal, MemberError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header).ok_or_else(missing_token)?;
    state.services.identity.authenticate(token)
}

/// Collect at most `limit` bytes and decode them as JSON
async fn read_json<T, B>(req: Request<B>, limit: usize) -> Result<T, MemberError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let bytes = read_body(req, limit).await?;
    if bytes.is_empty() {
        return Err(MemberError::InvalidArgument("Request body is required".into()));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_body<B>(req: Request<B>, limit: usize) -> Result<Bytes, MemberError>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(MemberError::InvalidArgument(format!(
            "Request body exceeds {limit} bytes"
        ))),
        Err(e) => Err(MemberError::InvalidArgument(format!(
            "Failed to read body: {e}"
        ))),
    }
}
