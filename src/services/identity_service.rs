//! Identity service - registration, login and session resolution

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{CredentialHasher, Principal, SessionIssuer};
use crate::db::{Database, Filter, NewUser, User};
use crate::policy::{AccessPolicy, Action};
use crate::types::MemberError;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

const BAD_CREDENTIALS: &str = "Invalid email or password.";

/// Register / login body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Issued session
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub access_token: String,
}

pub struct IdentityService {
    db: Arc<Database>,
    policy: AccessPolicy,
    hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionIssuer>,
}

impl IdentityService {
    pub fn new(
        db: Arc<Database>,
        policy: AccessPolicy,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            db,
            policy,
            hasher,
            sessions,
        }
    }

    /// Create a user and open a session for it
    pub fn register(&self, input: Credentials) -> Result<SessionToken, MemberError> {
        validate_email(&input.email)?;
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(MemberError::InvalidArgument(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let email = input.email;

        let user = self
            .db
            .unit_of_work(|uow| {
                let existing: Option<User> = uow.find_one(&Filter::eq("email", email.clone()))?;
                if existing.is_some() {
                    return Err(email_taken());
                }
                uow.insert(&NewUser {
                    email: email.clone(),
                    password_hash,
                })
            })
            .map_err(|e| match e {
                MemberError::Conflict(_) => email_taken(),
                other => other,
            })?;

        info!(user_id = user.id, "User registered");
        self.open_session(&user)
    }

    /// Exchange credentials for a session
    pub fn login(&self, input: Credentials) -> Result<SessionToken, MemberError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(MemberError::InvalidArgument(
                "Email and password are required".into(),
            ));
        }

        let user: Option<User> = self
            .db
            .unit_of_work(|uow| uow.find_one(&Filter::eq("email", input.email.clone())))?;

        let Some(user) = user else {
            warn!("Login failed");
            return Err(MemberError::Unauthorized(BAD_CREDENTIALS.into()));
        };

        if !self.hasher.verify(&input.password, &user.password_hash)? {
            warn!("Login failed");
            return Err(MemberError::Unauthorized(BAD_CREDENTIALS.into()));
        }

        info!(user_id = user.id, "User logged in");
        self.open_session(&user)
    }

    /// Resolve a bearer token to its principal
    pub fn authenticate(&self, token: &str) -> Result<Principal, MemberError> {
        self.sessions.resolve(token)
    }

    /// The user the principal authenticates as
    pub fn current_user(&self, principal: Principal) -> Result<User, MemberError> {
        self.db.unit_of_work(|uow| {
            self.policy
                .load(uow, principal, principal.user_id(), Action::Read)
        })
    }

    fn open_session(&self, user: &User) -> Result<SessionToken, MemberError> {
        let access_token = self.sessions.issue(Principal::new(user.id))?;
        Ok(SessionToken { access_token })
    }
}

fn email_taken() -> MemberError {
    MemberError::Conflict("Email already registered.".into())
}

/// Address shape check: one `@`, non-empty local part, dotted domain,
/// no whitespace
fn validate_email(email: &str) -> Result<(), MemberError> {
    let invalid = || MemberError::InvalidArgument(format!("Not a valid email address: '{email}'"));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.');

    if local.is_empty() || !domain_ok {
        return Err(invalid());
    }
    Ok(())
}
