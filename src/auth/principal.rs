//! The authenticated user behind a request

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated user id bound to the current request.
///
/// Only [`SessionIssuer::resolve`](super::SessionIssuer::resolve) and the
/// identity service mint these, so holding one means a token (or a fresh
/// registration/login) vouched for the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(i64);

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self(user_id)
    }

    pub fn user_id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}
