//! Shared types for memberhub

mod error;

pub use error::{MemberError, Result};
