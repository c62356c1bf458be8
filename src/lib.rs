//! memberhub - membership networking backend
//!
//! Users, profiles, connections, referrals, meetings and notifications
//! behind bearer-token authentication, with per-record ownership rules
//! enforced by [`policy::AccessPolicy`].
//!
//! ## Layout
//!
//! - [`auth`] - Argon2 credentials, JWT sessions, [`auth::Principal`]
//! - [`db`] - SQLite store and the six record types
//! - [`policy`] - ownership rules and status lifecycles
//! - [`services`] - per-entity operations
//! - [`routes`] / [`server`] - thin hyper HTTP surface
//! - [`config`] - CLI / environment configuration

pub mod auth;
pub mod config;
pub mod db;
pub mod policy;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use types::{MemberError, Result};
