//! HTTP server for memberhub

pub mod http;

pub use http::{run, AppState};
