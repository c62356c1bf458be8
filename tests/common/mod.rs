//! Test harness: drives the router in-process, no sockets

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use serde_json::Value;

use memberhub::auth::{Argon2Hasher, JwtValidator};
use memberhub::config::Args;
use memberhub::db::Database;
use memberhub::routes::handle_request;
use memberhub::server::AppState;
use memberhub::services::Services;

pub const PASSWORD: &str = "pw123456";

pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_flags(&[])
    }

    pub fn with_flags(flags: &[&str]) -> Self {
        Self::with_database(flags, Database::open_in_memory().unwrap())
    }

    pub fn with_database(flags: &[&str], db: Database) -> Self {
        let args = Args::parse_from(
            ["memberhub", "--dev-mode", "--database-path", ":memory:"]
                .into_iter()
                .chain(flags.iter().copied()),
        );
        let services = Services::new(
            Arc::new(db),
            args.access_policy(),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap()),
            Arc::new(JwtValidator::new_dev(args.jwt_expiry_seconds)),
        );
        Self {
            state: AppState::new(args, services),
        }
    }

    /// Send a request with an optional bearer token and raw body
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: impl Into<Bytes>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Full::new(body.into())).unwrap();

        let response = handle_request(&self.state, request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        self.raw(method, path, token, body).await
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, path, Some(token), None).await
    }

    /// Register and return the access token
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register and return (token, user id)
    pub async fn member(&self, email: &str) -> (String, i64) {
        let token = self.register(email).await;
        let (_, me) = self.get("/auth/me", &token).await;
        (token, me["id"].as_i64().unwrap())
    }
}
