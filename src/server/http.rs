//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{Argon2Hasher, JwtValidator};
use crate::config::Args;
use crate::db::Database;
use crate::routes::{self, HttpResponse};
use crate::services::Services;
use crate::types::MemberError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub services: Services,
}

impl AppState {
    /// Assemble state from already built services
    pub fn new(args: Args, services: Services) -> Self {
        Self { args, services }
    }

    /// Open the database and build production services from configuration
    pub fn from_args(args: Args) -> Result<Self, MemberError> {
        let sessions = if args.dev_mode {
            warn!("Development mode enabled - tokens are signed with a well-known secret");
            JwtValidator::new_dev(args.jwt_expiry_seconds)
        } else {
            JwtValidator::new(
                args.jwt_secret.clone().unwrap_or_default(),
                args.jwt_expiry_seconds,
            )?
        };

        let db = Arc::new(Database::open(&args.database_path)?);
        let services = Services::new(
            db,
            args.access_policy(),
            Arc::new(Argon2Hasher::new()),
            Arc::new(sessions),
        );

        Ok(Self::new(args, services))
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), MemberError> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("memberhub listening on {}", state.args.listen);

    if state.args.restrict_referral_updates {
        info!("Referral status updates restricted to referrer and referred user");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { serve(state, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn serve(state: Arc<AppState>, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
    Ok(routes::handle_request(&state, req).await)
}
