//! Configuration for memberhub
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::jwt::MIN_SECRET_LEN;
use crate::policy::AccessPolicy;
use crate::types::MemberError;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// memberhub - membership networking backend
#[derive(Parser, Debug, Clone)]
#[command(name = "memberhub")]
#[command(about = "Membership networking backend: profiles, connections, referrals, meetings")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// SQLite database file (":memory:" for a throwaway database)
    #[arg(long, env = "DATABASE_PATH", default_value = "memberhub.db")]
    pub database_path: PathBuf,

    /// JWT secret for token signing (required unless dev mode)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (fixed, well-known signing secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Only the referrer or the referred user may change a referral's status
    #[arg(long, env = "RESTRICT_REFERRAL_UPDATES", default_value = "false")]
    pub restrict_referral_updates: bool,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "16384")]
    pub max_body_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MemberError> {
        if !self.dev_mode {
            match self.jwt_secret.as_deref() {
                None | Some("") => {
                    return Err(MemberError::Config(
                        "JWT_SECRET is required unless dev mode is enabled".into(),
                    ));
                }
                Some(secret) if secret.len() < MIN_SECRET_LEN => {
                    return Err(MemberError::Config(format!(
                        "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
                    )));
                }
                Some(_) => {}
            }
        }

        if self.max_body_bytes == 0 {
            return Err(MemberError::Config("MAX_BODY_BYTES must be greater than zero".into()));
        }

        Ok(())
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.restrict_referral_updates)
    }
}
