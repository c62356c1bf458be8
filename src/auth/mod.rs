//! Authentication for memberhub
//!
//! Provides:
//! - Password hashing with Argon2 ([`CredentialHasher`])
//! - JWT session issuance and resolution ([`SessionIssuer`])
//! - The [`Principal`] type every access-controlled operation takes

pub mod jwt;
pub mod password;
pub mod principal;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, SessionIssuer};
pub use password::{Argon2Hasher, CredentialHasher};
pub use principal::Principal;
