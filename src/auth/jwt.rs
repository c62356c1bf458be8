//! JWT session tokens
//!
//! Tokens are HS256-signed and carry only the principal id (`sub`) plus
//! issue and expiry timestamps. No roles or scopes.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::Principal;
use crate::types::MemberError;

/// Minimum accepted signing secret length
pub const MIN_SECRET_LEN: usize = 32;

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Session interface consumed by the identity service and the router
pub trait SessionIssuer: Send + Sync {
    /// Issue a session token bound to a principal
    fn issue(&self, principal: Principal) -> Result<String, MemberError>;

    /// Resolve a token back to its principal; any invalid token is `Unauthorized`
    fn resolve(&self, token: &str) -> Result<Principal, MemberError>;
}

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a decimal string
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, MemberError> {
        if secret.is_empty() {
            return Err(MemberError::Config(
                "JWT_SECRET is required unless dev mode is enabled".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(MemberError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode (fixed, well-known secret)
    pub fn new_dev(expiry_seconds: u64) -> Self {
        Self {
            secret: DEV_SECRET.into(),
            expiry_seconds,
        }
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    fn now() -> Result<u64, MemberError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| MemberError::Internal(format!("System time error: {e}")))
    }

    /// Verify and decode a JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, MemberError> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidToken => "Invalid token",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Token validation failed",
            };
            MemberError::Unauthorized(msg.into())
        })
    }
}

impl SessionIssuer for JwtValidator {
    fn issue(&self, principal: Principal) -> Result<String, MemberError> {
        let now = Self::now()?;
        let claims = Claims {
            sub: principal.user_id().to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| MemberError::Internal(format!("Failed to generate token: {e}")))
    }

    fn resolve(&self, token: &str) -> Result<Principal, MemberError> {
        let claims = self.verify_token(token)?;
        claims
            .sub
            .parse::<i64>()
            .map(Principal::new)
            .map_err(|_| MemberError::Unauthorized("Invalid token subject".into()))
    }
}

/// Extract token from Authorization header.
/// Supports "Bearer <token>" format and raw tokens.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    if !header.contains(' ') {
        let token = header.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_resolve() {
        let validator = test_validator();

        let token = validator.issue(Principal::new(42)).unwrap();
        assert!(!token.is_empty());

        assert_eq!(validator.resolve(&token).unwrap(), Principal::new(42));

        let claims = validator.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_token() {
        let err = test_validator().resolve("invalid-token").unwrap_err();
        assert!(matches!(err, MemberError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_secret() {
        let validator2 = JwtValidator::new(
            "different-secret-that-is-at-least-32-characters".into(),
            3600,
        )
        .unwrap();

        let token = test_validator().issue(Principal::new(7)).unwrap();
        assert!(validator2.resolve(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let validator = test_validator();
        let claims = Claims {
            sub: "1".into(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-that-is-at-least-32-characters-long"),
        )
        .unwrap();

        let err = validator.resolve(&token).unwrap_err();
        assert_eq!(err.message(), "Token expired");
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "alice".into(),
            iat: JwtValidator::now().unwrap(),
            exp: JwtValidator::now().unwrap() + 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-that-is-at-least-32-characters-long"),
        )
        .unwrap();

        assert!(matches!(
            test_validator().resolve(&token),
            Err(MemberError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("abc123")), Some("abc123"));

        assert_eq!(extract_token_from_header(None), None);
        assert_eq!(extract_token_from_header(Some("")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
    }

    #[test]
    fn test_secret_validation() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new("".into(), 3600).is_err());
        assert!(JwtValidator::new("this-secret-is-at-least-32-chars-long".into(), 3600).is_ok());
    }

    #[test]
    fn test_dev_mode_validator() {
        let validator = JwtValidator::new_dev(60);
        let token = validator.issue(Principal::new(1)).unwrap();
        assert_eq!(validator.resolve(&token).unwrap().user_id(), 1);
    }
}
