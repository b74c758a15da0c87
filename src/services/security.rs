// src/services/security.rs
// DOCUMENTATION: Password hashing, bearer tokens and login throttling
// PURPOSE: Shared by every service that checks the Authorization header

use crate::config::Config;
use crate::errors::GalleryError;
use crate::models::{Role, User};
use actix_web::HttpRequest;
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use uuid::Uuid;

/// Claims carried by every bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, GalleryError> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GalleryError::InternalError(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, GalleryError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| GalleryError::InternalError("Invalid password hash format".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Issue a signed HS256 token for the user
pub fn issue_token(user: &User, secret: &str, expiry_hours: i64) -> Result<String, GalleryError> {
    let now = Utc::now();
    let claims = Claims {
        id: user.id,
        email: user.email.clone(),
        role: user.role(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GalleryError::InternalError(format!("Failed to sign token: {}", e)))
}

/// Decode and validate a token (signature and expiry)
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, GalleryError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::warn!("Rejected bearer token: {}", e);
        GalleryError::Forbidden("Invalid token".to_string())
    })
}

/// Pull the token out of an Authorization header value.
/// Accepts `Bearer <token>` and a bare token.
pub fn extract_token(header: &str) -> Option<&str> {
    let header = header.trim_start();
    let token = match header.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {
            let rest = &header[6..];
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                // "Bearerxyz" is a bare token, not the scheme
                header
            } else {
                rest
            }
        }
        _ => header,
    }
    .trim();

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authenticate a request from its Authorization header.
/// Missing header -> 401, invalid or expired token -> 403.
pub fn authenticate(req: &HttpRequest, config: &Config) -> Result<Claims, GalleryError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .ok_or_else(|| {
            log::warn!("Request to {} without token", req.path());
            GalleryError::Unauthorized("Access Denied".to_string())
        })?;

    decode_token(token, &config.jwt_secret)
}

/// Require one of the given roles
pub fn require_role(claims: &Claims, roles: &[Role]) -> Result<(), GalleryError> {
    if roles.contains(&claims.role) {
        return Ok(());
    }

    let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
    log::warn!(
        "User {} with role {} denied, requires {}",
        claims.id,
        claims.role,
        names.join(",")
    );
    Err(GalleryError::Forbidden(format!(
        "Access denied: {} role required",
        names.join(",")
    )))
}

/// Per-client throttle on login attempts
pub struct LoginRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl LoginRateLimiter {
    pub fn new(per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
        }
    }

    /// Consume one attempt for the client key
    pub fn check(&self, key: &str) -> Result<(), GalleryError> {
        self.limiter.check_key(&key.to_string()).map_err(|_| {
            log::warn!("Login rate limit exceeded for {}", key);
            GalleryError::RateLimitExceeded
        })
    }
}

/// Client key used for throttling.
/// `X-Forwarded-For` is only honoured when the direct peer is a trusted proxy.
pub fn client_key(req: &HttpRequest, trusted_proxies: &[String]) -> String {
    let peer = req.peer_addr().map(|addr| addr.ip().to_string());
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok());

    resolve_client_ip(peer.as_deref(), forwarded, trusted_proxies)
}

/// The trusted proxy appends the address it saw, so the last entry is the
/// only one a client cannot forge
pub fn resolve_client_ip(
    peer: Option<&str>,
    forwarded_for: Option<&str>,
    trusted_proxies: &[String],
) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };

    if !trusted_proxies.iter().any(|p| p == peer) {
        return peer.to_string();
    }

    forwarded_for
        .and_then(|header| {
            header
                .rsplit(',')
                .map(str::trim)
                .find(|part| !part.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| peer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: String::new(),
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_token_claims() {
        let user = sample_user("ADMIN");
        let token = issue_token(&user, "secret", 3).unwrap();
        let claims = decode_token(&token, "secret").unwrap();

        assert_eq!(claims.id, user.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3 * 3600);
    }

    #[test]
    fn test_token_wrong_secret_is_forbidden() {
        let token = issue_token(&sample_user("USER"), "secret", 1).unwrap();
        let err = decode_token(&token, "other").unwrap_err();
        assert!(matches!(err, GalleryError::Forbidden(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = issue_token(&sample_user("USER"), "secret", -2).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_token("abc.def"), Some("abc.def"));
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("Bearer"), None);
        assert_eq!(extract_token("bearer  abc "), Some("abc"));
        assert_eq!(extract_token("  "), None);
    }

    #[test]
    fn test_resolve_client_ip() {
        let trusted = vec!["10.0.0.5".to_string()];

        // Direct clients cannot spoof the header
        assert_eq!(
            resolve_client_ip(Some("203.0.113.7"), Some("1.2.3.4"), &trusted),
            "203.0.113.7"
        );
        // Through the gateway the appended entry wins over a forged one
        assert_eq!(
            resolve_client_ip(Some("10.0.0.5"), Some("1.2.3.4, 198.51.100.9"), &trusted),
            "198.51.100.9"
        );
        assert_eq!(resolve_client_ip(Some("10.0.0.5"), None, &trusted), "10.0.0.5");
        assert_eq!(resolve_client_ip(None, Some("1.2.3.4"), &trusted), "unknown");
    }

    #[test]
    fn test_client_key_from_request() {
        let trusted = vec!["127.0.0.1".to_string()];
        let via_gateway = actix_web::test::TestRequest::default()
            .peer_addr("127.0.0.1:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "198.51.100.9"))
            .to_http_request();
        assert_eq!(client_key(&via_gateway, &trusted), "198.51.100.9");

        let direct = actix_web::test::TestRequest::default()
            .peer_addr("203.0.113.7:40000".parse().unwrap())
            .insert_header(("X-Forwarded-For", "198.51.100.9"))
            .to_http_request();
        assert_eq!(client_key(&direct, &trusted), "203.0.113.7");
    }

    #[test]
    fn test_require_role() {
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "u@example.com".to_string(),
            role: Role::Uploader,
            iat: 0,
            exp: 0,
        };
        assert!(require_role(&claims, &[Role::Admin, Role::Uploader]).is_ok());

        match require_role(&claims, &[Role::Admin]) {
            Err(GalleryError::Forbidden(msg)) => {
                assert_eq!(msg, "Access denied: ADMIN role required")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_login_rate_limiter() {
        let limiter = LoginRateLimiter::new(2);
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_ok());
        assert!(limiter.check("10.0.0.1").is_err());
        assert!(limiter.check("10.0.0.2").is_ok());
    }
}
