//! JWT authentication module.
//!
//! Staff log in with a password and receive an HS256 bearer token carrying
//! their id and role. Every protected handler takes a [`CurrentActor`], which
//! verifies the token, re-reads the staff row and builds the [`Actor`] the
//! managers check capabilities against.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use stayhub_core::{Actor, Role};
use stayhub_db::Staff;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff id)
    pub sub: String,

    pub username: String,

    /// Role at the time the token was issued
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a token for an authenticated staff member.
    pub fn generate_token(&self, staff: &Staff) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: staff.id.clone(),
            username: staff.username.clone(),
            role: staff.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!("JWT validation failed: {e}");
                ApiError::Unauthorized("Invalid or expired token".to_string())
            })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller of a request.
///
/// The role comes from the staff table, not the token, so a role change or a
/// deactivation takes effect on the next request.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

        let claims = state.jwt.validate_token(token)?;
        let staff = state
            .db
            .staff()
            .get_by_id(&claims.sub)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| ApiError::Unauthorized("Account is not active".to_string()))?;

        let ip_address = client_ip(parts);
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(CurrentActor(
            Actor::new(staff.id, staff.role).with_request(ip_address, user_agent),
        ))
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, else the socket peer.
fn client_ip(parts: &Parts) -> Option<String> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for").or_else(|| header("x-real-ip")).or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(role: Role) -> Staff {
        Staff {
            id: Uuid::new_v4().to_string(),
            username: "frontdesk".to_string(),
            full_name: "Front Desk".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);
        let s = staff(Role::Receptionist);

        let token = manager.generate_token(&s).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, s.id);
        assert_eq!(claims.username, "frontdesk");
        assert_eq!(claims.role, Role::Receptionist);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);

        let token = issuer.generate_token(&staff(Role::Admin)).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // past the default 60s leeway
        let manager = JwtManager::new("test-secret", -120);
        let token = manager.generate_token(&staff(Role::Admin)).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_client_ip_headers() {
        let (parts, _) = axum::http::Request::builder()
            .header("X-Forwarded-For", "203.0.113.1, 198.51.100.1")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(client_ip(&parts).as_deref(), Some("203.0.113.1"));

        let (parts, _) = axum::http::Request::builder()
            .header("X-Real-IP", "198.51.100.42")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(client_ip(&parts).as_deref(), Some("198.51.100.42"));

        let (parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        assert_eq!(client_ip(&parts), None);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
