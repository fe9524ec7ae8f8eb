use std::time::Duration;

use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::AppError;

const GUEST_ID_HEADER: &str = "x-guest-id";
const GUEST_PREFIX: &str = "guest_";
const MAX_GUEST_ID_LEN: usize = 128;

/// Store partition a request is allowed to read and write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOwner {
    pub owner_id: String,
    pub is_guest: bool,
}

/// Verifies HS256 bearer tokens signed with the server's shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, clock_skew: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = clock_skew.as_secs();
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Owner id (`sub`) of a valid token
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let decoded = decode::<Claims>(token, &self.key, &self.validation).map_err(|error| {
            tracing::debug!(%error, "Rejected bearer token");
            AppError::unauthorized("Invalid authentication token")
        })?;

        let sub = decoded.claims.sub.trim();
        if sub.is_empty() {
            return Err(AppError::unauthorized("Invalid authentication token"));
        }
        Ok(sub.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Resolve the request's owner from a bearer token, else a guest id header.
pub fn resolve_owner(headers: &HeaderMap, verifier: &JwtVerifier) -> Result<RequestOwner, AppError> {
    if headers.contains_key("authorization") {
        let token = extract_bearer_token(headers)?;
        return Ok(RequestOwner {
            owner_id: verifier.verify(token)?,
            is_guest: false,
        });
    }

    if let Some(value) = headers.get(GUEST_ID_HEADER) {
        let guest_id = value
            .to_str()
            .ok()
            .and_then(normalize_guest_id)
            .ok_or_else(|| AppError::unauthorized("Invalid guest id"))?;
        return Ok(RequestOwner {
            owner_id: format!("{GUEST_PREFIX}{guest_id}"),
            is_guest: true,
        });
    }

    Err(AppError::unauthorized("Authentication required"))
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("Authorization header must be `Bearer <token>`"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized(
            "Authorization scheme must be `Bearer`",
        ));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::unauthorized("Bearer token is empty"));
    }

    Ok(token)
}

fn normalize_guest_id(raw: &str) -> Option<&str> {
    let guest_id = raw.trim();
    let valid = !guest_id.is_empty()
        && guest_id.len() <= MAX_GUEST_ID_LEN
        && guest_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    valid.then_some(guest_id)
}

#[cfg(test)]
pub mod tests {
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    use super::*;

    pub const SECRET: &str = "test-shared-secret-0123456789";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        exp: i64,
    }

    pub fn token_for(sub: &str, expires_in_secs: i64) -> String {
        let claims = TestClaims {
            sub,
            exp: chrono::Utc::now().timestamp() + expires_in_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(SECRET, Duration::from_secs(0))
    }

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extractor_accepts_standard_header() {
        let headers = headers("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn bearer_token_extractor_rejects_wrong_scheme() {
        let headers = headers("authorization", "Basic abc");
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn valid_token_resolves_subject() {
        let headers = headers("authorization", &format!("Bearer {}", token_for("user-1", 300)));
        assert_eq!(
            resolve_owner(&headers, &verifier()).unwrap(),
            RequestOwner {
                owner_id: "user-1".to_string(),
                is_guest: false
            }
        );
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let expired = headers("authorization", &format!("Bearer {}", token_for("user-1", -120)));
        let err = resolve_owner(&expired, &verifier()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid authentication token");

        let other = JwtVerifier::new("another-shared-secret-abcdef", Duration::from_secs(0));
        let valid = headers("authorization", &format!("Bearer {}", token_for("user-1", 300)));
        assert!(resolve_owner(&valid, &other).is_err());
    }

    #[test]
    fn bearer_header_takes_precedence_over_guest_id() {
        let mut headers = headers("authorization", "Bearer not-a-jwt");
        headers.insert(GUEST_ID_HEADER, HeaderValue::from_static("device-1"));
        assert!(resolve_owner(&headers, &verifier()).is_err());
    }

    #[test]
    fn guest_id_is_namespaced() {
        let owner = resolve_owner(&headers(GUEST_ID_HEADER, " device_1-A "), &verifier()).unwrap();
        assert_eq!(owner.owner_id, "guest_device_1-A");
        assert!(owner.is_guest);
    }

    #[test]
    fn guest_id_must_be_a_safe_token() {
        let too_long = "x".repeat(129);
        for raw in ["", "../etc", "a b", too_long.as_str()] {
            assert!(resolve_owner(&headers(GUEST_ID_HEADER, raw), &verifier()).is_err());
        }
    }

    #[test]
    fn missing_credentials_require_authentication() {
        let err = resolve_owner(&HeaderMap::new(), &verifier()).unwrap_err();
        assert_eq!(err.to_string(), "Authentication required");
    }
}
