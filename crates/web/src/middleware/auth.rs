use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use storage::{error::StorageError, repository::user::UserRepository};
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

const AUDIENCE: &str = "authenticated";

#[derive(Clone)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self { keys }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Claims carried by access tokens from the hosted auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub aud: Option<String>,
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);

        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, WebError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| WebError::Unauthorized(format!("Invalid token: {}", e)))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| WebError::Unauthorized("Token subject is not a user id".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: data.claims.email,
        })
    }
}

/// Authenticated caller, resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

pub fn extract_bearer(header: Option<&str>) -> Result<&str, WebError> {
    let value =
        header.ok_or_else(|| WebError::Unauthorized("Missing Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            WebError::Unauthorized("Expected 'Bearer <token>' authorization".to_string())
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = extract_bearer(header)?;

        JwtVerifier::from_ref(state).verify(token)
    }
}

/// Let through API key holders and users whose row carries the admin role
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = extract_bearer(header)?;

    if state.api_keys.is_valid(token) {
        return Ok(next.run(request).await);
    }

    let caller = state.jwt.verify(token)?;
    let user = match UserRepository::new(state.db.pool())
        .find_by_id(caller.user_id)
        .await
    {
        Ok(user) => user,
        Err(StorageError::NotFound) => return Err(WebError::Forbidden),
        Err(e) => return Err(e.into()),
    };

    if !user.is_admin() {
        tracing::warn!(user_id = %caller.user_id, "Non-admin user attempted an admin route");
        return Err(WebError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-jwt-secret";

    fn token_for(sub: &str, aud: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            email: Some("fan@example.com".to_string()),
            exp,
            aud: Some(aud.to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_api_keys_parsing() {
        let keys = ApiKeys::from_comma_separated(" alpha, beta ,,");
        assert!(keys.is_valid("alpha"));
        assert!(keys.is_valid("beta"));
        assert!(!keys.is_valid(""));
        assert!(!keys.is_valid("gamma"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(
            extract_bearer(None),
            Err(WebError::Unauthorized(_))
        ));
        assert!(matches!(
            extract_bearer(Some("Basic abc")),
            Err(WebError::Unauthorized(_))
        ));
        assert!(matches!(
            extract_bearer(Some("Bearer ")),
            Err(WebError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let token = token_for(&user_id.to_string(), AUDIENCE, in_one_hour());

        let user = JwtVerifier::new(SECRET).verify(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email.as_deref(), Some("fan@example.com"));
    }

    #[test]
    fn test_rejects_wrong_secret_and_audience() {
        let user_id = Uuid::new_v4().to_string();

        let token = token_for(&user_id, AUDIENCE, in_one_hour());
        assert!(JwtVerifier::new("other-secret").verify(&token).is_err());

        let token = token_for(&user_id, "anon", in_one_hour());
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_and_non_uuid_subject() {
        let token = token_for(&Uuid::new_v4().to_string(), AUDIENCE, 1_000);
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());

        let token = token_for("service-role", AUDIENCE, in_one_hour());
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());
    }
}
