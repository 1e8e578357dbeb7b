use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::schemas::{AppState, ErrorResponse};

/// Bearer-token lifetime: seven days. There is no refresh mechanism;
/// expiry forces a fresh login.
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Actor role carried inside a bearer token.
///
/// `Admin` and `User` come from the users table; `Agent` tokens are issued
/// by the agent login path against the agents table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
    User,
}

impl From<user::UserRole> for Role {
    fn from(role: user::UserRole) -> Self {
        match role {
            user::UserRole::Admin => Role::Admin,
            user::UserRole::User => Role::User,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::User => "user",
        }
    }
}

/// Signed token payload: identity, role, email and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub role: Role,
    pub email: String,
    pub exp: usize,
}

/// Failures raised by token handling and the request extractors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The Authorization header is missing or is not a bearer header.
    #[error("Unauthorized")]
    MissingToken,
    /// The token failed signature validation or has expired.
    #[error("Invalid token")]
    InvalidToken,
    /// The caller is authenticated but lacks the required role.
    #[error("Forbidden")]
    Forbidden,
    /// Signing a new token failed.
    #[error("Failed to issue token")]
    TokenCreation,
}

impl AuthError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ERROR"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            success: false,
        });
        (status, body).into_response()
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Check a candidate password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(password, hash)
}

/// Issue a signed token for an authenticated identity.
pub fn create_token(secret: &str, id: i32, role: Role, email: &str) -> Result<String, AuthError> {
    let exp = (Utc::now().timestamp() + TOKEN_TTL_SECS) as usize;
    let claims = Claims {
        id,
        role,
        email: email.to_owned(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to sign token: {}", e);
        AuthError::TokenCreation
    })
}

/// Validate a token's signature and expiry, returning its claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Token validation failed: {}", e);
        AuthError::InvalidToken
    })
}

/// Extracts the bearer token from `parts`, without validating it yet.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let mut pieces = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (pieces.next(), pieces.next()) else {
        return Err(AuthError::MissingToken);
    };

    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::MissingToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

/// Extractor for any authenticated caller.
///
/// Rejects with 401 when the bearer header is missing or malformed, and
/// when the token's signature or expiry does not check out.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.jwt_secret, token)?;
        Ok(AuthUser(claims))
    }
}

/// Extractor for routes restricted to the admin role.
///
/// Authenticates like [`AuthUser`], then rejects non-admin callers with 403.
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            warn!(
                "Caller {} with role {} denied on admin-only route",
                claims.id,
                claims.role.as_str()
            );
            return Err(AuthError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}
