//! JWT Authentication
//!
//! Tokens are looked up in the `token` header, then an `Authorization: Bearer`
//! header, then a `token` query parameter. A request without any token is
//! forbidden; a request with a bad token is unauthorized.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::{User, UserRole},
    services::AuthService,
    utils::error::ErrorResponse,
    AppState,
};

/// Header carrying a raw token
pub const TOKEN_HEADER: &str = "token";

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Not before timestamp
    pub nbf: i64,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// Authenticated user resolved from a token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Create a new JWT access token
pub fn create_access_token(
    user: &User,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours as i64);

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role,
        iat: now.timestamp(),
        exp: exp.timestamp(),
        nbf: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<TokenData<Claims>, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.validate_nbf = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// Authentication error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenExpired,
    UnknownUser,
    AdminRequired,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::AdminRequired => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "No token provided.",
            AuthError::InvalidToken => "Failed to authenticate token.",
            AuthError::TokenExpired => "Authentication token has expired.",
            AuthError::UnknownUser => "Token does not belong to a known user.",
            AuthError::AdminRequired => "User is not an admin.",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match self.status() {
            StatusCode::FORBIDDEN => "forbidden",
            _ => "unauthorized",
        };
        (self.status(), Json(ErrorResponse::new(error, self.message()))).into_response()
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Extract token from query string
pub fn extract_query_token(uri: &Uri) -> Option<String> {
    uri.query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == "token" && !value.is_empty()).then(|| value.to_string())
        })
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Find a token in the `token` or `Authorization` header
pub fn extract_header_token(headers: &HeaderMap) -> Option<String> {
    header_str(headers, TOKEN_HEADER)
        .filter(|t| !t.is_empty())
        .or_else(|| header_str(headers, AUTHORIZATION.as_str()).and_then(extract_bearer_token))
        .map(str::to_string)
}

/// Find a token in the request headers, falling back to the query string
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    extract_header_token(headers).or_else(|| extract_query_token(uri))
}

/// Resolve a token to the user it was issued to.
///
/// The role comes from the stored user so a demoted account loses admin
/// rights before its token expires.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<AuthUser, AuthError> {
    let claims = validate_token(token, &state.config.auth.jwt_secret)?.claims;
    let user_id: i64 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    let user = AuthService::new(state.db.clone())
        .get_user_by_id(user_id)
        .await
        .map_err(|e| {
            debug!(error = %e, "User lookup failed during authentication");
            AuthError::InvalidToken
        })?
        .ok_or(AuthError::UnknownUser)?;

    Ok(user.into())
}

/// Extractor for routes that require a logged-in user
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = extract_token(&parts.headers, &parts.uri).ok_or(AuthError::MissingToken)?;
        let user = authenticate_token(state, &token).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Extractor for admin-only routes
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthError::AdminRequired);
        }
        Ok(AdminUser(user))
    }
}

/// Extractor for routes that behave differently for logged-in users.
/// Missing or bad tokens give `None`.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
