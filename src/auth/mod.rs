//! Signup, login and JWT verification.
//!
//! Every API endpoint except signup/login requires a bearer token; handlers
//! receive the verified identity through the [`CurrentUser`] extractor.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap};
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::shared::error::ApiError;
use crate::shared::schema::users;
use crate::shared::state::AppState;

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    pub token_expiry_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            token_expiry_hours,
        }
    }

    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.jwt_secret.as_bytes())
    }

    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.jwt_secret.as_bytes())
    }
}

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Identity of the authenticated caller, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| {
            if auth.to_lowercase().starts_with("bearer ") {
                Some(auth[7..].to_string())
            } else {
                None
            }
        })
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required.".to_string()))?;

        let claims = verify_token(&state.auth, &token)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Unauthorized("Invalid token subject.".to_string()))?;

        Ok(CurrentUser {
            id,
            email: claims.email,
        })
    }
}

pub fn issue_token(auth: &AuthConfig, user_id: Uuid, email: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        exp: (now + Duration::hours(auth.token_expiry_hours)).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &auth.encoding_key())
        .map_err(|e| ApiError::Database(format!("token generation failed: {e}")))
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &auth.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token.".to_string()))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Database(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::validation("email", "Enter a valid email address."));
    }
    if req.password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "Password must be at least 8 characters.",
        ));
    }

    let mut conn = state.conn.get()?;

    let existing: i64 = users::table
        .filter(users::email.eq(&req.email))
        .count()
        .get_result(&mut conn)?;
    if existing > 0 {
        return Err(ApiError::validation(
            "email",
            "A user with this email already exists.",
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        password_hash: hash_password(&req.password)?,
        first_name: req.first_name,
        last_name: req.last_name,
        created_at: Utc::now(),
    };

    diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut conn)?;

    info!("user signed up: {}", user.email);

    // The user row is kept even when token generation fails; the caller
    // recovers by logging in.
    let token = match issue_token(&state.auth, user.id, &user.email) {
        Ok(token) => token,
        Err(e) => {
            error!("token generation failed after signup: {e}");
            return Err(ApiError::Database(
                "Account created but token generation failed; log in to continue.".to_string(),
            ));
        }
    };

    Ok(Json(TokenResponse { token, user }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut conn = state.conn.get()?;

    let user: User = users::table
        .filter(users::email.eq(&req.email))
        .first(&mut conn)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials.".to_string()))?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials.".to_string()));
    }

    let token = issue_token(&state.auth, user.id, &user.email)?;
    Ok(Json(TokenResponse { token, user }))
}

/// Exchange a Google ID token for a local session token. The token payload
/// is decoded for its email claim; a user row is created on first login.
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = decode_google_email(&req.id_token)
        .ok_or_else(|| ApiError::validation("id_token", "Invalid Google ID token."))?;

    let mut conn = state.conn.get()?;

    let user: User = match users::table
        .filter(users::email.eq(&email))
        .first(&mut conn)
        .optional()?
    {
        Some(user) => user,
        None => {
            let user = User {
                id: Uuid::new_v4(),
                email: email.clone(),
                // No usable password for OAuth accounts.
                password_hash: hash_password(&Uuid::new_v4().to_string())?,
                first_name: None,
                last_name: None,
                created_at: Utc::now(),
            };
            diesel::insert_into(users::table)
                .values(&user)
                .execute(&mut conn)?;
            info!("user created via google login: {email}");
            user
        }
    };

    let token = issue_token(&state.auth, user.id, &user.email)?;
    Ok(Json(TokenResponse { token, user }))
}

fn decode_google_email(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("email")?.as_str().map(String::from)
}

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google_login))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::new("test-secret", 24)
    }

    #[test]
    fn issued_tokens_verify_and_round_trip_claims() {
        let auth = test_config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&auth, user_id, "alice@example.com").unwrap();
        let claims = verify_token(&auth, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");
    }

    #[test]
    fn tokens_signed_with_other_secret_are_rejected() {
        let token = issue_token(&test_config(), Uuid::new_v4(), "a@b.c").unwrap();
        let other = AuthConfig::new("different-secret", 24);
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn password_hash_verifies_only_matching_password() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("battery-staple", &hash));
    }

    #[test]
    fn google_email_is_decoded_from_token_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(r#"{"email":"g@example.com","aud":"x"}"#);
        let token = format!("header.{payload}.sig");
        assert_eq!(decode_google_email(&token).as_deref(), Some("g@example.com"));
        assert_eq!(decode_google_email("garbage"), None);
    }
}
