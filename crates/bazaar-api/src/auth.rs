use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use bazaar_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::run_blocking;
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();
    if !email.contains('@') {
        return Err(ApiError::validation("Valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }
    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    let users = state.users.clone();
    let (user_id, email) = run_blocking(move || {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        let user_id = users
            .create_user(&email, &password_hash, &name)?
            .ok_or_else(|| ApiError::AlreadyExists("Email is already registered".into()))?;
        Ok((user_id, email))
    })
    .await?;

    let token = create_token(&state.auth.jwt_secret, user_id, &email, state.auth.token_ttl_days)?;
    info!("User {} registered", user_id);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let email = req.email.trim().to_lowercase();

    let users = state.users.clone();
    let user = run_blocking(move || {
        let Some(user) = users.find_user_by_email(&email)? else {
            return Ok(None);
        };

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for user {} unreadable: {}", user.id, e))?;
        let verified = Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_ok();
        Ok(verified.then_some(user))
    })
    .await?;

    let Some(user) = user else {
        warn!("Failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let token = create_token(&state.auth.jwt_secret, user.id, &user.email, state.auth.token_ttl_days)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email,
        token,
    }))
}

pub(crate) fn create_token(
    secret: &str,
    user_id: i64,
    email: &str,
    ttl_days: i64,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
