use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info, warn};
use uuid::Uuid;

use gather_core::accounts::{self, NewAccount};
use gather_db::Database;
use gather_types::api::{
    Claims, Envelope, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
};

use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, token_ttl_days: i64) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl_days,
        })
    }
}

/// Runs a blocking core operation off the async runtime.
pub(crate) async fn run<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> gather_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let password_len = req.password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password_len) {
        return Err(ApiError::BadRequest(format!(
            "password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }

    // Argon2 is deliberately slow; keep it off the async threads too.
    let password = req.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    let user = run(&state, move |db| {
        accounts::register(
            db,
            &NewAccount {
                username: &req.username,
                email: &req.email,
                country_code: &req.country_code,
                phone_number: &req.phone_number,
                password_hash: &password_hash,
                display_name: &req.display_name,
            },
        )
    })
    .await?;

    let token = create_token(&state, user.id, &user.username)?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "account created",
            RegisterResponse {
                user_id: user.id,
                token,
            },
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let username = req.username.trim().to_string();
    let user = tokio::task::spawn_blocking(move || {
        let user = db.db.get_user_by_username(req.username.trim())?;
        let Some(user) = user else {
            return Ok::<_, ApiError>(None);
        };
        let verified = {
            let parsed_hash = PasswordHash::new(&user.password)
                .map_err(|e| anyhow::anyhow!("stored hash for {} is malformed: {}", user.id, e))?;
            Argon2::default()
                .verify_password(req.password.as_bytes(), &parsed_hash)
                .is_ok()
        };
        Ok(verified.then_some(user))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    let Some(user) = user else {
        warn!("Failed login for {}", username);
        return Err(ApiError::InvalidCredentials);
    };

    let token = create_token(&state, user.id, &user.username)?;
    info!("{} logged in", user.username);

    Ok(Json(Envelope::ok(
        "logged in",
        LoginResponse {
            user_id: user.id,
            username: user.username,
            token,
        },
    )))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn create_token(state: &AppStateInner, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(state.token_ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}
