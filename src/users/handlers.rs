use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{RegisterRequest, VerifyQuery},
        repo_types::PublicUser,
        services::{self, is_valid_email, Registration, VerificationResult},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", get(verify_email))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let Json(payload) = payload?;
    let fullname = payload.fullname.unwrap_or_default().trim().to_string();
    let username = payload.username.unwrap_or_default().trim().to_string();
    let email = payload.email.unwrap_or_default().trim().to_lowercase();
    let password = payload.password.unwrap_or_default();

    if fullname.is_empty() || username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::validation(
            "All fields (fullname, username, email, password) are required.",
        ));
    }

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    let user = services::register(
        state.users.as_ref(),
        state.mailer.clone(),
        Registration {
            fullname,
            username,
            email,
            password,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, q))]
pub async fn verify_email(
    State(state): State<AppState>,
    q: Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<VerificationResult>, AppError> {
    let Query(q) = q?;
    let token = q
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::validation("Token is required."))?;
    let result = services::verify(state.users.as_ref(), &token).await?;
    Ok(Json(result))
}
