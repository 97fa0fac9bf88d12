use std::sync::Arc;

use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    auth::password::hash_password_blocking,
    error::AppError,
    mailer::Mailer,
    users::{
        repo::{NewUser, UserStore},
        repo_types::PublicUser,
    },
};

const VERIFICATION_TOKEN_LEN: usize = 48;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 48 alphanumeric characters from the thread-local CSPRNG.
pub fn generate_verification_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationResult {
    pub message: &'static str,
}

/// Persists a new unverified user and sends the verification email in the
/// background. Delivery failures are logged, never returned.
pub async fn register(
    users: &dyn UserStore,
    mailer: Arc<dyn Mailer>,
    input: Registration,
) -> Result<PublicUser, AppError> {
    let password_hash = hash_password_blocking(input.password).await?;
    let verification_token = generate_verification_token();

    let user = users
        .insert(NewUser {
            fullname: input.fullname,
            username: input.username,
            email: input.email,
            password_hash,
            verification_token: verification_token.clone(),
        })
        .await
        .map_err(|e| {
            if matches!(e, AppError::DuplicateIdentity) {
                warn!("username or email already registered");
            }
            e
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");

    let to = user.email.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_verification(&to, &verification_token).await {
            error!(error = ?e, to = %to, "failed to send verification email");
        }
    });

    Ok(user.into())
}

/// Consumes a verification token. A token works at most once.
pub async fn verify(users: &dyn UserStore, token: &str) -> Result<VerificationResult, AppError> {
    if token.is_empty() {
        return Err(AppError::InvalidVerificationToken);
    }
    match users.consume_verification_token(token).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "email verified");
            Ok(VerificationResult {
                message: "Email verified successfully",
            })
        }
        None => {
            warn!("unknown or already used verification token");
            Err(AppError::InvalidVerificationToken)
        }
    }
}
