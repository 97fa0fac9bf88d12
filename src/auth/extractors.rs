use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{
    auth::{claims::Claims, services::authenticate},
    error::AppError,
    state::AppState,
};

/// Identity of the caller on protected routes.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let claims = authenticate(state.jwt.as_deref(), header)?;
        Ok(AuthUser(claims))
    }
}
