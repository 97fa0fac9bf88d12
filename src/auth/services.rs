use tracing::{info, warn};

use crate::{
    auth::{claims::Claims, jwt::JwtKeys, password::verify_password_blocking},
    error::AppError,
    users::{repo::UserStore, repo_types::PublicUser},
};

/// A freshly signed session token and the user it was issued for.
#[derive(Debug)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

/// Checks credentials and signs a session token. Unknown email and wrong
/// password produce the same error.
pub async fn issue_session(
    users: &dyn UserStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<Session, AppError> {
    let Some(user) = users.find_by_email(email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    let ok = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(&user)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Session {
        token,
        user: user.into(),
    })
}

/// Extracts the token from a `Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or(AppError::MissingToken)?.trim();
    let (scheme, token) = header.split_once(' ').ok_or(AppError::MissingToken)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::MissingToken);
    }
    Ok(token)
}

/// Validates the `Authorization` header of a protected request.
pub fn authenticate(keys: Option<&JwtKeys>, header: Option<&str>) -> Result<Claims, AppError> {
    let token = bearer_token(header)?;
    let keys = keys.ok_or_else(missing_secret)?;
    keys.verify(token)
}

pub fn missing_secret() -> AppError {
    AppError::Configuration("JWT_SECRET is not set".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{jwt::tests::make_keys, password::hash_password},
        fakes::MemoryUserStore,
        users::repo::NewUser,
    };

    async fn store_with_jane() -> MemoryUserStore {
        let store = MemoryUserStore::default();
        store
            .insert(NewUser {
                fullname: "Jane Doe".into(),
                username: "jane".into(),
                email: "jane@x.com".into(),
                password_hash: hash_password("secret123").unwrap(),
                verification_token: "tok".into(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let store = store_with_jane().await;
        let keys = make_keys("dev-secret");

        let wrong_pass = issue_session(&store, &keys, "jane@x.com", "wrongpass")
            .await
            .unwrap_err();
        let unknown = issue_session(&store, &keys, "nobody@x.com", "secret123")
            .await
            .unwrap_err();

        assert!(matches!(wrong_pass, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong_pass.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn session_claims_match_user() {
        let store = store_with_jane().await;
        let keys = make_keys("dev-secret");

        let session = issue_session(&store, &keys, "jane@x.com", "secret123")
            .await
            .expect("login");
        let header = format!("Bearer {}", session.token);
        let claims = authenticate(Some(&keys), Some(header.as_str())).expect("authenticate");

        assert_eq!(claims.id, session.user.id);
        assert_eq!(claims.username, "jane");
        assert_eq!(claims.email, "jane@x.com");
    }

    #[tokio::test]
    async fn unverified_user_can_still_log_in() {
        let store = store_with_jane().await;
        let session = issue_session(&store, &make_keys("k"), "jane@x.com", "secret123")
            .await
            .unwrap();
        assert!(!session.user.is_verified);
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bearer abc")).unwrap(), "abc");
        assert!(matches!(bearer_token(None), Err(AppError::MissingToken)));
        assert!(matches!(bearer_token(Some("Bearer")), Err(AppError::MissingToken)));
        assert!(matches!(bearer_token(Some("Bearer   ")), Err(AppError::MissingToken)));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AppError::MissingToken)));
    }

    #[test]
    fn authenticate_distinguishes_missing_from_invalid() {
        let keys = make_keys("dev-secret");
        assert!(matches!(authenticate(Some(&keys), None), Err(AppError::MissingToken)));
        assert!(matches!(
            authenticate(Some(&keys), Some("Bearer nope")),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn authenticate_without_secret_is_a_configuration_error() {
        assert!(matches!(
            authenticate(None, Some("Bearer abc")),
            Err(AppError::Configuration(_))
        ));
        // header problems are still reported first
        assert!(matches!(authenticate(None, None), Err(AppError::MissingToken)));
    }
}
