use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,              // Argon2 PHC string
    pub is_verified: bool,
    pub verification_token: Option<String>, // cleared once consumed
    pub created_at: OffsetDateTime,
}

/// The part of a user that may leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            fullname: u.fullname,
            username: u.username,
            email: u.email,
            is_verified: u.is_verified,
            created_at: u.created_at,
        }
    }
}
