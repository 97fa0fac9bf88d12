use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::jwt::JwtKeys,
    config::AppConfig,
    mailer::{self, Mailer},
    movies::repo::{MovieStore, PgMovieStore},
    storage::{self, StorageClient},
    users::repo::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub movies: Arc<dyn MovieStore>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
    /// `None` when JWT_SECRET is missing.
    pub jwt: Option<Arc<JwtKeys>>,
}

impl AppState {
    /// Wires the Postgres stores and external collaborators around an
    /// already opened pool. The caller owns the pool's lifecycle.
    pub async fn init(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let jwt = JwtKeys::from_config(&config.jwt).map(Arc::new);
        if jwt.is_none() {
            tracing::warn!("JWT_SECRET is not set; login and protected routes will fail");
        }

        let storage = storage::from_config(&config.storage).await?;
        let mailer = mailer::from_config(&config.mail, &config.public_base_url)?;

        Ok(Self {
            users: Arc::new(PgUserStore::new(db.clone())),
            movies: Arc::new(PgMovieStore::new(db)),
            storage,
            mailer,
            jwt,
        })
    }
}
