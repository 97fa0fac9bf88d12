use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// `None` keeps the server up but refuses to issue or check sessions.
    pub secret: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Without a host, verification links are only logged.
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub starttls: bool,
}

/// S3-compatible bucket (AWS or MinIO) addressed path-style.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local { root: String },
    S3(S3Config),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub public_base_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt = JwtConfig {
            secret: env_opt("JWT_SECRET"),
            issuer: env_or("JWT_ISSUER", "movie-api"),
            audience: env_or("JWT_AUDIENCE", "movie-api-users"),
            ttl_minutes: env_opt("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };

        let mail = MailConfig {
            host: env_opt("EMAIL_HOST"),
            port: env_opt("EMAIL_PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            username: env_opt("EMAIL_USER"),
            password: env_opt("EMAIL_PASS"),
            from: env_or("EMAIL_FROM", "\"Movie App\" <noreply@movieapp.com>"),
            starttls: env_flag("EMAIL_STARTTLS", true),
        };

        let storage = match env_or("STORAGE_BACKEND", "local").as_str() {
            "s3" => StorageConfig::S3(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: env_or("S3_REGION", "us-east-1"),
            }),
            "local" => StorageConfig::Local {
                root: env_or("UPLOAD_DIR", "."),
            },
            other => anyhow::bail!("unknown STORAGE_BACKEND {other:?} (expected local or s3)"),
        };

        Ok(Self {
            database_url,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            jwt,
            mail,
            storage,
        })
    }
}
