//! In-memory collaborators for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    auth::jwt::{tests::make_keys, JwtKeys},
    error::AppError,
    mailer::Mailer,
    movies::{
        repo::MovieStore,
        repo_types::{Movie, MovieFilter, MovieInput, SortColumn},
    },
    state::AppState,
    storage::StorageClient,
    users::{
        repo::{NewUser, UserStore},
        repo_types::User,
    },
};

pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new: NewUser) -> Result<User, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|u| u.username == new.username || u.email == new.email)
        {
            return Err(AppError::DuplicateIdentity);
        }
        let user = User {
            id: Uuid::new_v4(),
            fullname: new.fullname,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            is_verified: false,
            verification_token: Some(new.verification_token),
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(user) = rows
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };
        user.is_verified = true;
        user.verification_token = None;
        Ok(Some(user.id))
    }
}

#[derive(Default)]
pub struct MemoryMovieStore {
    rows: Mutex<Vec<Movie>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<Movie> = rows
            .iter()
            .filter(|m| {
                filter
                    .search
                    .as_ref()
                    .map_or(true, |s| m.title.to_lowercase().contains(&s.to_lowercase()))
            })
            .filter(|m| {
                filter
                    .director
                    .as_ref()
                    .map_or(true, |d| m.director.as_ref() == Some(d))
            })
            .cloned()
            .collect();
        match filter.sort_by {
            Some(SortColumn::Id) => out.sort_by_key(|m| m.id),
            Some(SortColumn::Title) => out.sort_by(|a, b| a.title.cmp(&b.title)),
            Some(SortColumn::Director) => out.sort_by(|a, b| a.director.cmp(&b.director)),
            Some(SortColumn::ReleaseYear) => out.sort_by_key(|m| m.release_year),
            None => {}
        }
        Ok(out)
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|m| m.id == id).cloned())
    }

    async fn create(&self, input: MovieInput) -> Result<Movie, AppError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let movie = Movie {
            id,
            title: input.title,
            director: input.director,
            release_year: input.release_year,
        };
        self.rows.lock().unwrap().push(movie.clone());
        Ok(movie)
    }

    async fn update(&self, id: i64, input: MovieInput) -> Result<Option<Movie>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(movie) = rows.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        movie.title = input.title;
        movie.director = input.director;
        movie.release_year = input.release_year;
        Ok(Some(movie.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|m| m.id != id);
        Ok(rows.len() != before)
    }
}

/// Keeps `(key, content_type, body)` of every stored object.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<(String, String, Bytes)>>,
}

impl MemoryStorage {
    pub fn objects(&self) -> Vec<(String, String, Bytes)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<String> {
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string(), body));
        Ok(key.to_string())
    }
}

/// Forwards `(to, token)` of every verification email to a channel.
pub struct RecordingMailer {
    tx: mpsc::UnboundedSender<(String, String)>,
}

impl RecordingMailer {
    pub fn new() -> (Arc<dyn Mailer>, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &str, token: &str) -> anyhow::Result<()> {
        let _ = self.tx.send((to.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_verification(&self, _to: &str, _token: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp relay unreachable")
    }
}

pub struct Fakes {
    pub users: Arc<MemoryUserStore>,
    pub movies: Arc<MemoryMovieStore>,
    pub storage: Arc<MemoryStorage>,
    pub sent: mpsc::UnboundedReceiver<(String, String)>,
}

impl AppState {
    /// State backed entirely by in-memory fakes, signing with `TEST_SECRET`.
    pub fn fake() -> (Self, Fakes) {
        Self::fake_with_keys(Some(make_keys(TEST_SECRET)))
    }

    pub fn fake_with_keys(jwt: Option<JwtKeys>) -> (Self, Fakes) {
        let users = Arc::new(MemoryUserStore::default());
        let movies = Arc::new(MemoryMovieStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let (mailer, sent) = RecordingMailer::new();

        let state = AppState {
            users: users.clone(),
            movies: movies.clone(),
            storage: storage.clone(),
            mailer,
            jwt: jwt.map(Arc::new),
        };
        (
            state,
            Fakes {
                users,
                movies,
                storage,
                sent,
            },
        )
    }
}
