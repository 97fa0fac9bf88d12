use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    movies::repo_types::{Movie, MovieFilter, MovieInput},
};

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, AppError>;
    async fn get(&self, id: i64) -> Result<Option<Movie>, AppError>;
    async fn create(&self, input: MovieInput) -> Result<Movie, AppError>;
    /// `None` when no row has `id`.
    async fn update(&self, id: i64, input: MovieInput) -> Result<Option<Movie>, AppError>;
    /// `false` when no row has `id`.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

pub struct PgMovieStore {
    db: PgPool,
}

impl PgMovieStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn list_query(filter: &MovieFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT id, title, director, release_year FROM movies");
    let mut sep = " WHERE ";

    if let Some(search) = &filter.search {
        qb.push(sep).push("title ILIKE ").push_bind(format!("%{search}%"));
        sep = " AND ";
    }
    if let Some(director) = &filter.director {
        qb.push(sep).push("director = ").push_bind(director.clone());
    }
    if let Some(col) = filter.sort_by {
        qb.push(" ORDER BY ").push(col.as_sql());
    }
    qb
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, AppError> {
        let mut qb = list_query(filter);
        let rows = qb
            .build_query_as::<Movie>()
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            SELECT id, title, director, release_year
            FROM movies
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(movie)
    }

    async fn create(&self, input: MovieInput) -> Result<Movie, AppError> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, director, release_year)
            VALUES ($1, $2, $3)
            RETURNING id, title, director, release_year
            "#,
        )
        .bind(input.title)
        .bind(input.director)
        .bind(input.release_year)
        .fetch_one(&self.db)
        .await?;
        Ok(movie)
    }

    async fn update(&self, id: i64, input: MovieInput) -> Result<Option<Movie>, AppError> {
        let movie = sqlx::query_as::<_, Movie>(
            r#"
            UPDATE movies
               SET title = $1, director = $2, release_year = $3
             WHERE id = $4
            RETURNING id, title, director, release_year
            "#,
        )
        .bind(input.title)
        .bind(input.director)
        .bind(input.release_year)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(movie)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
