use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    movies::{
        dto::{ListMoviesQuery, MessageResponse, MovieRequest},
        repo_types::{Movie, MovieFilter, MovieInput},
    },
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movie", post(create_movie))
        .route("/movie/:id", get(get_movie).patch(update_movie).delete(delete_movie))
}

fn movie_input(body: Result<Json<MovieRequest>, JsonRejection>) -> Result<MovieInput, AppError> {
    let Json(body) = body?;
    let title = body.title.unwrap_or_default();
    if title.trim().is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    Ok(MovieInput {
        title,
        director: body.director,
        release_year: body.release_year,
    })
}

/// Ids that are not integers cannot name a stored movie.
fn movie_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unparseable movie id");
        AppError::NotFound("Movie")
    })
}

#[instrument(skip(state, q))]
pub async fn list_movies(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    q: Result<Query<ListMoviesQuery>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let Query(q) = q?;
    let filter = MovieFilter::from(q);
    info!(username = %claims.username, ?filter, "listing movies");
    let movies = state.movies.list(&filter).await?;
    Ok(Json(movies))
}

#[instrument(skip(state, id))]
pub async fn get_movie(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Movie>, AppError> {
    let id = movie_id(id)?;
    let movie = state.movies.get(id).await?.ok_or(AppError::NotFound("Movie"))?;
    Ok(Json(movie))
}

#[instrument(skip(state, body))]
pub async fn create_movie(
    State(state): State<AppState>,
    body: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Movie>), AppError> {
    let movie = state.movies.create(movie_input(body)?).await?;
    info!(movie_id = movie.id, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

#[instrument(skip(state, id, body))]
pub async fn update_movie(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<MovieRequest>, JsonRejection>,
) -> Result<Json<Movie>, AppError> {
    let id = movie_id(id)?;
    let input = movie_input(body)?;
    let movie = state
        .movies
        .update(id, input)
        .await?
        .ok_or(AppError::NotFound("Movie"))?;
    Ok(Json(movie))
}

#[instrument(skip(state, id))]
pub async fn delete_movie(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = movie_id(id)?;
    if !state.movies.delete(id).await? {
        return Err(AppError::NotFound("Movie"));
    }
    info!(movie_id = id, "movie deleted");
    Ok(Json(MessageResponse {
        message: "Movie deleted successfully",
    }))
}
