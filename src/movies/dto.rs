use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::movies::repo_types::{MovieFilter, SortColumn};

/// Query string of `GET /movies`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesQuery {
    pub search: Option<String>,
    pub director: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

impl From<ListMoviesQuery> for MovieFilter {
    fn from(q: ListMoviesQuery) -> Self {
        let sort_by = non_empty(q.sort_by).and_then(|name| {
            let col = SortColumn::parse(&name);
            if col.is_none() {
                warn!(sort_by = %name, "ignoring sort on column outside the allow-list");
            }
            col
        });
        Self {
            search: non_empty(q.search),
            director: non_empty(q.director),
            sort_by,
        }
    }
}

/// Body of `POST /movie` and `PATCH /movie/:id`.
#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    pub title: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
