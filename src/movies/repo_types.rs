use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub director: Option<String>,
    pub release_year: Option<i32>,
}

/// Fields written by create and update.
#[derive(Debug, Clone)]
pub struct MovieInput {
    pub title: String,
    pub director: Option<String>,
    pub release_year: Option<i32>,
}

/// Columns a listing may be ordered by. Anything else is never spliced
/// into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Director,
    ReleaseYear,
}

impl SortColumn {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "director" => Some(Self::Director),
            "release_year" => Some(Self::ReleaseYear),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Director => "director",
            Self::ReleaseYear => "release_year",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Exact director.
    pub director: Option<String>,
    pub sort_by: Option<SortColumn>,
}
