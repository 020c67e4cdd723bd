//! Structured query body composition
//!
//! Builds the bodies consumed by [`SearchBackend::query`]: a sort clause on
//! the rating field, a nested filter over a movie's embedded genre list, or
//! both merged into one body for "popular movies in a genre". The pagination
//! window is merged in by the backend itself.
//!
//! [`SearchBackend::query`]: crate::search::SearchBackend::query

use serde_json::{json, Value};
use uuid::Uuid;

/// Fields the catalog allows sorting on. Currently only the rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    ImdbRating,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::ImdbRating => "imdb_rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A parsed sort clause.
///
/// Client tokens carry the direction as a leading `-`: `-imdb_rating` sorts
/// descending, `imdb_rating` ascending. An absent token defaults to rating
/// descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortKey {
    /// Rating descending, the default ordering for movie lists.
    pub fn rating_desc() -> Self {
        Self {
            field: SortField::ImdbRating,
            order: SortOrder::Desc,
        }
    }

    /// Parse a client-supplied sort token. Unknown fields are rejected; the
    /// route layer maps the rejection to a validation failure.
    pub fn parse(token: Option<&str>) -> Result<Self, String> {
        match token {
            None | Some("") => Ok(Self::rating_desc()),
            Some("imdb_rating") => Ok(Self {
                field: SortField::ImdbRating,
                order: SortOrder::Asc,
            }),
            Some("-imdb_rating") => Ok(Self {
                field: SortField::ImdbRating,
                order: SortOrder::Desc,
            }),
            Some(other) => Err(format!("unknown sort field: {other}")),
        }
    }

    fn clause(&self) -> Value {
        json!({ "sort": { self.field.as_str(): self.order.as_str() } })
    }
}

/// Nested filter matching movies whose embedded genre list contains the id.
fn genre_filter(genre_id: Uuid) -> Value {
    json!({
        "query": {
            "nested": {
                "path": "genres",
                "query": {
                    "term": { "genres.id": genre_id.to_string() }
                }
            }
        }
    })
}

/// Compose the structured body for a sorted, optionally genre-filtered movie
/// listing. Sort and filter occupy disjoint top-level keys and merge
/// shallowly.
pub fn sorted_list_body(sort: SortKey, genre_id: Option<Uuid>) -> Value {
    let mut body = sort.clause();
    if let Some(id) = genre_id {
        if let (Value::Object(target), Value::Object(filter)) = (&mut body, genre_filter(id)) {
            target.extend(filter);
        }
    }
    body
}
