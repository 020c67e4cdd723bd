//! Catalog entity documents
//!
//! These are the denormalized documents stored in the search index and in the
//! cache. Genres and persons embedded inside a movie are snapshots taken at
//! sync time, not live references; the sync pipeline fully replaces a document
//! on every update and the read path never mutates one.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Binds an entity type to its search index and full-text search field.
///
/// The lookup layer is generic over this trait, so the index name and the
/// fuzzy-search field are resolved at compile time per entity kind.
pub trait CatalogEntity:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Search index holding documents of this kind.
    const INDEX: &'static str;

    /// Document field targeted by free-text search.
    const SEARCH_FIELD: &'static str;
}

/// A movie genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl CatalogEntity for Genre {
    const INDEX: &'static str = "genres";
    const SEARCH_FIELD: &'static str = "name";
}

/// Short person form embedded in a movie's role lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub full_name: String,
}

/// A person with their roles and movie appearances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub movies_ids: Vec<Uuid>,
}

impl CatalogEntity for Person {
    const INDEX: &'static str = "persons";
    const SEARCH_FIELD: &'static str = "full_name";
}

/// A movie document.
///
/// The `*_names` lists are the `full_name` projection of the matching
/// [`PersonRef`] list, in the same order. Both are derived from one source by
/// the sync pipeline's transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    #[validate(range(min = 0.0, max = 10.0))]
    pub imdb_rating: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub creation_date: Option<NaiveDate>,
    pub file_path: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub directors: Vec<PersonRef>,
    #[serde(default)]
    pub actors: Vec<PersonRef>,
    #[serde(default)]
    pub writers: Vec<PersonRef>,
    #[serde(default)]
    pub directors_names: Vec<String>,
    #[serde(default)]
    pub actors_names: Vec<String>,
    #[serde(default)]
    pub writers_names: Vec<String>,
}

impl CatalogEntity for Movie {
    const INDEX: &'static str = "movies";
    const SEARCH_FIELD: &'static str = "title";
}

/// Summary projection returned by movie list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: Uuid,
    pub title: String,
    pub imdb_rating: Option<f64>,
}

impl From<&Movie> for MovieSummary {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            imdb_rating: movie.imdb_rating,
        }
    }
}
