//! Per-entity catalog services
//!
//! Genres and persons are served directly by the generic lookup layer. The
//! movie service wraps it to add the two movie-only operations: similar
//! movies (per-genre fan-out) and popular-in-genre.

use std::sync::Arc;

use cinema_search_core::{CatalogEntity, Movie, Page};
use tracing::instrument;
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::composer::SortKey;
use crate::lookup::LookupService;
use crate::search::{SearchBackend, SearchError};

pub type GenreService = LookupService<cinema_search_core::Genre>;
pub type PersonService = LookupService<cinema_search_core::Person>;

/// Movie lookups plus similarity and popularity composition.
pub struct MovieService {
    lookup: LookupService<Movie>,
    popular_page_size: u32,
}

impl MovieService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        backend: Arc<dyn SearchBackend>,
        cache_ttl_sec: u64,
        popular_page_size: u32,
    ) -> Self {
        Self {
            lookup: LookupService::new(cache, backend, cache_ttl_sec),
            popular_page_size,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Movie>, SearchError> {
        self.lookup.get_by_id(id).await
    }

    pub async fn get_by_search(&self, query: &str, page: Page) -> Result<Vec<Movie>, SearchError> {
        self.lookup.get_by_search(query, page).await
    }

    pub async fn get_sorted_list(
        &self,
        sort: SortKey,
        genre_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<Movie>, SearchError> {
        self.lookup.get_sorted_list(sort, genre_id, page).await
    }

    /// Movies similar to the given one, keyed `similar:{movie_id}:movies`.
    ///
    /// Similarity is genre co-membership: for each genre of the movie, in
    /// document order, take the top rated movies in that genre and
    /// concatenate the batches. Duplicates across genres are preserved. The
    /// fan-out runs sequentially in genre order; a backend failure anywhere
    /// aborts the whole operation before the `similar:` key is written.
    #[instrument(skip(self), fields(movie_id = %movie_id))]
    pub async fn get_similar(&self, movie_id: Uuid) -> Result<Vec<Movie>, SearchError> {
        let key = format!("similar:{}:{}", movie_id, Movie::INDEX);

        if let Some(list) = self.lookup.cached_list(&key).await {
            return Ok(list);
        }

        let Some(movie) = self.lookup.get_by_id(movie_id).await? else {
            return Ok(Vec::new());
        };

        let mut similar = Vec::new();
        for genre in &movie.genres {
            let batch = self
                .lookup
                .get_sorted_list(
                    SortKey::rating_desc(),
                    Some(genre.id),
                    Page::first(self.popular_page_size),
                )
                .await?;
            similar.extend(batch);
        }

        self.lookup.store(&key, &similar).await;
        Ok(similar)
    }

    /// Top rated movies in a genre, keyed `popular_genre:{genre_id}:movies`.
    ///
    /// Delegates to the sorted listing, so both this key and the inner
    /// sorted-list key end up populated.
    #[instrument(skip(self), fields(genre_id = %genre_id))]
    pub async fn get_popular_in_genre(&self, genre_id: Uuid) -> Result<Vec<Movie>, SearchError> {
        let key = format!("popular_genre:{}:{}", genre_id, Movie::INDEX);

        if let Some(list) = self.lookup.cached_list(&key).await {
            return Ok(list);
        }

        let movies = self
            .lookup
            .get_sorted_list(
                SortKey::rating_desc(),
                Some(genre_id),
                Page::first(self.popular_page_size),
            )
            .await?;

        self.lookup.store(&key, &movies).await;
        Ok(movies)
    }
}
