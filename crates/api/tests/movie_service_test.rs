//! Movie-only composition: similar-movies fan-out and popular-in-genre,
//! including their cache keys and failure semantics.

mod support;

use cinema_search_api::composer::SortKey;
use cinema_search_api::services::MovieService;
use cinema_search_core::Page;
use serde_json::Value;
use std::sync::Arc;
use support::{movie_doc, MemoryCache, MockBackend};
use uuid::Uuid;

const TTL: u64 = 600;
const POPULAR_PAGE_SIZE: u32 = 20;

struct Fixture {
    cache: Arc<MemoryCache>,
    backend: Arc<MockBackend>,
    service: MovieService,
    action: Uuid,
    drama: Uuid,
}

/// Index with two genres. "Crossover" belongs to both, so it shows up twice
/// in a fan-out over a movie tagged with both genres.
fn fixture() -> Fixture {
    let action = Uuid::new_v4();
    let drama = Uuid::new_v4();

    let docs: Vec<Value> = vec![
        movie_doc(Uuid::new_v4(), "Action Hit", Some(8.9), &[(action, "Action")]),
        movie_doc(Uuid::new_v4(), "Action Flop", Some(3.2), &[(action, "Action")]),
        movie_doc(
            Uuid::new_v4(),
            "Crossover",
            Some(7.7),
            &[(action, "Action"), (drama, "Drama")],
        ),
        movie_doc(Uuid::new_v4(), "Drama Hit", Some(8.1), &[(drama, "Drama")]),
    ];

    let cache = Arc::new(MemoryCache::new());
    let backend = Arc::new(MockBackend::with_docs("movies", docs));
    let service = MovieService::new(
        cache.clone(),
        backend.clone(),
        TTL,
        POPULAR_PAGE_SIZE,
    );

    Fixture {
        cache,
        backend,
        service,
        action,
        drama,
    }
}

fn add_movie(fixture: &Fixture, id: Uuid, title: &str, genres: &[(Uuid, &str)]) {
    fixture
        .backend
        .insert("movies", vec![movie_doc(id, title, Some(6.0), genres)]);
}

#[tokio::test]
async fn similar_is_popular_per_genre_concatenated_in_genre_order() {
    let fixture = fixture();
    let movie_id = Uuid::new_v4();
    add_movie(
        &fixture,
        movie_id,
        "Tagged Both",
        &[(fixture.action, "Action"), (fixture.drama, "Drama")],
    );

    let similar = fixture.service.get_similar(movie_id).await.unwrap();

    let popular_action = fixture
        .service
        .get_sorted_list(
            SortKey::rating_desc(),
            Some(fixture.action),
            Page::first(POPULAR_PAGE_SIZE),
        )
        .await
        .unwrap();
    let popular_drama = fixture
        .service
        .get_sorted_list(
            SortKey::rating_desc(),
            Some(fixture.drama),
            Page::first(POPULAR_PAGE_SIZE),
        )
        .await
        .unwrap();

    let mut expected = popular_action;
    expected.extend(popular_drama);
    assert_eq!(similar, expected);

    // "Crossover" carries both genres and is deliberately kept twice.
    let crossover_count = similar.iter().filter(|m| m.title == "Crossover").count();
    assert_eq!(crossover_count, 2);

    assert!(fixture
        .cache
        .contains(&format!("similar:{movie_id}:movies")));
}

#[tokio::test]
async fn similar_for_movie_without_genres_is_empty() {
    let fixture = fixture();
    let movie_id = Uuid::new_v4();
    add_movie(&fixture, movie_id, "Uncategorized", &[]);

    let similar = fixture.service.get_similar(movie_id).await.unwrap();
    assert!(similar.is_empty());
}

#[tokio::test]
async fn similar_for_unknown_movie_is_empty_and_uncached() {
    let fixture = fixture();
    let movie_id = Uuid::new_v4();

    let similar = fixture.service.get_similar(movie_id).await.unwrap();
    assert!(similar.is_empty());
    assert!(!fixture
        .cache
        .contains(&format!("similar:{movie_id}:movies")));
}

#[tokio::test]
async fn similar_second_call_is_served_from_cache() {
    let fixture = fixture();
    let movie_id = Uuid::new_v4();
    add_movie(
        &fixture,
        movie_id,
        "Tagged Both",
        &[(fixture.action, "Action"), (fixture.drama, "Drama")],
    );

    let first = fixture.service.get_similar(movie_id).await.unwrap();
    let calls_after_first = fixture.backend.calls();

    let second = fixture.service.get_similar(movie_id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fixture.backend.calls(), calls_after_first);
}

#[tokio::test]
async fn mid_fanout_failure_propagates_and_leaves_no_similar_entry() {
    let fixture = fixture();
    let movie_id = Uuid::new_v4();
    add_movie(
        &fixture,
        movie_id,
        "Tagged Both",
        &[(fixture.action, "Action"), (fixture.drama, "Drama")],
    );

    // Call 0 fetches the movie, call 1 serves the first genre; the second
    // genre's query fails.
    fixture.backend.fail_from(2);

    let result = fixture.service.get_similar(movie_id).await;
    assert!(result.is_err());

    let similar_key = format!("similar:{movie_id}:movies");
    assert!(!fixture.cache.contains(&similar_key));
}

#[tokio::test]
async fn popular_in_genre_double_caches() {
    let fixture = fixture();

    let popular = fixture
        .service
        .get_popular_in_genre(fixture.action)
        .await
        .unwrap();
    assert!(!popular.is_empty());
    for pair in popular.windows(2) {
        assert!(pair[0].imdb_rating >= pair[1].imdb_rating);
    }

    // Both the wrapper key and the inner sorted-list key are populated.
    assert!(fixture
        .cache
        .contains(&format!("popular_genre:{}:movies", fixture.action)));
    assert!(fixture.cache.contains(&format!(
        "movies:imdb_rating:desc:{}:0:{}",
        fixture.action, POPULAR_PAGE_SIZE
    )));
}

#[tokio::test]
async fn popular_in_genre_second_call_skips_backend() {
    let fixture = fixture();

    let first = fixture
        .service
        .get_popular_in_genre(fixture.drama)
        .await
        .unwrap();
    let calls_after_first = fixture.backend.calls();

    let second = fixture
        .service
        .get_popular_in_genre(fixture.drama)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(fixture.backend.calls(), calls_after_first);
}
