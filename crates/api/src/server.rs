use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::handlers;
use crate::services::{GenreService, MovieService, PersonService};

/// Application state shared across all handlers.
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub movies: Arc<MovieService>,
    pub genres: Arc<GenreService>,
    pub persons: Arc<PersonService>,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "api-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Configure application routes.
///
/// Literal segments are registered before the `{id}` captures so that
/// `/movies/search` and `/movies/genres/{genre_id}` are not swallowed by the
/// detail route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .route("/movies", web::get().to(handlers::movies_list))
            .route("/movies/search", web::get().to(handlers::movies_search))
            .route(
                "/movies/genres/{genre_id}",
                web::get().to(handlers::movies_popular_in_genre),
            )
            .route("/movies/{movie_id}", web::get().to(handlers::movie_detail))
            .route(
                "/movies/{movie_id}/similar",
                web::get().to(handlers::movie_similar),
            )
            .route("/genres", web::get().to(handlers::genres_list))
            .route("/genres/search", web::get().to(handlers::genres_search))
            .route("/genres/{genre_id}", web::get().to(handlers::genre_detail))
            .route("/persons", web::get().to(handlers::persons_list))
            .route("/persons/search", web::get().to(handlers::persons_search))
            .route(
                "/persons/{person_id}",
                web::get().to(handlers::person_detail),
            ),
    );
}
