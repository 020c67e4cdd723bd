//! HTTP handlers for the catalog read path
//!
//! Handlers are thin: validate the query parameters, call the service, map
//! the outcome. An empty result is a 404, a search backend failure a 500,
//! and malformed pagination or sort input a 422 before any service call.

use actix_web::{web, HttpResponse, Responder};
use cinema_search_core::{MovieSummary, Page};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::composer::SortKey;
use crate::search::SearchError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovieListParams {
    pub sort: Option<String>,
    pub filter_genre: Option<Uuid>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

fn not_found(detail: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "detail": detail }))
}

fn unprocessable(detail: &str) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({ "detail": detail }))
}

fn backend_error(err: SearchError) -> HttpResponse {
    error!(error = %err, "Search backend failure");
    HttpResponse::InternalServerError().json(json!({ "detail": "search backend unavailable" }))
}

/// Validate the pagination window: `page_number >= 0`, `page_size > 0`.
fn resolve_page(
    number: Option<i64>,
    size: Option<i64>,
    default_size: u32,
) -> Result<Page, HttpResponse> {
    let number = number.unwrap_or(0);
    if number < 0 {
        return Err(unprocessable("page_number must be greater than or equal to 0"));
    }

    let size = size.unwrap_or(i64::from(default_size));
    if size <= 0 {
        return Err(unprocessable("page_size must be greater than 0"));
    }

    match (u32::try_from(number), u32::try_from(size)) {
        (Ok(number), Ok(size)) => Ok(Page::new(number, size)),
        _ => Err(unprocessable("pagination window out of range")),
    }
}

fn summaries(movies: &[cinema_search_core::Movie]) -> Vec<MovieSummary> {
    movies.iter().map(MovieSummary::from).collect()
}

pub async fn movies_list(
    state: web::Data<AppState>,
    params: web::Query<MovieListParams>,
) -> impl Responder {
    let sort = match SortKey::parse(params.sort.as_deref()) {
        Ok(sort) => sort,
        Err(detail) => return unprocessable(&detail),
    };
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state
        .movies
        .get_sorted_list(sort, params.filter_genre, page)
        .await
    {
        Ok(movies) if movies.is_empty() => not_found("No movies found"),
        Ok(movies) => HttpResponse::Ok().json(summaries(&movies)),
        Err(err) => backend_error(err),
    }
}

pub async fn movies_search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state.movies.get_by_search(&params.query, page).await {
        Ok(movies) if movies.is_empty() => not_found("No movies found"),
        Ok(movies) => HttpResponse::Ok().json(summaries(&movies)),
        Err(err) => backend_error(err),
    }
}

pub async fn movie_detail(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.movies.get_by_id(path.into_inner()).await {
        Ok(Some(movie)) => HttpResponse::Ok().json(movie),
        Ok(None) => not_found("movie not found"),
        Err(err) => backend_error(err),
    }
}

pub async fn movie_similar(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.movies.get_similar(path.into_inner()).await {
        Ok(movies) if movies.is_empty() => not_found("No similar movies found"),
        Ok(movies) => HttpResponse::Ok().json(summaries(&movies)),
        Err(err) => backend_error(err),
    }
}

pub async fn movies_popular_in_genre(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match state.movies.get_popular_in_genre(path.into_inner()).await {
        Ok(movies) if movies.is_empty() => not_found("No movies found"),
        Ok(movies) => HttpResponse::Ok().json(summaries(&movies)),
        Err(err) => backend_error(err),
    }
}

pub async fn genres_list(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> impl Responder {
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state.genres.get_list(page).await {
        Ok(genres) if genres.is_empty() => not_found("No genres found"),
        Ok(genres) => HttpResponse::Ok().json(genres),
        Err(err) => backend_error(err),
    }
}

pub async fn genres_search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state.genres.get_by_search(&params.query, page).await {
        Ok(genres) if genres.is_empty() => not_found("No genres found"),
        Ok(genres) => HttpResponse::Ok().json(genres),
        Err(err) => backend_error(err),
    }
}

pub async fn genre_detail(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.genres.get_by_id(path.into_inner()).await {
        Ok(Some(genre)) => HttpResponse::Ok().json(genre),
        Ok(None) => not_found("genre not found"),
        Err(err) => backend_error(err),
    }
}

pub async fn persons_list(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> impl Responder {
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state.persons.get_list(page).await {
        Ok(persons) if persons.is_empty() => not_found("No persons found"),
        Ok(persons) => HttpResponse::Ok().json(persons),
        Err(err) => backend_error(err),
    }
}

pub async fn persons_search(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let page = match resolve_page(
        params.page_number,
        params.page_size,
        state.config.catalog.default_page_size,
    ) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match state.persons.get_by_search(&params.query, page).await {
        Ok(persons) if persons.is_empty() => not_found("No persons found"),
        Ok(persons) => HttpResponse::Ok().json(persons),
        Err(err) => backend_error(err),
    }
}

pub async fn person_detail(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.persons.get_by_id(path.into_inner()).await {
        Ok(Some(person)) => HttpResponse::Ok().json(person),
        Ok(None) => not_found("person not found"),
        Err(err) => backend_error(err),
    }
}
