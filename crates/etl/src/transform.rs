//! Row to document transformation
//!
//! Turns the JSON-aggregated rows coming out of extraction into the
//! denormalized documents the search index stores. Movie person lists are
//! fanned out by role into directors, actors and writers, with the parallel
//! `*_names` projections kept in the same order.

use cinema_search_core::{Genre, Movie, Person, PersonRef};
use serde::Deserialize;
use validator::Validate;
use serde_json::Value;
use uuid::Uuid;

use crate::extract::{GenreRow, MovieRow, PersonRow};
use crate::{EtlError, Result};

#[derive(Debug, Deserialize)]
struct PersonWithRole {
    role: String,
    id: Uuid,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct MovieIdRef {
    id: Uuid,
}

fn parse_array<T: serde::de::DeserializeOwned>(value: Value, context: &str) -> Result<Vec<T>> {
    serde_json::from_value(value)
        .map_err(|err| EtlError::InvalidDocument(format!("{context}: {err}")))
}

pub fn movie_from_row(row: MovieRow) -> Result<Movie> {
    let persons: Vec<PersonWithRole> = parse_array(row.persons, "movie persons")?;
    let genres: Vec<Genre> = parse_array(row.genres, "movie genres")?;

    let mut directors = Vec::new();
    let mut actors = Vec::new();
    let mut writers = Vec::new();
    for person in persons {
        let target = match person.role.as_str() {
            "director" => &mut directors,
            "actor" => &mut actors,
            "writer" => &mut writers,
            other => {
                return Err(EtlError::InvalidDocument(format!(
                    "movie {}: unknown role {other:?}",
                    row.id
                )))
            }
        };
        target.push(PersonRef {
            id: person.id,
            full_name: person.full_name,
        });
    }

    let names = |refs: &[PersonRef]| refs.iter().map(|p| p.full_name.clone()).collect();
    let movie = Movie {
        id: row.id,
        title: row.title,
        imdb_rating: row.rating,
        kind: row.kind,
        creation_date: row.creation_date,
        file_path: row.file_path,
        description: row.description,
        directors_names: names(&directors),
        actors_names: names(&actors),
        writers_names: names(&writers),
        genres,
        directors,
        actors,
        writers,
    };
    movie
        .validate()
        .map_err(|err| EtlError::InvalidDocument(format!("movie {}: {err}", movie.id)))?;
    Ok(movie)
}

pub fn genre_from_row(row: GenreRow) -> Genre {
    Genre {
        id: row.id,
        name: row.name,
        description: row.description,
    }
}

pub fn person_from_row(row: PersonRow) -> Result<Person> {
    let movies: Vec<MovieIdRef> = parse_array(row.movies, "person movies")?;
    Ok(Person {
        id: row.id,
        full_name: row.full_name,
        roles: row.roles,
        movies_ids: movies.into_iter().map(|m| m.id).collect(),
    })
}
