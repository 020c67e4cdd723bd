//! Incremental extraction from the relational store
//!
//! Each query pages by the `(updated_at, id)` row comparison so the pipeline
//! can advance its cursor chunk by chunk. A timestamp-only filter would lose
//! rows: Postgres gives every row touched in one transaction the same
//! `updated_at`, so a chunk boundary can fall in the middle of a group of
//! identically stamped rows. Related persons and genres are aggregated into
//! JSON arrays in the database, one row per entity.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::Checkpoint;
use crate::Result;

const MOVIES_SQL: &str = r#"
    SELECT
        fw.id,
        fw.title,
        fw.description,
        fw.rating,
        fw.type AS kind,
        fw.creation_date,
        fw.file_path,
        fw.updated_at,
        COALESCE(json_agg(
            DISTINCT jsonb_build_object(
                'role', pfw.role,
                'id', p.id,
                'full_name', p.full_name
            )
        ) FILTER (WHERE p.id IS NOT NULL), '[]') AS persons,
        COALESCE(json_agg(
            DISTINCT jsonb_build_object(
                'id', g.id,
                'name', g.name,
                'description', g.description
            )
        ) FILTER (WHERE g.id IS NOT NULL), '[]') AS genres
    FROM content.film_work fw
    LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id
    LEFT JOIN content.person p ON p.id = pfw.person_id
    LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id
    LEFT JOIN content.genre g ON g.id = gfw.genre_id
    WHERE (fw.updated_at, fw.id) > ($1, $2)
    GROUP BY fw.id
    ORDER BY fw.updated_at, fw.id
    LIMIT $3
"#;

const GENRES_SQL: &str = r#"
    SELECT
        g.id,
        g.name,
        g.description,
        g.updated_at
    FROM content.genre g
    WHERE (g.updated_at, g.id) > ($1, $2)
    ORDER BY g.updated_at, g.id
    LIMIT $3
"#;

const PERSONS_SQL: &str = r#"
    SELECT
        p.id,
        p.full_name,
        p.updated_at,
        COALESCE(json_agg(
            DISTINCT jsonb_build_object('id', fw.id)
        ) FILTER (WHERE fw.id IS NOT NULL), '[]') AS movies,
        array_remove(array_agg(DISTINCT pfw.role), NULL) AS roles
    FROM content.person p
    LEFT JOIN content.person_film_work pfw ON pfw.person_id = p.id
    LEFT JOIN content.film_work fw ON fw.id = pfw.film_work_id
    WHERE (p.updated_at, p.id) > ($1, $2)
    GROUP BY p.id
    ORDER BY p.updated_at, p.id
    LIMIT $3
"#;

#[derive(Debug, sqlx::FromRow)]
pub struct MovieRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub kind: String,
    pub creation_date: Option<NaiveDate>,
    pub file_path: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// JSON array of `{role, id, full_name}` objects.
    pub persons: Value,
    /// JSON array of `{id, name, description}` objects.
    pub genres: Value,
}

#[derive(Debug, sqlx::FromRow)]
pub struct GenreRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PersonRow {
    pub id: Uuid,
    pub full_name: String,
    pub updated_at: DateTime<Utc>,
    /// JSON array of `{id}` objects.
    pub movies: Value,
    pub roles: Vec<String>,
}

pub async fn fetch_movies(
    pool: &PgPool,
    cursor: Checkpoint,
    limit: i64,
) -> Result<Vec<MovieRow>> {
    let rows = sqlx::query_as::<_, MovieRow>(MOVIES_SQL)
        .bind(cursor.updated_at)
        .bind(cursor.last_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn fetch_genres(
    pool: &PgPool,
    cursor: Checkpoint,
    limit: i64,
) -> Result<Vec<GenreRow>> {
    let rows = sqlx::query_as::<_, GenreRow>(GENRES_SQL)
        .bind(cursor.updated_at)
        .bind(cursor.last_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn fetch_persons(
    pool: &PgPool,
    cursor: Checkpoint,
    limit: i64,
) -> Result<Vec<PersonRow>> {
    let rows = sqlx::query_as::<_, PersonRow>(PERSONS_SQL)
        .bind(cursor.updated_at)
        .bind(cursor.last_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
