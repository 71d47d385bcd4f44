use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{CollectionKind, MovieId, MovieSummary, NewMovie},
    protocol::OrderedRankedItem,
};

const MOVIE_COLUMNS: &str = "m.id, m.title, m.genre, m.duration_minutes, m.release_date";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRankedMovie {
    pub rank: u32,
    pub movie: MovieSummary,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every connection to `sqlite::memory:` opens its own empty database.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_movie(&self, movie: &NewMovie) -> Result<MovieSummary> {
        let rec = sqlx::query(
            "INSERT INTO movies (title, genre, duration_minutes, release_date)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(movie.duration_minutes)
        .bind(movie.release_date)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert movie '{}'", movie.title))?;

        Ok(MovieSummary {
            movie_id: MovieId(rec.get::<i64, _>(0)),
            title: movie.title.clone(),
            genre: movie.genre.clone(),
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
        })
    }

    pub async fn load_movie(&self, movie_id: MovieId) -> Result<Option<MovieSummary>> {
        let row = sqlx::query(&format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = ?"))
            .bind(movie_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(movie_from_row))
    }

    pub async fn count_movies(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Movies ordered by id, skipping `offset` rows.
    pub async fn list_movies(&self, offset: i64, limit: i64) -> Result<Vec<MovieSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m ORDER BY m.id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(movie_from_row).collect())
    }

    /// Deletes a movie and closes the gap it leaves in every collection.
    pub async fn delete_movie(&self, movie_id: MovieId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let collections: Vec<String> =
            sqlx::query_scalar("SELECT collection FROM curated_movies WHERE movie_id = ?")
                .bind(movie_id.0)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM curated_movies WHERE movie_id = ?")
            .bind(movie_id.0)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(movie_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for collection in &collections {
            renumber_collection(&mut tx, collection).await?;
        }

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// The subset of `movie_ids` with no matching movie, in input order.
    pub async fn missing_movies(&self, movie_ids: &[MovieId]) -> Result<Vec<MovieId>> {
        let mut missing = Vec::new();
        for movie_id in movie_ids {
            let found: Option<i64> = sqlx::query_scalar("SELECT id FROM movies WHERE id = ?")
                .bind(movie_id.0)
                .fetch_optional(&self.pool)
                .await?;
            if found.is_none() {
                missing.push(*movie_id);
            }
        }
        Ok(missing)
    }

    pub async fn load_collection(&self, kind: CollectionKind) -> Result<Vec<StoredRankedMovie>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS}, c.position
             FROM curated_movies c
             JOIN movies m ON m.id = c.movie_id
             WHERE c.collection = ?
             ORDER BY c.position"
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| -> Result<StoredRankedMovie> {
                let position = r.get::<i64, _>(5);
                let rank = u32::try_from(position)
                    .ok()
                    .filter(|rank| *rank >= 1)
                    .with_context(|| format!("invalid position {position} stored in {kind}"))?;
                Ok(StoredRankedMovie {
                    rank,
                    movie: movie_from_row(r),
                })
            })
            .collect()
    }

    /// Replaces the whole ranking for `kind` atomically. Callers validate
    /// that ranks are contiguous and ids unique.
    pub async fn replace_collection(
        &self,
        kind: CollectionKind,
        items: &[OrderedRankedItem<MovieId>],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM curated_movies WHERE collection = ?")
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO curated_movies (collection, movie_id, position) VALUES (?, ?, ?)",
            )
            .bind(kind.as_str())
            .bind(item.id.0)
            .bind(i64::from(item.rank))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to rank movie {} in {kind}", item.id))?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn renumber_collection(tx: &mut Transaction<'_, Sqlite>, collection: &str) -> Result<()> {
    let movie_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT movie_id FROM curated_movies WHERE collection = ? ORDER BY position",
    )
    .bind(collection)
    .fetch_all(&mut **tx)
    .await?;

    for (index, movie_id) in movie_ids.iter().enumerate() {
        sqlx::query(
            "UPDATE curated_movies SET position = ?, updated_at = CURRENT_TIMESTAMP
             WHERE collection = ? AND movie_id = ?",
        )
        .bind(index as i64 + 1)
        .bind(collection)
        .bind(movie_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

fn movie_from_row(r: &SqliteRow) -> MovieSummary {
    MovieSummary {
        movie_id: MovieId(r.get::<i64, _>(0)),
        title: r.get::<String, _>(1),
        genre: r.get::<Option<String>, _>(2),
        duration_minutes: r.get::<i64, _>(3),
        release_date: r.get::<Option<NaiveDate>, _>(4),
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
