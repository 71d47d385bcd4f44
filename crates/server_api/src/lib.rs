use curation::{
    pagination::{DEFAULT_MAX_VISIBLE_PAGES, DEFAULT_PAGE_SIZE},
    validate_ordered, PaginationEngine, PaginationOptions,
};
use shared::{
    domain::{CollectionKind, MovieId, MovieSummary, NewMovie},
    error::{ApiError, ErrorCode},
    protocol::{MoviePage, MoviePageQuery, RankedCollection, RankedMovie, ReplaceCollectionRequest},
};
use storage::Storage;
use tracing::{debug, info};

/// Server-side paging limits applied to list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingDefaults {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub max_visible_pages: usize,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: 100,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
        }
    }
}

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub paging: PagingDefaults,
}

pub async fn list_movies(ctx: &ApiContext, query: MoviePageQuery) -> Result<MoviePage, ApiError> {
    let page_size = query.page_size.unwrap_or(ctx.paging.default_page_size);
    if !(1..=ctx.paging.max_page_size).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "page_size must be between 1 and {}, got {page_size}",
            ctx.paging.max_page_size
        )));
    }

    let total_count = ctx.storage.count_movies().await.map_err(internal)?;
    let mut options = PaginationOptions::new(total_count, page_size)
        .max_visible_pages(ctx.paging.max_visible_pages);
    if let Some(page) = query.page {
        options = options.initial_page(page);
    }
    let engine =
        PaginationEngine::new(options).map_err(|e| ApiError::validation(e.to_string()))?;

    let movies = ctx
        .storage
        .list_movies(engine.start_index(), engine.page_size())
        .await
        .map_err(internal)?;
    debug!(
        page = engine.current_page(),
        total_pages = engine.total_pages(),
        returned = movies.len(),
        "listed movies"
    );

    Ok(MoviePage {
        movies,
        page: engine.page_info(),
    })
}

pub async fn create_movie(ctx: &ApiContext, movie: NewMovie) -> Result<MovieSummary, ApiError> {
    let title = movie.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("movie title must not be empty"));
    }
    if movie.duration_minutes <= 0 {
        return Err(ApiError::validation(format!(
            "duration_minutes must be positive, got {}",
            movie.duration_minutes
        )));
    }

    let movie = NewMovie {
        title: title.to_string(),
        ..movie
    };
    let created = ctx.storage.create_movie(&movie).await.map_err(internal)?;
    info!(movie_id = %created.movie_id, title = %created.title, "movie created");
    Ok(created)
}

pub async fn delete_movie(ctx: &ApiContext, movie_id: MovieId) -> Result<(), ApiError> {
    let deleted = ctx.storage.delete_movie(movie_id).await.map_err(internal)?;
    if !deleted {
        return Err(ApiError::not_found(format!("movie {movie_id} not found")));
    }
    info!(%movie_id, "movie deleted");
    Ok(())
}

pub async fn get_collection(
    ctx: &ApiContext,
    kind: CollectionKind,
) -> Result<RankedCollection, ApiError> {
    let entries = ctx
        .storage
        .load_collection(kind)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|stored| RankedMovie {
            rank: stored.rank,
            movie: stored.movie,
        })
        .collect();
    Ok(RankedCollection { kind, entries })
}

/// Replaces the ranking of `kind` with the submitted order and returns the
/// stored result.
pub async fn replace_collection(
    ctx: &ApiContext,
    kind: CollectionKind,
    request: ReplaceCollectionRequest,
) -> Result<RankedCollection, ApiError> {
    validate_ordered(&request.items).map_err(|e| ApiError::validation(e.to_string()))?;

    let ids: Vec<MovieId> = request.items.iter().map(|item| item.id).collect();
    let missing = ctx.storage.missing_movies(&ids).await.map_err(internal)?;
    if !missing.is_empty() {
        let listed = missing
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ApiError::not_found(format!("unknown movies: {listed}")));
    }

    ctx.storage
        .replace_collection(kind, &request.items)
        .await
        .map_err(internal)?;
    info!(%kind, items = request.items.len(), "collection replaced");

    get_collection(ctx, kind).await
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
