use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use server_api::{
    create_movie, delete_movie, get_collection, list_movies, replace_collection, ApiContext,
};
use shared::{
    domain::{CollectionKind, MovieId, MovieSummary, NewMovie},
    error::{ApiError, ErrorCode},
    protocol::{MoviePage, MoviePageQuery, RankedCollection, ReplaceCollectionRequest},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

const MAX_REQUEST_BYTES: usize = 256 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let paging = settings.paging()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage, paging },
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        default_page_size = paging.default_page_size,
        max_page_size = paging.max_page_size,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/movies", get(http_list_movies).post(http_create_movie))
        .route("/movies/:movie_id", delete(http_delete_movie))
        .route(
            "/collections/:kind",
            get(http_get_collection).put(http_replace_collection),
        )
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_error(err: ApiError) -> HttpError {
    if err.code == ErrorCode::Internal {
        error!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

fn parse_kind(raw: &str) -> Result<CollectionKind, HttpError> {
    raw.parse::<CollectionKind>()
        .map_err(|e| http_error(ApiError::not_found(e.to_string())))
}

fn parse_movie_id(raw: &str) -> Result<MovieId, HttpError> {
    raw.trim()
        .parse::<i64>()
        .map(MovieId)
        .map_err(|_| http_error(ApiError::validation(format!("invalid movie id '{raw}'"))))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn http_list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<MoviePageQuery>,
) -> Result<Json<MoviePage>, HttpError> {
    let page = list_movies(&state.api, q).await.map_err(http_error)?;
    Ok(Json(page))
}

async fn http_create_movie(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewMovie>,
) -> Result<(StatusCode, Json<MovieSummary>), HttpError> {
    let movie = create_movie(&state.api, req).await.map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn http_delete_movie(
    State(state): State<Arc<AppState>>,
    Path(movie_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let movie_id = parse_movie_id(&movie_id)?;
    delete_movie(&state.api, movie_id)
        .await
        .map_err(http_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_get_collection(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<RankedCollection>, HttpError> {
    let kind = parse_kind(&kind)?;
    let collection = get_collection(&state.api, kind)
        .await
        .map_err(http_error)?;
    Ok(Json(collection))
}

async fn http_replace_collection(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(req): Json<ReplaceCollectionRequest>,
) -> Result<Json<RankedCollection>, HttpError> {
    let kind = parse_kind(&kind)?;
    let collection = replace_collection(&state.api, kind, req)
        .await
        .map_err(http_error)?;
    Ok(Json(collection))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
