use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode as HttpStatus,
    routing::get,
    Json, Router,
};
use curation::CurationError;
use server_api::{ApiContext, PagingDefaults};
use shared::error::ErrorCode;
use storage::Storage;
use tokio::net::TcpListener;

type HttpError = (HttpStatus, Json<ApiError>);

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => HttpStatus::BAD_REQUEST,
        ErrorCode::NotFound => HttpStatus::NOT_FOUND,
        ErrorCode::Internal => HttpStatus::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

fn kind_from(raw: &str) -> std::result::Result<CollectionKind, HttpError> {
    raw.parse()
        .map_err(|e: shared::domain::UnknownCollection| http_error(ApiError::not_found(e.to_string())))
}

async fn movies(
    State(ctx): State<Arc<ApiContext>>,
    Query(q): Query<MoviePageQuery>,
) -> std::result::Result<Json<MoviePage>, HttpError> {
    server_api::list_movies(&ctx, q)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn add_movie(
    State(ctx): State<Arc<ApiContext>>,
    Json(movie): Json<NewMovie>,
) -> std::result::Result<(HttpStatus, Json<MovieSummary>), HttpError> {
    let movie = server_api::create_movie(&ctx, movie)
        .await
        .map_err(http_error)?;
    Ok((HttpStatus::CREATED, Json(movie)))
}

async fn collection(
    State(ctx): State<Arc<ApiContext>>,
    Path(kind): Path<String>,
) -> std::result::Result<Json<RankedCollection>, HttpError> {
    server_api::get_collection(&ctx, kind_from(&kind)?)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn replace(
    State(ctx): State<Arc<ApiContext>>,
    Path(kind): Path<String>,
    Json(req): Json<ReplaceCollectionRequest>,
) -> std::result::Result<Json<RankedCollection>, HttpError> {
    server_api::replace_collection(&ctx, kind_from(&kind)?, req)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn spawn_catalog_server() -> anyhow::Result<(String, Storage)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let storage = Storage::new("sqlite::memory:").await?;
    let ctx = Arc::new(ApiContext {
        storage: storage.clone(),
        paging: PagingDefaults {
            default_page_size: 2,
            max_page_size: 4,
            max_visible_pages: 5,
        },
    });
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/movies", get(movies).post(add_movie))
        .route("/collections/:kind", get(collection).put(replace))
        .with_state(ctx);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), storage))
}

async fn seed(client: &CatalogClient, titles: &[&str]) -> Vec<MovieSummary> {
    let mut created = Vec::new();
    for title in titles {
        created.push(
            client
                .create_movie(&NewMovie {
                    title: title.to_string(),
                    genre: None,
                    duration_minutes: 110,
                    release_date: None,
                })
                .await
                .expect("create movie"),
        );
    }
    created
}

#[tokio::test]
async fn lists_movie_pages_over_http() {
    let (server_url, _storage) = spawn_catalog_server().await.expect("spawn server");
    let client = CatalogClient::new(server_url);
    assert!(!client.server_url().ends_with('/'));
    client.health().await.expect("healthy");

    let created = seed(&client, &["Alien", "Brazil", "Casablanca"]).await;

    let page = client.list_movies(Some(2), None).await.expect("page");
    assert_eq!(page.page.current_page, 2);
    assert_eq!(page.page.total_pages, 2);
    assert_eq!(page.movies, vec![created[2].clone()]);
}

#[tokio::test]
async fn api_errors_carry_server_body() {
    let (server_url, _storage) = spawn_catalog_server().await.expect("spawn server");
    let client = CatalogClient::new(server_url);

    let err = client
        .list_movies(None, Some(99))
        .await
        .expect_err("page size above limit");
    match &err {
        ClientError::Api { status, error } => {
            assert_eq!(*status, StatusCode::BAD_REQUEST);
            assert_eq!(error.code, ErrorCode::Validation);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.api_error().is_some());

    let err = client
        .replace_collection(
            CollectionKind::Trending,
            &[OrderedRankedItem {
                id: MovieId(31337),
                rank: 1,
            }],
        )
        .await
        .expect_err("unknown movie");
    assert_eq!(
        err.api_error().map(|e| e.code),
        Some(ErrorCode::NotFound)
    );
}

#[tokio::test]
async fn collection_editor_saves_and_reloads_order() {
    let (server_url, _storage) = spawn_catalog_server().await.expect("spawn server");
    let client = CatalogClient::new(server_url);
    let created = seed(&client, &["Heat", "Ronin", "Thief"]).await;

    let editor = collection_editor(client.clone(), CollectionKind::Spotlight);
    assert_eq!(editor.load().await.expect("load empty"), 0);
    for movie in &created {
        editor.add(movie.clone()).expect("add");
    }
    editor
        .move_item(&created[2].movie_id, 0)
        .expect("move to top");
    editor.save().await.expect("save");
    assert!(!editor.is_dirty());

    let stored = client
        .fetch_collection(CollectionKind::Spotlight)
        .await
        .expect("fetch");
    assert_eq!(
        stored
            .entries
            .iter()
            .map(|entry| (entry.rank, entry.movie.title.as_str()))
            .collect::<Vec<_>>(),
        vec![(1, "Thief"), (2, "Heat"), (3, "Ronin")]
    );

    let reopened = collection_editor(client, CollectionKind::Spotlight);
    assert_eq!(reopened.load().await.expect("load"), 3);
    assert_eq!(
        reopened
            .items()
            .iter()
            .map(|entry| entry.item().movie_id)
            .collect::<Vec<_>>(),
        vec![created[2].movie_id, created[0].movie_id, created[1].movie_id]
    );
}

#[tokio::test]
async fn failed_remote_save_keeps_editor_dirty() {
    let (server_url, storage) = spawn_catalog_server().await.expect("spawn server");
    let client = CatalogClient::new(server_url);
    let created = seed(&client, &["Vertigo"]).await;

    let editor = collection_editor(client, CollectionKind::Trending);
    editor.add(created[0].clone()).expect("add");
    assert!(storage
        .delete_movie(created[0].movie_id)
        .await
        .expect("delete behind the editor's back"));

    let err = editor.save().await.expect_err("movie no longer exists");
    assert!(matches!(err, CurationError::PersistenceFailure(_)));
    assert!(editor.is_dirty());
    assert_eq!(editor.len(), 1);
}
