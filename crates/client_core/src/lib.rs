use async_trait::async_trait;
use curation::{CuratedCollection, RankedStore};
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{CollectionKind, MovieId, MovieSummary, NewMovie},
    error::ApiError,
    protocol::{
        MoviePage, MoviePageQuery, OrderedRankedItem, RankedCollection, ReplaceCollectionRequest,
    },
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a structured error body.
    #[error("server rejected request ({status}): {}", .error.message)]
    Api { status: StatusCode, error: ApiError },
    #[error("unexpected response ({status}): {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}

impl ClientError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client for the catalog and curation endpoints.
#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    server_url: String,
}

impl CatalogClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            server_url,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn health(&self) -> Result<()> {
        let res = self
            .http
            .get(format!("{}/healthz", self.server_url))
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn list_movies(&self, page: Option<i64>, page_size: Option<i64>) -> Result<MoviePage> {
        let res = self
            .http
            .get(format!("{}/movies", self.server_url))
            .query(&MoviePageQuery { page, page_size })
            .send()
            .await?;
        let page: MoviePage = check(res).await?.json().await?;
        debug!(
            current_page = page.page.current_page,
            total_pages = page.page.total_pages,
            "fetched movie page"
        );
        Ok(page)
    }

    pub async fn create_movie(&self, movie: &NewMovie) -> Result<MovieSummary> {
        let res = self
            .http
            .post(format!("{}/movies", self.server_url))
            .json(movie)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn delete_movie(&self, movie_id: MovieId) -> Result<()> {
        let res = self
            .http
            .delete(format!("{}/movies/{movie_id}", self.server_url))
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    pub async fn fetch_collection(&self, kind: CollectionKind) -> Result<RankedCollection> {
        let res = self
            .http
            .get(format!("{}/collections/{kind}", self.server_url))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn replace_collection(
        &self,
        kind: CollectionKind,
        items: &[OrderedRankedItem<MovieId>],
    ) -> Result<RankedCollection> {
        let res = self
            .http
            .put(format!("{}/collections/{kind}", self.server_url))
            .json(&ReplaceCollectionRequest {
                items: items.to_vec(),
            })
            .send()
            .await?;
        let stored: RankedCollection = check(res).await?.json().await?;
        info!(%kind, items = stored.entries.len(), "collection saved");
        Ok(stored)
    }
}

/// Turns non-2xx responses into errors, decoding the server's `ApiError`
/// body when there is one.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => Err(ClientError::Api { status, error }),
        Err(_) => Err(ClientError::UnexpectedStatus { status, body }),
    }
}

/// Remote persistence for one curated collection.
#[derive(Clone)]
pub struct HttpCollectionStore {
    client: CatalogClient,
    kind: CollectionKind,
}

impl HttpCollectionStore {
    pub fn new(client: CatalogClient, kind: CollectionKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }
}

#[async_trait]
impl RankedStore<MovieSummary> for HttpCollectionStore {
    async fn load(&self) -> anyhow::Result<Vec<MovieSummary>> {
        let mut collection = self.client.fetch_collection(self.kind).await?;
        collection.entries.sort_by_key(|entry| entry.rank);
        Ok(collection
            .entries
            .into_iter()
            .map(|entry| entry.movie)
            .collect())
    }

    async fn save(&self, items: &[OrderedRankedItem<MovieId>]) -> anyhow::Result<()> {
        self.client.replace_collection(self.kind, items).await?;
        Ok(())
    }
}

/// Editor model for the spotlight and trending lists.
pub type CollectionEditor = CuratedCollection<MovieSummary, HttpCollectionStore>;

pub fn collection_editor(client: CatalogClient, kind: CollectionKind) -> CollectionEditor {
    CuratedCollection::new(HttpCollectionStore::new(client, kind))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
