use futures::future::BoxFuture;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::routes::{self, RouteTable};
use crate::model::{ArticleDraft, Category, ImageSelection, Language};

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown route: {0}")]
    UnknownRoute(String),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Everything the composition workflow needs from the admin backend.
///
/// Methods return boxed futures so controllers can hold the service as
/// `Arc<dyn ArticleService>` and tests can swap in an in-memory fake.
pub trait ArticleService: Send + Sync {
    /// GET `admin.languages`.
    fn fetch_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, ApiError>>;

    /// GET `admin.categories`.
    fn fetch_categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>>;

    /// PUT the assembled draft to `admin.articles`.
    fn put_article<'a>(&'a self, draft: &'a ArticleDraft) -> BoxFuture<'a, Result<(), ApiError>>;

    /// Absolute URL for a named route (used to build picker requests).
    fn endpoint(&self, route: &str) -> Result<Url, ApiError>;
}

/// [`ArticleService`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpArticleService {
    client: reqwest::Client,
    routes: RouteTable,
    timeout: Duration,
}

impl HttpArticleService {
    pub fn new(client: reqwest::Client, routes: RouteTable, timeout: Duration) -> Self {
        Self {
            client,
            routes,
            timeout,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// GET an image listing. `request` is usually the `image.images` route.
    pub async fn list_images(&self, request: &Url) -> Result<Vec<ImageSelection>, ApiError> {
        self.get_json(request.clone()).await
    }

    async fn get_route<T: DeserializeOwned>(&self, route: &'static str) -> Result<T, ApiError> {
        let url = self.routes.url(route)?;
        self.get_json(url).await
    }

    async fn put_json(&self, route: &'static str, draft: &ArticleDraft) -> Result<(), ApiError> {
        let url = self.routes.url(route)?;
        let body = serde_json::to_vec(draft)?;
        tracing::debug!(url = %url, slug = %draft.slug, "PUT article");

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);
        let response = self.send(request).await?;
        tracing::info!(status = response.status().as_u16(), slug = %draft.slug, "Article stored");
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");
        let request = self.client.get(url).header(ACCEPT, "application/json");
        let response = self.send(request).await?;
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout.as_secs()))?
            .map_err(ApiError::Network)?;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }
        Ok(response)
    }
}

impl ArticleService for HttpArticleService {
    fn fetch_languages(&self) -> BoxFuture<'_, Result<Vec<Language>, ApiError>> {
        Box::pin(self.get_route::<Vec<Language>>(routes::LANGUAGES))
    }

    fn fetch_categories(&self) -> BoxFuture<'_, Result<Vec<Category>, ApiError>> {
        Box::pin(self.get_route::<Vec<Category>>(routes::CATEGORIES))
    }

    fn put_article<'a>(&'a self, draft: &'a ArticleDraft) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(self.put_json(routes::ARTICLES, draft))
    }

    fn endpoint(&self, route: &str) -> Result<Url, ApiError> {
        self.routes.url(route)
    }
}

/// Read a response body, failing once it grows past `limit` bytes.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
