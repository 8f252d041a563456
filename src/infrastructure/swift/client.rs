use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::application::ports::{ObjectStorage, ObjectSummary, StorageError};

use super::auth::{self, AuthSession, SwiftCredentials};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const DEFAULT_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingEntry {
    Subdir { subdir: String },
    Object(ObjectSummary),
}

/// Client for one Swift account.
///
/// Authenticates lazily on first use. When a request is rejected with 401
/// the client re-authenticates once and repeats the request; a second 401
/// is reported as [`StorageError::Auth`].
pub struct SwiftClient {
    http: reqwest::Client,
    credentials: SwiftCredentials,
    session: RwLock<Option<AuthSession>>,
    page_size: usize,
}

impl SwiftClient {
    pub fn new(credentials: SwiftCredentials, timeout: Duration) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(http, credentials))
    }

    pub fn with_http_client(http: reqwest::Client, credentials: SwiftCredentials) -> Self {
        Self {
            http,
            credentials,
            session: RwLock::new(None),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Objects requested per listing page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn credentials(&self) -> &SwiftCredentials {
        &self.credentials
    }

    /// Obtain a fresh token, replacing any cached one
    pub async fn authenticate(&self) -> Result<AuthSession, StorageError> {
        let mut guard = self.session.write().await;
        let session = auth::authenticate(&self.http, &self.credentials).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn session(&self) -> Result<AuthSession, StorageError> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(session.clone());
        }

        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = auth::authenticate(&self.http, &self.credentials).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Replace `stale` unless another request already did
    async fn reauthenticate(&self, stale: &AuthSession) -> Result<AuthSession, StorageError> {
        let mut guard = self.session.write().await;
        if let Some(current) = guard.as_ref() {
            if current.token != stale.token {
                return Ok(current.clone());
            }
        }

        warn!("Swift rejected the auth token, re-authenticating");
        let session = auth::authenticate(&self.http, &self.credentials).await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn send<F>(&self, build: F) -> Result<Response, StorageError>
    where
        F: Fn(&AuthSession) -> Result<RequestBuilder, StorageError>,
    {
        let session = self.session().await?;
        let response = build(&session)?
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let session = self.reauthenticate(&session).await?;
        let response = build(&session)?
            .header(AUTH_TOKEN_HEADER, &session.token)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(StorageError::Auth(format!(
                "Request rejected after re-authenticating as {}",
                self.credentials.username
            )));
        }
        Ok(response)
    }

    async fn list_page(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
        marker: Option<&str>,
    ) -> Result<Vec<ListingEntry>, StorageError> {
        let delimiter = delimiter.to_string();
        let limit = self.page_size.to_string();

        let response = self
            .send(|session| {
                let mut query: Vec<(&str, &str)> = vec![
                    ("format", "json"),
                    ("prefix", prefix),
                    ("delimiter", delimiter.as_str()),
                    ("limit", limit.as_str()),
                ];
                if let Some(marker) = marker {
                    query.push(("marker", marker));
                }
                Ok(self
                    .http
                    .get(container_url(&session.storage_url, container)?)
                    .query(&query))
            })
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(container.to_string())),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(unexpected("GET", container, status)),
        }
    }
}

#[async_trait]
impl ObjectStorage for SwiftClient {
    async fn ensure_container(&self, container: &str) -> Result<(), StorageError> {
        let response = self
            .send(|session| Ok(self.http.put(container_url(&session.storage_url, container)?)))
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Container {} ready ({})", container, status);
            Ok(())
        } else {
            Err(unexpected("PUT", container, status))
        }
    }

    async fn exists(&self, container: &str, name: &str) -> Result<bool, StorageError> {
        let response = self
            .send(|session| Ok(self.http.head(object_url(&session.storage_url, container, name)?)))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(unexpected("HEAD", &target(container, name), status)),
        }
    }

    async fn get(&self, container: &str, name: &str) -> Result<Bytes, StorageError> {
        let response = self
            .send(|session| Ok(self.http.get(object_url(&session.storage_url, container, name)?)))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(target(container, name))),
            status if status.is_success() => Ok(response.bytes().await?),
            status => Err(unexpected("GET", &target(container, name), status)),
        }
    }

    async fn put(&self, container: &str, name: &str, body: Bytes) -> Result<(), StorageError> {
        trace!("PUT {}/{} ({} bytes)", container, name, body.len());
        let response = self
            .send(|session| {
                Ok(self
                    .http
                    .put(object_url(&session.storage_url, container, name)?)
                    .body(body.clone()))
            })
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            Err(StorageError::NotFound(container.to_string()))
        } else {
            Err(unexpected("PUT", &target(container, name), status))
        }
    }

    async fn delete(&self, container: &str, name: &str) -> Result<(), StorageError> {
        let response = self
            .send(|session| Ok(self.http.delete(object_url(&session.storage_url, container, name)?)))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(target(container, name))),
            status if status.is_success() => Ok(()),
            status => Err(unexpected("DELETE", &target(container, name), status)),
        }
    }

    async fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> Result<Vec<ObjectSummary>, StorageError> {
        let mut objects = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .list_page(container, prefix, delimiter, marker.as_deref())
                .await?;
            let page_len = page.len();

            for entry in page {
                match entry {
                    ListingEntry::Subdir { subdir } => marker = Some(subdir),
                    ListingEntry::Object(summary) => {
                        marker = Some(summary.name.clone());
                        objects.push(summary);
                    }
                }
            }

            if page_len < self.page_size {
                break;
            }
        }

        trace!(
            "Listed {} objects under {}/{}",
            objects.len(),
            container,
            prefix
        );
        Ok(objects)
    }
}

fn target(container: &str, name: &str) -> String {
    format!("{}/{}", container, name)
}

fn unexpected(operation: &'static str, target: &str, status: StatusCode) -> StorageError {
    StorageError::UnexpectedStatus {
        operation,
        target: target.to_string(),
        status: status.as_u16(),
    }
}

fn container_url(storage_url: &str, container: &str) -> Result<Url, StorageError> {
    segments_url(storage_url, std::iter::once(container))
}

/// Object names keep their `/` separators; each segment is percent-encoded.
fn object_url(storage_url: &str, container: &str, name: &str) -> Result<Url, StorageError> {
    segments_url(storage_url, std::iter::once(container).chain(name.split('/')))
}

fn segments_url<'a>(
    storage_url: &str,
    segments: impl Iterator<Item = &'a str>,
) -> Result<Url, StorageError> {
    let mut url = Url::parse(storage_url)
        .map_err(|e| StorageError::Internal(format!("Invalid storage URL {}: {}", storage_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| StorageError::Internal(format!("Storage URL {} cannot have a path", storage_url)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
