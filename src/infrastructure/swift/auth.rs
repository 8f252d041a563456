//! Swift authentication: TempAuth (v1) and Keystone v3 password auth.
//!
//! Both flows produce an [`AuthSession`]: the account's storage URL plus a
//! token sent as `X-Auth-Token` on every object request.

use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::application::ports::StorageError;

const OBJECT_STORE_SERVICE: &str = "object-store";
const PUBLIC_INTERFACE: &str = "public";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    TempAuth,
    Keystone,
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tempauth" | "v1" => Ok(AuthMethod::TempAuth),
            "keystone" | "v3" => Ok(AuthMethod::Keystone),
            other => Err(format!(
                "Unknown auth method {:?}, expected tempauth or keystone",
                other
            )),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::TempAuth => write!(f, "tempauth"),
            AuthMethod::Keystone => write!(f, "keystone"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwiftCredentials {
    pub auth_url: String,
    #[serde(default)]
    pub method: AuthMethod,
    pub username: String,
    pub password: String,
    /// Keystone project to scope the token to
    #[serde(default)]
    pub project: Option<String>,
    /// Keystone domain of both user and project
    #[serde(default)]
    pub domain: Option<String>,
    /// Keystone catalog region; the first public endpoint is used when unset
    #[serde(default)]
    pub region: Option<String>,
}

impl fmt::Debug for SwiftCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftCredentials")
            .field("auth_url", &self.auth_url)
            .field("method", &self.method)
            .field("username", &self.username)
            .field("password", &"***")
            .field("project", &self.project)
            .field("domain", &self.domain)
            .field("region", &self.region)
            .finish()
    }
}

/// Storage URL and token obtained from the auth endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub storage_url: String,
    pub token: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("storage_url", &self.storage_url)
            .field("token", &"***")
            .finish()
    }
}

pub(crate) async fn authenticate(
    http: &reqwest::Client,
    credentials: &SwiftCredentials,
) -> Result<AuthSession, StorageError> {
    let session = match credentials.method {
        AuthMethod::TempAuth => tempauth(http, credentials).await?,
        AuthMethod::Keystone => keystone(http, credentials).await?,
    };
    info!(
        "Authenticated to Swift as {} ({}), storage URL {}",
        credentials.username, credentials.method, session.storage_url
    );
    Ok(session)
}

async fn tempauth(
    http: &reqwest::Client,
    credentials: &SwiftCredentials,
) -> Result<AuthSession, StorageError> {
    debug!("TempAuth request to {}", credentials.auth_url);
    let response = http
        .get(&credentials.auth_url)
        .header("X-Auth-User", &credentials.username)
        .header("X-Auth-Key", &credentials.password)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::Auth(format!(
            "TempAuth at {} returned {}",
            credentials.auth_url, status
        )));
    }

    Ok(AuthSession {
        storage_url: required_header(&response, "X-Storage-Url")?,
        token: required_header(&response, "X-Auth-Token")?,
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_id: Option<String>,
    url: String,
}

async fn keystone(
    http: &reqwest::Client,
    credentials: &SwiftCredentials,
) -> Result<AuthSession, StorageError> {
    let url = tokens_url(&credentials.auth_url);
    let domain = credentials.domain.as_deref().unwrap_or("Default");
    let project = credentials.project.as_deref().ok_or_else(|| {
        StorageError::Auth("Keystone authentication requires a project".to_string())
    })?;

    let body = json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": credentials.username,
                        "domain": { "name": domain },
                        "password": credentials.password,
                    }
                }
            },
            "scope": {
                "project": {
                    "name": project,
                    "domain": { "name": domain },
                }
            }
        }
    });

    debug!("Keystone token request to {}", url);
    let response = http.post(&url).json(&body).send().await?;

    let status = response.status();
    if status != StatusCode::CREATED && status != StatusCode::OK {
        return Err(StorageError::Auth(format!(
            "Keystone at {} returned {}",
            url, status
        )));
    }

    let token = required_header(&response, "X-Subject-Token")?;
    let parsed: TokenResponse = response.json().await?;
    let storage_url = select_endpoint(&parsed.token.catalog, credentials.region.as_deref())
        .ok_or_else(|| {
            StorageError::Auth(format!(
                "No public {} endpoint{} in the Keystone catalog",
                OBJECT_STORE_SERVICE,
                credentials
                    .region
                    .as_deref()
                    .map(|r| format!(" for region {}", r))
                    .unwrap_or_default()
            ))
        })?;

    Ok(AuthSession { storage_url, token })
}

fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/auth/tokens") {
        base.to_string()
    } else {
        format!("{}/auth/tokens", base)
    }
}

fn select_endpoint(catalog: &[CatalogEntry], region: Option<&str>) -> Option<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == OBJECT_STORE_SERVICE)
        .flat_map(|entry| entry.endpoints.iter())
        .filter(|endpoint| endpoint.interface == PUBLIC_INTERFACE)
        .find(|endpoint| match region {
            Some(region) => {
                endpoint.region.as_deref() == Some(region)
                    || endpoint.region_id.as_deref() == Some(region)
            }
            None => true,
        })
        .map(|endpoint| endpoint.url.clone())
}

fn required_header(response: &reqwest::Response, name: &str) -> Result<String, StorageError> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| StorageError::Auth(format!("Auth response is missing {}", name)))
}
