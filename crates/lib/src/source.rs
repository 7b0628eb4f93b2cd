//! Upstream version lookup.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::branch::Branch;
use crate::consts::HTTP_TIMEOUT;

/// Failure to learn the upstream version. The pipeline treats it as "no update this cycle".
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("could not get current version from {url}: HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("unexpected response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },
}

/// Where the current upstream version of a branch comes from.
pub trait VersionSource {
  fn current_version(&self, branch: Branch) -> impl Future<Output = Result<String, SourceError>> + Send;
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
  name: String,
}

/// The upstream update API: `GET <endpoint>/<branch>?platform=linux` returning `{"name": "<version>"}`.
#[derive(Debug, Clone)]
pub struct HttpVersionSource {
  client: reqwest::Client,
  endpoint: String,
}

impl HttpVersionSource {
  pub fn new(endpoint: impl Into<String>) -> reqwest::Result<Self> {
    Self::with_timeout(endpoint, HTTP_TIMEOUT)
  }

  pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self::with_client(client, endpoint))
  }

  pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
    Self {
      client,
      endpoint: endpoint.into().trim_end_matches('/').to_string(),
    }
  }

  pub fn url_for(&self, branch: Branch) -> String {
    format!("{}/{}?platform=linux", self.endpoint, branch)
  }
}

impl VersionSource for HttpVersionSource {
  async fn current_version(&self, branch: Branch) -> Result<String, SourceError> {
    let url = self.url_for(branch);
    debug!(%branch, url = %url, "getting current version");

    let response = self
      .client
      .get(&url)
      .send()
      .await
      .map_err(|source| SourceError::Request {
        url: url.clone(),
        source,
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(SourceError::Status {
        url,
        status: status.as_u16(),
      });
    }

    let body: UpdateResponse = response.json().await.map_err(|source| SourceError::Decode {
      url: url.clone(),
      source,
    })?;

    debug!(%branch, version = %body.name, "upstream version");
    Ok(body.name)
  }
}
