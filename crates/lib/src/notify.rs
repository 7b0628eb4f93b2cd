//! Operator notifications.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::HTTP_TIMEOUT;

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("failed to deliver notification to {endpoint}: {source}")]
  Request {
    endpoint: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("notification endpoint {endpoint} answered HTTP {status}")]
  Status { endpoint: String, status: u16 },
}

/// Fan-out of pipeline milestone messages. Delivery failures propagate.
pub trait Notifier {
  fn send(&self, message: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
  content: &'a str,
}

/// Posts `{"content": message}` to each configured webhook, in order.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
  client: reqwest::Client,
  endpoints: Vec<String>,
}

impl WebhookNotifier {
  pub fn new(endpoints: Vec<String>) -> reqwest::Result<Self> {
    Self::with_timeout(endpoints, HTTP_TIMEOUT)
  }

  pub fn with_timeout(endpoints: Vec<String>, timeout: Duration) -> reqwest::Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, endpoints })
  }

  pub fn endpoints(&self) -> &[String] {
    &self.endpoints
  }
}

impl Notifier for WebhookNotifier {
  async fn send(&self, message: &str) -> Result<(), NotifyError> {
    debug!(message, endpoints = self.endpoints.len(), "sending webhook message");

    for endpoint in &self.endpoints {
      let response = self
        .client
        .post(endpoint)
        .json(&WebhookPayload { content: message })
        .send()
        .await
        .map_err(|source| NotifyError::Request {
          endpoint: endpoint.clone(),
          source,
        })?;

      let status = response.status();
      if !status.is_success() {
        return Err(NotifyError::Status {
          endpoint: endpoint.clone(),
          status: status.as_u16(),
        });
      }
    }

    Ok(())
  }
}
