//! Webhook transport
//!
//! GET `<endpoint>?_id=<id>` fetches the records, POST `<endpoint>` with the
//! payload body submits an update. One request per call: no retry, no
//! backoff, no client-side timeout.

use crate::config::FormConfig;
use crate::error::{HubResult, NetworkError};
use crate::types::{FetchedRecords, TransactionPayload};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};

/// Fetch/submit collaborator of a session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Fetch the records stored for `transaction_id`
    async fn fetch(&self, transaction_id: &str) -> Result<FetchedRecords, NetworkError>;

    /// Submit an update
    async fn submit(&self, payload: &TransactionPayload) -> Result<(), NetworkError>;
}

/// HTTP transport on reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    endpoint: Url,
    query_key: String,
}

impl ReqwestTransport {
    /// Create transport for an endpoint, fetching with `?_id=`
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            query_key: "_id".to_string(),
        }
    }

    /// Create transport from form configuration
    ///
    /// # Errors
    /// Configuration errors from resolving the endpoint.
    pub fn from_config(config: &FormConfig) -> HubResult<Self> {
        Ok(Self::new(config.endpoint_url()?).with_query_key(config.fetch_query_key.clone()))
    }

    /// With fetch query parameter name
    #[inline]
    #[must_use]
    pub fn with_query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = key.into();
        self
    }

    /// With a preconfigured client
    #[inline]
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Non-success statuses become errors carrying the body text.
async fn check_status(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(status = status.as_u16(), error = %e, "could not read error response body");
            String::new()
        }
    };
    Err(NetworkError::status(status.as_u16(), body))
}

fn transport_error(e: &reqwest::Error) -> NetworkError {
    NetworkError::Transport(e.to_string())
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn fetch(&self, transaction_id: &str) -> Result<FetchedRecords, NetworkError> {
        tracing::debug!(endpoint = %self.endpoint, transaction_id, "fetching records");
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[(self.query_key.as_str(), transaction_id)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let response = check_status(response).await?;
        response
            .json::<FetchedRecords>()
            .await
            .map_err(|e| NetworkError::Decode(e.to_string()))
    }

    async fn submit(&self, payload: &TransactionPayload) -> Result<(), NetworkError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            transaction_id = payload.transaction_id(),
            "submitting update"
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        check_status(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointProfile;

    #[test]
    fn from_config_uses_profile_and_query_key() {
        let mut config = FormConfig::new().with_profile(EndpointProfile::Test);
        config.fetch_query_key = "transactionId".into();
        let transport = ReqwestTransport::from_config(&config).unwrap();
        assert_eq!(transport.endpoint().as_str(), crate::config::TEST_ENDPOINT);
        assert_eq!(transport.query_key, "transactionId");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let transport = ReqwestTransport::new(Url::parse("http://127.0.0.1:9/hook").unwrap());
        let err = transport.fetch("T1").await.unwrap_err();
        assert!(matches!(err, NetworkError::Transport(_)));
    }
}
