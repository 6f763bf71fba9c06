use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::ByteStreamReader;

#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Feed returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Byte body of an opened feed.
pub type FeedBody = ByteStreamReader<BoxStream<'static, io::Result<Bytes>>>;

/// Anything that can open a feed document for reading.
#[async_trait]
pub trait FeedConnector {
    async fn open(&self) -> Result<FeedBody, ConnectorError>;
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub headers: HeaderMap,
    /// Whole-request deadline, enforced by the HTTP client.
    pub timeout: Duration,
    pub query_params: Vec<(String, String)>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            headers,
            timeout: Duration::from_secs(30),
            query_params: Vec::new(),
        }
    }
}

pub struct HttpConnector {
    client: Client,
    url: Url,
    config: HttpConfig,
}

impl HttpConnector {
    pub fn new(url: &str, config: HttpConfig) -> Result<Self, ConnectorError> {
        let mut url = Url::parse(url).map_err(|e| ConnectorError::Config(e.to_string()))?;
        if !config.query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(&config.query_params);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConnectorError::Config(e.to_string()))?;

        Ok(Self {
            client,
            url,
            config,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FeedConnector for HttpConnector {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn open(&self) -> Result<FeedBody, ConnectorError> {
        let response = self
            .client
            .get(self.url.clone())
            .headers(self.config.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Status(status));
        }
        debug!(%status, length = ?response.content_length(), "feed opened");

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        Ok(ByteStreamReader::new(Box::pin(body) as BoxStream<'static, _>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_are_encoded() {
        let config = HttpConfig {
            query_params: vec![("format".into(), "json".into())],
            ..Default::default()
        };
        let connector = HttpConnector::new("http://localhost/feeds/carparks", config).unwrap();
        assert_eq!(
            connector.url().as_str(),
            "http://localhost/feeds/carparks?format=json"
        );
    }

    #[test]
    fn test_invalid_url() {
        let result = HttpConnector::new("not a url", HttpConfig::default());
        assert!(matches!(result, Err(ConnectorError::Config(_))));
    }
}
