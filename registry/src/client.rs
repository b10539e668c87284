use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("registry returned unexpected status: {0}")]
    UnexpectedStatus(StatusCode),
}

/// A stored application record, keyed by its DSN.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: i64,
    pub dsn: String,
    pub name: String,
}

/// Lookup-by-DSN operation against the system of record.
///
/// An absent application is a routine signal (`Ok(None)`), not a fault;
/// only transport failures and unexpected statuses surface as errors.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn get_by_dsn(&self, dsn: &str) -> Result<Option<Application>, ClientError>;
}

/// Registry client talking to the HTTP API of the system of record.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    url: Url,
    auth_token: String,
}

impl HttpClient {
    pub fn new(url: Url, auth_token: String) -> Self {
        HttpClient {
            client: reqwest::Client::new(),
            url,
            auth_token,
        }
    }
}

#[async_trait]
impl ApplicationStore for HttpClient {
    async fn get_by_dsn(&self, dsn: &str) -> Result<Option<Application>, ClientError> {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("applications");
        }

        tracing::debug!(dsn, "looking up application");
        let response = self
            .client
            .get(url)
            .query(&[("dsn", dsn)])
            .bearer_auth(&self.auth_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.json::<Application>().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(ClientError::UnexpectedStatus(status)),
        }
    }
}
