//! HTTP/JSON client for the replacement listings service.
//!
//! # Responsibilities
//! - Map listing operations onto the service's REST endpoints
//! - Classify every failure into a [`RemoteErrorKind`]
//!
//! # Design Decisions
//! - The client carries its own request timeout as a backstop; the facade
//!   applies the authoritative deadline around each call
//! - No retries here, one request per call

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::backend::{Listing, RemoteBackend, RemoteError, RemoteErrorKind};
use crate::config::RemoteConfig;

#[derive(Debug, thiserror::Error)]
pub enum RemoteClientError {
    #[error("invalid remote base url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct HttpRemoteBackend {
    client: Client,
    base: Url,
}

impl HttpRemoteBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteClientError> {
        // Url::join drops the last path segment unless it ends in '/'.
        let mut raw = config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .no_proxy()
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|e| RemoteError::new(RemoteErrorKind::Unknown, e.to_string()))
    }

    async fn read_listing(resp: reqwest::Response) -> Result<Listing, RemoteError> {
        let resp = check_status(resp).await?;
        resp.json::<Listing>().await.map_err(|e| classify_transport(&e))
    }
}

#[async_trait]
impl RemoteBackend for HttpRemoteBackend {
    async fn create(&self, listing: &Listing) -> Result<Listing, RemoteError> {
        let url = self.endpoint("api/v1/listings")?;
        let resp = self
            .client
            .post(url)
            .json(listing)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::read_listing(resp).await
    }

    async fn get(&self, id: i64) -> Result<Listing, RemoteError> {
        let url = self.endpoint(&format!("api/v1/listings/{}", id))?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::read_listing(resp).await
    }

    async fn update(&self, listing: &Listing) -> Result<Listing, RemoteError> {
        let url = self.endpoint(&format!("api/v1/listings/{}", listing.id))?;
        let resp = self
            .client
            .put(url)
            .json(listing)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        Self::read_listing(resp).await
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<(), RemoteError> {
        let mut url = self.endpoint(&format!("api/v1/listings/{}", id))?;
        url.query_pairs_mut()
            .append_pair("owner_id", &owner_id.to_string());
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;
        check_status(resp).await.map(|_| ())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        format!("status {}", status)
    } else {
        format!("status {}: {}", status, body)
    };
    Err(RemoteError::new(classify_status(status), message))
}

/// Map a non-success HTTP status to an error kind.
pub fn classify_status(status: StatusCode) -> RemoteErrorKind {
    match status {
        StatusCode::NOT_FOUND => RemoteErrorKind::NotFound,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteErrorKind::Timeout,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => RemoteErrorKind::Connection,
        _ => RemoteErrorKind::Application,
    }
}

/// Map a transport-level reqwest failure to an error kind.
pub fn classify_transport(err: &reqwest::Error) -> RemoteError {
    let kind = if err.is_timeout() {
        RemoteErrorKind::Timeout
    } else if err.is_connect() {
        RemoteErrorKind::Connection
    } else if err.is_decode() {
        RemoteErrorKind::Application
    } else {
        RemoteErrorKind::Unknown
    };
    RemoteError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SourceType;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::NOT_FOUND), RemoteErrorKind::NotFound);
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), RemoteErrorKind::Timeout);
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), RemoteErrorKind::Connection);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), RemoteErrorKind::Application);
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR), RemoteErrorKind::Application);
    }

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let config = RemoteConfig {
            base_url: "http://listings.internal/svc".into(),
            ..RemoteConfig::default()
        };
        let backend = HttpRemoteBackend::new(&config).unwrap();
        let url = backend.endpoint("api/v1/listings/7").unwrap();
        assert_eq!(url.as_str(), "http://listings.internal/svc/api/v1/listings/7");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = RemoteConfig {
            base_url: "not a url".into(),
            ..RemoteConfig::default()
        };
        assert!(matches!(
            HttpRemoteBackend::new(&config),
            Err(RemoteClientError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_classified() {
        let config = RemoteConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..RemoteConfig::default()
        };
        let backend = HttpRemoteBackend::new(&config).unwrap();
        let err = backend
            .create(&Listing::new(SourceType::C2c, 1, "Bike", 10.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Connection);
    }
}
