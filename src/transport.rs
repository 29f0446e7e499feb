//! HTTP access for catalog clients and the installer.
//!
//! Everything above this module sees two operations: fetch a JSON document and
//! download a file. Retries for transient failures happen here and nowhere else.

use crate::download::download_file;
use crate::error::TransportError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

const USER_AGENT: &str = concat!("jdkup/", env!("CARGO_PKG_VERSION"));
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and decode the body as JSON. Any non-2xx status is an error.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;

    /// GET `url` and write the body to `dest`.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    retries: u32,
}

impl ReqwestTransport {
    pub fn new(retries: u32) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client, retries })
    }

    async fn with_retries<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, TransportError>>,
    {
        let mut tries = 0;
        loop {
            match attempt().await {
                Err(e) if e.is_transient() && tries < self.retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(tries);
                    tries += 1;
                    tracing::warn!(
                        "Request to {} failed ({}), retrying in {:?} ({}/{})",
                        url,
                        e,
                        delay,
                        tries,
                        self.retries
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        tracing::debug!("GET {}", url);
        self.with_retries(url, || async move {
            let response = self.get_once(url).await?;
            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| TransportError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        })
        .await
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), TransportError> {
        tracing::debug!("Downloading {} to {}", url, dest.display());
        self.with_retries(url, || async move {
            let response = self.get_once(url).await?;
            download_file(response, url, dest).await
        })
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_json_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info/available_releases"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "available_releases": [8, 11] })),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(0).unwrap();
        let body = transport
            .get_json(&format!("{}/info/available_releases", server.uri()))
            .await
            .unwrap();
        assert_eq!(body["available_releases"][1], 11);
    }

    #[tokio::test]
    async fn test_not_found_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(2).unwrap();
        let err = transport
            .get_json(&format!("{}/assets/version/x", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // 404 is not transient, so only one request went out
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(1).unwrap();
        let err = transport.get_json(&server.uri()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jdk.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("jdk.tar.gz");
        let transport = ReqwestTransport::new(0).unwrap();
        transport
            .download(&format!("{}/jdk.tar.gz", server.uri()), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
    }
}
