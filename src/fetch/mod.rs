mod basic;
mod client;

pub use basic::{BasicClient, CONNECT_TIMEOUT};
pub use client::HttpClient;

use crate::errors::DataSourceError;
use tracing::debug;

/// Downloads `url` and returns the response body.
///
/// Non-success statuses are reported as [`DataSourceError::Status`]; an
/// expired timeout as [`DataSourceError::Timeout`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, DataSourceError> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|_| DataSourceError::InvalidUrl(url.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| DataSourceError::from_reqwest(url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DataSourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| DataSourceError::from_reqwest(url, e))?;
    debug!(url, bytes = bytes.len(), "Source bytes received");
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct UnusedClient;

    #[async_trait]
    impl HttpClient for UnusedClient {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("request must not be issued for an invalid URL")
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_request() {
        let err = fetch_bytes(&UnusedClient, "not a url").await.unwrap_err();
        assert!(matches!(err, DataSourceError::InvalidUrl(_)));
    }

    #[test]
    fn test_basic_client_builds_with_short_timeout() {
        assert!(BasicClient::new(std::time::Duration::from_millis(500)).is_ok());
    }

    #[tokio::test]
    async fn test_silent_server_times_out_as_temporary() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/indicators.csv", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = BasicClient::new(Duration::from_millis(300)).unwrap();
        let err = fetch_bytes(&client, &url).await.unwrap_err();

        assert!(matches!(err, DataSourceError::Timeout { .. }), "got {err:?}");
        assert!(err.is_temporary());
        server.abort();
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/indicators.csv", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
        });

        let client = BasicClient::new(Duration::from_secs(5)).unwrap();
        let err = fetch_bytes(&client, &url).await.unwrap_err();

        assert!(
            matches!(err, DataSourceError::Status { status: 404, .. }),
            "got {err:?}"
        );
        assert!(!err.is_temporary());
        server.await.unwrap();
    }
}
