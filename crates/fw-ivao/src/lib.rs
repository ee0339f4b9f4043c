//! IVAO tracker adapter.
//!
//! Implements the `fw-core` SnapshotSource over the public whazzup endpoint
//! (`GET /v2/tracker/whazzup`, no auth).

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use fw_core::{
    errors::Error,
    fetcher::{FetchError, RawSnapshot},
    ports::SnapshotSource,
    Result,
};

#[derive(Clone, Debug)]
pub struct WhazzupClient {
    url: String,
    http: reqwest::Client,
}

impl WhazzupClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flightwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl SnapshotSource for WhazzupClient {
    async fn fetch(&self) -> std::result::Result<RawSnapshot, FetchError> {
        let resp = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        debug!(bytes = body.len(), "whazzup response received");

        serde_json::from_slice(&body).map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Serve exactly one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(resp.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{addr}/v2/tracker/whazzup")
    }

    fn client(url: String) -> WhazzupClient {
        WhazzupClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn decodes_json_body() {
        let url = serve_once("200 OK", r#"{"clients":{"pilots":[{"callsign":"RJA1"}]}}"#).await;
        let snap = client(url).fetch().await.unwrap();
        assert_eq!(snap["clients"]["pilots"][0]["callsign"], "RJA1");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        assert_eq!(client(url).fetch().await.unwrap_err(), FetchError::Status(503));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let url = serve_once("200 OK", "<html>maintenance</html>").await;
        assert!(matches!(
            client(url).fetch().await.unwrap_err(),
            FetchError::Body(_)
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}/"))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}
