//! Where payloads come from: a JSON file on disk or an HTTP(S) endpoint.

use std::path::PathBuf;
use std::time::Duration;

use evoview::error::{Error, Result};
use reqwest::{Client, Url};
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Http(Url),
}

/// Shared client for every poll; the timeout covers connect plus body.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("http client: {e}")))
}

impl Source {
    /// `http://` or `https://` URLs, or anything else as a file path.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let lower = raw.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Ok(Source::File(PathBuf::from(raw)));
        }
        Url::parse(raw)
            .map(Source::Http)
            .map_err(|e| Error::Config(format!("bad source url {raw}: {e}")))
    }

    pub async fn fetch(&self, client: &Client) -> Result<String> {
        match self {
            Source::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            Source::Http(url) => http_get(client, url).await,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::File(p) => write!(f, "{}", p.display()),
            Source::Http(url) => write!(f, "{url}"),
        }
    }
}

async fn http_get(client: &Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Fetch(e.to_string()))?;
    let body = response.bytes().await.map_err(|e| Error::Fetch(e.to_string()))?;
    debug!("Read {} bytes from {}", body.len(), url);
    String::from_utf8(body.to_vec()).map_err(|e| Error::Fetch(format!("{url}: body is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response on a loopback port and return its URL.
    async fn serve_once(response: &'static [u8]) -> Source {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            stream.write_all(response).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        Source::parse(&format!("http://127.0.0.1:{port}/api/data")).unwrap()
    }

    #[test]
    fn parses_http_sources() {
        match Source::parse("http://localhost:8080/api/data").unwrap() {
            Source::Http(url) => {
                assert_eq!(url.host_str(), Some("localhost"));
                assert_eq!(url.port(), Some(8080));
                assert_eq!(url.path(), "/api/data");
            }
            other => panic!("expected http, got {other:?}"),
        }
        match Source::parse("http://[::1]:8080/api/data").unwrap() {
            Source::Http(url) => assert_eq!(url.host_str(), Some("[::1]")),
            other => panic!("expected http, got {other:?}"),
        }
        assert!(matches!(Source::parse("https://example.org/data"), Ok(Source::Http(_))));
        assert!(matches!(Source::parse("http://h:notaport/"), Err(Error::Config(_))));
        assert!(matches!(Source::parse("http://"), Err(Error::Config(_))));
    }

    #[test]
    fn anything_else_is_a_file() {
        assert_eq!(
            Source::parse(" run/data.json ").unwrap(),
            Source::File(PathBuf::from("run/data.json"))
        );
    }

    #[tokio::test]
    async fn chunked_bodies_are_decoded() {
        let source = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\n\r\n2\r\n{}\r\n0\r\n\r\n",
        )
        .await;
        assert_eq!(source.fetch(&http_client().unwrap()).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let source = serve_once(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\n\r\nbusy").await;
        let e = source.fetch(&http_client().unwrap()).await.unwrap_err();
        assert!(matches!(e, Error::Fetch(_)));
        assert!(e.to_string().contains("503"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected() {
        let source = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{\"p\":\"\xff\xfe\"}").await;
        let e = source.fetch(&http_client().unwrap()).await.unwrap_err();
        assert!(e.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn reads_files() {
        let dir = std::env::temp_dir().join(format!("evoview-watch-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("data.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let client = http_client().unwrap();
        assert_eq!(Source::File(path.clone()).fetch(&client).await.unwrap(), "{}");
        let missing = Source::File(dir.join("missing.json")).fetch(&client).await.unwrap_err();
        assert!(matches!(missing, Error::Io(_)));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
