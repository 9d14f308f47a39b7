//! HTTP client wrapper used for archive downloads.

use anyhow::{Context, Result};
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use std::io::Write;

use super::status::{classify_error, classify_status};

/// Hosts that may receive the GitHub token.
const GITHUB_HOSTS: [&str; 2] = ["github.com", "api.github.com"];

/// Thin wrapper over a configured reqwest [`Client`].
///
/// The timeout lives on the inner client; there is no retry loop.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    github_auth: Option<HeaderValue>,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            github_auth: None,
        }
    }

    /// Send `token` as a bearer token, but only to GitHub over https.
    pub fn with_github_token(mut self, token: &str) -> Result<Self> {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("GITHUB_TOKEN is not a valid header value")?;
        auth_value.set_sensitive(true);
        self.github_auth = Some(auth_value);
        Ok(self)
    }

    /// GET request for `url`, carrying the GitHub token when the host is GitHub.
    pub fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.github_auth {
            Some(auth) if is_github_url(url) => request.header(AUTHORIZATION, auth.clone()),
            _ => request,
        }
    }

    /// Streams the body at `url` into the writer returned by `create_writer`.
    ///
    /// The writer is only created once the response status is a success,
    /// so a 404 leaves nothing on disk.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let mut response = self.get(url).send().await.map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status).into());
        }

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(classify_error)? {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

fn is_github_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| {
        u.scheme() == "https" && u.host_str().is_some_and(|h| GITHUB_HOSTS.contains(&h))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use mockito::Matcher;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[test]
    fn test_is_github_url() {
        assert!(is_github_url(
            "https://github.com/siaf/toli/releases/download/v0.1.0/toli.tar.gz"
        ));
        assert!(is_github_url("https://api.github.com/repos/siaf/toli"));
        assert!(!is_github_url("http://github.com/siaf/toli"));
        assert!(!is_github_url("https://github.com.evil.example/toli.tar.gz"));
        assert!(!is_github_url("https://mirror.example.com/github.com/toli.tar.gz"));
        assert!(!is_github_url("not a url"));
    }

    #[test]
    fn test_token_attached_only_for_github() {
        let client = HttpClient::new(Client::new())
            .with_github_token("ghp_secret_token_value")
            .unwrap();

        let github = client
            .get("https://github.com/siaf/toli/releases/download/v0.1.0/toli.tar.gz")
            .build()
            .unwrap();
        let auth = github.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer ghp_secret_token_value");
        assert!(auth.is_sensitive());

        let mirror = client
            .get("https://mirror.example.com/toli.tar.gz")
            .build()
            .unwrap();
        assert!(mirror.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_download_from_mirror_sends_no_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mirror/toli.tar.gz")
            .match_header("Authorization", Matcher::Missing)
            .with_status(200)
            .with_body("archive")
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new())
            .with_github_token("ghp_secret_token_value")
            .unwrap();
        let bytes = client
            .download_file(&format!("{}/mirror/toli.tar.gz", server.url()), || {
                Ok(std::io::sink())
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 7);
    }

    #[tokio::test]
    async fn test_download_file_times_out_on_stalled_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering.
        let stalled = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = HttpClient::new(
            Client::builder()
                .timeout(Duration::from_secs(1))
                .build()
                .unwrap(),
        );
        let result = client
            .download_file(&format!("http://{}/toli.tar.gz", addr), || {
                Ok(std::io::sink())
            })
            .await;

        stalled.abort();
        assert_eq!(
            result.unwrap_err().downcast_ref::<HttpError>(),
            Some(&HttpError::Timeout)
        );
    }

    #[tokio::test]
    async fn test_download_file_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let mut buffer = Vec::new();
        let bytes = client
            .download_file(&format!("{}/file.tar.gz", url), || Ok(&mut buffer))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12);
        assert_eq!(buffer, b"test content");
    }

    #[tokio::test]
    async fn test_download_file_not_found_creates_no_writer() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || -> Result<Vec<u8>> {
                panic!("writer must not be created for a failed response")
            })
            .await;

        // Exactly one request: failures are not retried.
        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.downcast_ref::<HttpError>(), Some(&HttpError::NotFound));
    }

    #[tokio::test]
    async fn test_download_file_server_error_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.tar.gz")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(&format!("{}/file.tar.gz", url), || Ok(std::io::sink()))
            .await;

        mock.assert_async().await;
        assert_eq!(
            result.unwrap_err().downcast_ref::<HttpError>(),
            Some(&HttpError::Status(503))
        );
    }

    #[tokio::test]
    async fn test_download_file_connection_refused() {
        // Port 9 (discard) is not served on test hosts.
        let client = HttpClient::new(
            Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        );
        let result = client
            .download_file("http://127.0.0.1:9/file.tar.gz", || Ok(std::io::sink()))
            .await;
        assert!(result.is_err());
    }
}
