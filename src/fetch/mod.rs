pub mod client;
pub mod temp_archive;

pub use temp_archive::TempArchive;

use crate::config::FetchConfig;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use client::{Headers, HttpClient};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build http client")]
    Client {
        #[source]
        cause: reqwest::Error,
    },
    #[error("Failed to download {url}")]
    Transport {
        url: String,
        #[source]
        cause: reqwest::Error,
    },
    #[error("Download of {url} failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("Download of {url} returned an empty body")]
    Empty { url: String },
    #[error("Failed to write {url} to a temporary file")]
    Io {
        url: String,
        #[source]
        cause: std::io::Error,
    },
}

impl FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            FetchError::Client { .. } | FetchError::Empty { .. } | FetchError::Io { .. } => false,
        }
    }
}

/// Downloads release archives into job-owned temporary files.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: HttpClient,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = HttpClient::new(Duration::from_secs(config.timeout_secs))
            .map_err(|cause| FetchError::Client { cause })?;

        Ok(Fetcher {
            client,
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        })
    }

    pub async fn fetch(&self, url: &str, file_name: &str) -> Result<TempArchive, FetchError> {
        let mut attempt = 0;

        backoff::future::retry(self.backoff(), || {
            attempt += 1;
            let attempt = attempt;

            async move {
                log::debug!("downloading {} (attempt {})", url, attempt);
                self.download(url, file_name).await.map_err(|error| {
                    if error.is_transient() && attempt <= self.max_retries {
                        log::warn!("{}, retrying", error);
                        backoff::Error::transient(error)
                    } else {
                        backoff::Error::permanent(error)
                    }
                })
            }
        })
        .await
    }

    async fn download(&self, url: &str, file_name: &str) -> Result<TempArchive, FetchError> {
        let response = self
            .client
            .get(url)
            .default_headers()
            .send()
            .await
            .map_err(|cause| FetchError::Transport {
                url: url.to_owned(),
                cause,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let io_error = |cause: std::io::Error| FetchError::Io {
            url: url.to_owned(),
            cause,
        };

        let archive = TempArchive::create(file_name).map_err(io_error)?;
        let mut writer = archive.writer().map_err(io_error)?;
        let stream = response.bytes_stream();
        tokio::pin!(stream);
        let mut written = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|cause| FetchError::Transport {
                url: url.to_owned(),
                cause,
            })?;
            writer.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len();
        }
        writer.flush().await.map_err(io_error)?;

        if written == 0 {
            return Err(FetchError::Empty {
                url: url.to_owned(),
            });
        }

        log::debug!(
            "downloaded {} bytes from {} into {}",
            written,
            url,
            archive.path().display()
        );
        Ok(archive)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use mockito::Server;

    fn fetcher(max_retries: u32) -> Fetcher {
        Fetcher::new(&FetchConfig {
            timeout_secs: 5,
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        })
        .expect("client")
    }

    #[tokio::test]
    async fn should_download_into_temp_file() -> Result<()> {
        let mut server = Server::new_async().await;
        let url = format!("{}/v0.1.0/lispium-linux-x86_64.tar.gz", server.url());

        let mock = server
            .mock("GET", "/v0.1.0/lispium-linux-x86_64.tar.gz")
            .with_status(200)
            .with_body("archive bytes")
            .create_async()
            .await;

        let archive = fetcher(0)
            .fetch(&url, "lispium-linux-x86_64.tar.gz")
            .await?;

        mock.assert_async().await;
        assert_eq!(archive.file_name(), "lispium-linux-x86_64.tar.gz");
        assert_eq!(std::fs::read(archive.path())?, b"archive bytes");

        let path = archive.path().to_path_buf();
        drop(archive);
        assert!(!path.exists());

        Ok(())
    }

    #[tokio::test]
    async fn should_fail_on_not_found_without_retrying() -> Result<()> {
        let mut server = Server::new_async().await;
        let url = format!("{}/missing.zip", server.url());

        let mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let result = fetcher(3).fetch(&url, "missing.zip").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));

        Ok(())
    }

    #[tokio::test]
    async fn should_retry_server_errors() -> Result<()> {
        let mut server = Server::new_async().await;
        let url = format!("{}/flaky.tar.gz", server.url());

        let mock = server
            .mock("GET", "/flaky.tar.gz")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let result = fetcher(2).fetch(&url, "flaky.tar.gz").await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));

        Ok(())
    }

    #[tokio::test]
    async fn should_reject_empty_body() -> Result<()> {
        let mut server = Server::new_async().await;
        let url = format!("{}/empty.tar.gz", server.url());

        let _mock = server
            .mock("GET", "/empty.tar.gz")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let result = fetcher(0).fetch(&url, "empty.tar.gz").await;

        assert!(matches!(result, Err(FetchError::Empty { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn should_report_unreachable_host() -> Result<()> {
        let result = fetcher(0)
            .fetch("http://127.0.0.1:9/lispium.tar.gz", "lispium.tar.gz")
            .await;

        assert!(matches!(result, Err(FetchError::Transport { .. })));

        Ok(())
    }
}
