use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::ResourceName;
use crate::error::FetchError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadInfo {
    pub bytes: u64,
}

pub trait ArchiveFetcher: Send + Sync {
    /// Downloads `url` and writes the body verbatim to `destination`, replacing any
    /// file already there.
    fn fetch(
        &self,
        resource: &ResourceName,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadInfo, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(600))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("movingai-fetch/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FetchError::Client(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        resource: &ResourceName,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, FetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        Err(FetchError::Status {
            resource: resource.to_string(),
            status,
            message,
        })
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(
        &self,
        resource: &ResourceName,
        url: &str,
        destination: &Path,
    ) -> Result<DownloadInfo, FetchError> {
        let write_err = |message: String| FetchError::Write {
            resource: resource.to_string(),
            message,
        };

        debug!(%resource, url, "sending request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| FetchError::Http {
                resource: resource.to_string(),
                message: err.to_string(),
            })?;
        let mut response = Self::handle_status(resource, response)?;

        let parent = destination
            .parent()
            .ok_or_else(|| write_err(format!("invalid destination {}", destination.display())))?;
        let mut temp = tempfile::Builder::new()
            .prefix(".movingai-fetch")
            .tempfile_in(parent)
            .map_err(|err| write_err(err.to_string()))?;

        // Read and write failures are told apart here: a short or reset body is a
        // network error, a full disk is a write error.
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut bytes = 0u64;
        loop {
            let read = match response.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(FetchError::Http {
                        resource: resource.to_string(),
                        message: format!("read body: {err}"),
                    });
                }
            };
            temp.as_file_mut()
                .write_all(&buf[..read])
                .map_err(|err| write_err(format!("{}: {err}", destination.display())))?;
            bytes += read as u64;
        }

        temp.persist(destination)
            .map_err(|err| write_err(format!("{}: {err}", destination.display())))?;
        debug!(%resource, bytes, destination = %destination.display(), "archive written");
        Ok(DownloadInfo { bytes })
    }
}
