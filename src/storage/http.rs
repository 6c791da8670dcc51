//! Object storage over an S3-like HTTP API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{Error, Result};
use crate::storage::{ObjectStorage, ScratchDir};

/// Client for an S3-like API where buckets are top-level path segments.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: Client,
    base: Url,
}

impl HttpStorage {
    /// Create a client for the API rooted at `api_url`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(api_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::ConfigValidation {
                field: "storage.api_url".to_string(),
                message: format!("'{}' cannot be used as a base URL", api_url),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Build `{base}/{segments...}`.
    fn url_for<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::Storage(format!("Invalid storage URL: {}", self.base)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Storage(format!(
                "Request to {} failed with status {}",
                url, status
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ObjectStorage for HttpStorage {
    async fn list_objects(&self, location: &str) -> Result<Vec<String>> {
        let bucket = location.trim_matches('/');
        let mut keys = Vec::new();
        let mut cursor: Option<Cursor> = None;

        loop {
            let mut url = self.url_for([bucket, ""])?;
            match &cursor {
                Some(Cursor::Token(token)) => {
                    url.query_pairs_mut()
                        .append_pair("list-type", "2")
                        .append_pair("continuation-token", token);
                }
                Some(Cursor::Marker(marker)) => {
                    url.query_pairs_mut().append_pair("marker", marker);
                }
                None => {}
            }

            let body = self
                .get(url)
                .await?
                .text()
                .await
                .map_err(|e| Error::Storage(format!("Failed to read listing: {}", e)))?;
            let page = parse_listing(&body)?;
            keys.extend(page.keys);

            if !page.truncated {
                break;
            }

            let next = match (page.continuation_token, page.next_marker.or(page.last_key)) {
                (Some(token), _) => Cursor::Token(token),
                (None, Some(marker)) => Cursor::Marker(marker),
                (None, None) => {
                    tracing::warn!(
                        "Listing of {} is truncated without a continuation point; using {} keys",
                        bucket,
                        keys.len()
                    );
                    break;
                }
            };
            if cursor.as_ref() == Some(&next) {
                tracing::warn!(
                    "Listing of {} did not advance; using {} keys",
                    bucket,
                    keys.len()
                );
                break;
            }

            tracing::debug!("Listing of {} continues after {} keys", bucket, keys.len());
            cursor = Some(next);
        }

        Ok(keys)
    }

    async fn download_to_temp(
        &self,
        location: &str,
        key: &str,
        scratch: &ScratchDir,
    ) -> Result<PathBuf> {
        let bucket = location.trim_matches('/');
        let url = self.url_for(std::iter::once(bucket).chain(key.split('/')))?;
        let response = self.get(url).await?;

        let target = scratch.temp_path(key);
        let mut file = File::create(&target).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Storage(format!("Stream error: {}", e)))?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(target)
    }
}

/// Where the next listing request resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// `ListObjectsV2` continuation token.
    Token(String),
    /// `ListObjects` (v1) marker.
    Marker(String),
}

/// One page of a `ListBucketResult` document.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListingPage {
    /// Object keys, directory placeholders excluded.
    keys: Vec<String>,
    truncated: bool,
    continuation_token: Option<String>,
    next_marker: Option<String>,
    /// Last raw key of the page, the v1 fallback marker.
    last_key: Option<String>,
}

fn tag_pattern(tag: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?s)<{0}>(.*?)</{0}>", tag))
        .map_err(|e| Error::Storage(format!("Invalid listing pattern: {}", e)))
}

fn tag_value(body: &str, tag: &str) -> Result<Option<String>> {
    Ok(tag_pattern(tag)?
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|value| unescape_xml(value.as_str().trim()))
        .filter(|value| !value.is_empty()))
}

fn parse_listing(body: &str) -> Result<ListingPage> {
    let raw_keys: Vec<String> = tag_pattern("Key")?
        .captures_iter(body)
        .filter_map(|captures| captures.get(1))
        .map(|key| unescape_xml(key.as_str().trim()))
        .filter(|key| !key.is_empty())
        .collect();

    let truncated = tag_value(body, "IsTruncated")?
        .map(|value| value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    Ok(ListingPage {
        last_key: raw_keys.last().cloned(),
        keys: raw_keys.into_iter().filter(|key| !key.ends_with('/')).collect(),
        truncated,
        continuation_token: tag_value(body, "NextContinuationToken")?,
        next_marker: tag_value(body, "NextMarker")?,
    })
}

/// Decode the five predefined XML entities.
fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
