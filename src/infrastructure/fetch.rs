//! Reading input documents
//!
//! A source is `-` for stdin, an `http(s)://` URL, or a file path. URLs are
//! fetched with a bounded number of attempts.

use super::Config;
use crate::encoding::{Input, Origin};
use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Reads the document named by `source`
///
/// # Errors
///
/// Fails when stdin or the file cannot be read, or the URL cannot be
/// fetched within `config.fetch_attempts` attempts.
pub fn read_input(source: &str, config: &Config) -> Result<Input> {
    if source == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read standard input")?;
        return Ok(Input::new(data, Origin::Stdin));
    }

    if let Some(url) = parse_url(source) {
        let data = fetch_url(&url, config.fetch_attempts, config.fetch_backoff())?;
        return Ok(Input::new(data, Origin::Url(url.to_string())));
    }

    let path = Path::new(source);
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(Input::new(data, Origin::File(path.to_path_buf())))
}

/// Returns the URL when `source` is an HTTP(S) URL
#[must_use]
pub fn parse_url(source: &str) -> Option<Url> {
    Url::parse(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Fetches `url`, retrying transport failures
///
/// A response with a non-success status fails at once.
///
/// # Errors
///
/// Fails on a non-success status or when every attempt fails.
pub fn fetch_url(url: &Url, attempts: u32, backoff: Duration) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::new();
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match client.get(url.clone()).send() {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    bail!("Failed to fetch {url}: server responded with {status}");
                }
                let body = response
                    .bytes()
                    .with_context(|| format!("Failed to read response body from {url}"))?;
                return Ok(body.to_vec());
            }
            Err(error) => {
                tracing::warn!(%url, attempt, attempts, %error, "fetch failed");
                last_error = Some(error);
                if attempt < attempts {
                    std::thread::sleep(backoff);
                }
            }
        }
    }

    match last_error {
        Some(error) => {
            Err(error).with_context(|| format!("Failed to fetch {url} after {attempts} attempt(s)"))
        }
        None => bail!("Failed to fetch {url}"),
    }
}
