//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the archiver, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests for listing pages
//! - Transcoding response bodies to UTF-8
//!
//! There is no retry: any failure is returned to the calling walker.

use crate::config::HttpConfig;
use crate::{ArchiverError, ConfigError};
use encoding_rs::Encoding;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use quote_archiver::config::HttpConfig;
/// use quote_archiver::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages and hands them out as UTF-8 text
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    fallback_encoding: &'static Encoding,
}

impl PageFetcher {
    /// Creates a fetcher from the HTTP configuration
    ///
    /// # Returns
    ///
    /// * `Ok(PageFetcher)` - Client built and charset recognised
    /// * `Err(ArchiverError)` - Unknown charset or client build failure
    pub fn new(config: &HttpConfig) -> Result<Self, ArchiverError> {
        let fallback_encoding = Encoding::for_label(config.charset.as_bytes())
            .ok_or_else(|| ConfigError::UnknownCharset(config.charset.clone()))?;
        let client = build_http_client(config)?;

        Ok(Self {
            client,
            fallback_encoding,
        })
    }

    /// Fetches a page and decodes it to UTF-8
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Decoded page body
    /// * `Err(ArchiverError::Transport)` - Connection, timeout or body read failure
    /// * `Err(ArchiverError::HttpStatus)` - Non-success HTTP status
    pub async fn fetch(&self, url: &str) -> Result<String, ArchiverError> {
        let transport = |source| ArchiverError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiverError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let header_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type)
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(transport)?;

        Ok(decode_body(
            &bytes,
            header_charset.as_deref(),
            self.fallback_encoding,
        ))
    }
}

/// Pulls the `charset` parameter out of a Content-Type header value
fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Transcodes a response body to UTF-8
///
/// Priority: byte order mark, then the declared charset (if recognised), then
/// the fallback. Malformed sequences are replaced rather than rejected.
pub fn decode_body(bytes: &[u8], declared: Option<&str>, fallback: &'static Encoding) -> String {
    let encoding = declared
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(fallback);

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Replaced malformed {} sequences while decoding", actual.name());
    }
    if actual != encoding {
        tracing::trace!("Byte order mark selected {} over {}", actual.name(), encoding.name());
    }

    text.into_owned()
}
