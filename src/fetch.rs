//! HTTP client abstraction for making requests to the Claimd service

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    multipart, Client, Method, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};

const CLIENT_INFO: &str = concat!("claimd-rust/", env!("CARGO_PKG_VERSION"));

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    form: Option<multipart::Form>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("X-Client-Info", HeaderValue::from_static(CLIENT_INFO));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            form: None,
            timeout: None,
            cancel: None,
        }
    }

    /// Send a multipart form as the request body
    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.form = Some(form);
        self
    }

    /// Abort the request with [`Error::Timeout`] when it runs longer than `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tie the request to a cancellation token owned by the caller
    pub fn cancel_on(mut self, token: Option<&CancellationToken>) -> Self {
        self.cancel = token.cloned();
        self
    }

    fn build(self) -> Result<(RequestBuilder, Option<Duration>, Option<CancellationToken>)> {
        let url = Url::parse(&self.url)?;

        let mut req = self
            .client
            .request(self.method, url.as_str())
            .headers(self.headers);

        if let Some(form) = self.form {
            req = req.multipart(form);
        }

        Ok((req, self.timeout, self.cancel))
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        let url = self.url.clone();
        let response = self.execute_raw().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!("request to {} failed with status {}", url, status);
            if status.as_u16() == 404 {
                return Err(Error::NotFound(url));
            }
            return Err(Error::Api {
                status: status.as_u16(),
                message: api_message(&text),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice::<T>(&bytes)?)
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(self) -> Result<Response> {
        let method = self.method.clone();
        let url = self.url.clone();
        let (req, timeout, cancel) = self.build()?;
        debug!("{} {}", method, url);
        guarded(req.send(), timeout, cancel.as_ref()).await
    }
}

/// Run `fut` under an optional timeout and cancellation token.
///
/// Dropping the future on cancellation aborts the in-flight request.
async fn guarded<F>(
    fut: F,
    timeout: Option<Duration>,
    cancel: Option<&CancellationToken>,
) -> Result<Response>
where
    F: Future<Output = std::result::Result<Response, reqwest::Error>>,
{
    let timed = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(res) => res.map_err(Error::from),
                Err(_) => Err(Error::Timeout),
            },
            None => fut.await.map_err(Error::from),
        }
    };

    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                res = timed => res,
            }
        }
        None => timed.await,
    }
}

/// Pull a human-readable message out of an error body.
fn api_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| text.to_string())
}

/// Percent-encode a single path segment
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_prefers_structured_fields() {
        assert_eq!(api_message(r#"{"detail":"Failed to process"}"#), "Failed to process");
        assert_eq!(api_message(r#"{"message":"nope","error":"x"}"#), "nope");
        assert_eq!(api_message("plain text"), "plain text");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(encode_segment("123-45-6789"), "123-45-6789");
        assert_eq!(encode_segment("Jane Doe"), "Jane%20Doe");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }
}
