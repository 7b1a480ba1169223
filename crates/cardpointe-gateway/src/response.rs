//! Data-aware HTTP responses.
//!
//! A [`Response`] is a fully buffered HTTP response with one extra accessor,
//! [`Response::data`], that decodes `application/json` bodies on first use and
//! keeps the decoded value for the lifetime of the instance.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode, Version};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::ParseError;

const JSON_MIME: &str = "application/json";

/// A buffered API response.
///
/// Immutable apart from the decoded-data slot, which is filled at most once.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    version: Version,
    decode: bool,
    decoded: OnceCell<Value>,
}

/// What [`Response::data`] hands back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseData<'a> {
    /// Decoded JSON, cached on the response.
    Json(&'a Value),
    /// The raw body of a non-JSON response.
    Raw(&'a [u8]),
}

impl<'a> ResponseData<'a> {
    pub fn as_json(&self) -> Option<&'a Value> {
        match *self {
            ResponseData::Json(v) => Some(v),
            ResponseData::Raw(_) => None,
        }
    }

    /// The raw body as UTF-8, if this is a raw body and it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            ResponseData::Raw(b) => std::str::from_utf8(b).ok(),
            ResponseData::Json(_) => None,
        }
    }

}

impl Response {
    /// Wrap a buffered response. Decoding is off until
    /// [`with_decoding`](Self::with_decoding) is called, which the client's
    /// `data_decode` step does for every inbound response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes, version: Version) -> Self {
        Self {
            status,
            headers,
            body,
            version,
            decode: false,
            decoded: OnceCell::new(),
        }
    }

    /// Enable JSON decoding in [`data`](Self::data).
    pub fn with_decoding(mut self) -> Self {
        self.decode = true;
        self
    }

    pub fn decoding_enabled(&self) -> bool {
        self.decode
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Canonical reason phrase for the status code, e.g. `"OK"`.
    ///
    /// This is not the phrase the server sent: reqwest does not expose it.
    pub fn reason_phrase(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether `Content-Type` mentions `application/json` (case-insensitive).
    fn is_json(&self) -> bool {
        self.headers
            .get_all(CONTENT_TYPE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.to_ascii_lowercase().contains(JSON_MIME))
    }

    /// Decoded body data.
    ///
    /// JSON responses are parsed once and the value is reused on every later
    /// call, including concurrent ones. Anything else comes back as the raw
    /// body and is not cached. A malformed JSON body returns [`ParseError`]
    /// and leaves the slot empty.
    pub fn data(&self) -> Result<ResponseData<'_>, ParseError> {
        if let Some(value) = self.decoded.get() {
            return Ok(ResponseData::Json(value));
        }

        if !self.decode || !self.is_json() {
            return Ok(ResponseData::Raw(&self.body));
        }

        let value = self.decoded.get_or_try_init(|| {
            serde_json::from_slice::<Value>(&self.body).map_err(|source| {
                tracing::warn!(
                    status = %self.status,
                    error = %source,
                    "response declared JSON but body did not parse"
                );
                ParseError {
                    status: self.status,
                    source,
                }
            })
        })?;
        Ok(ResponseData::Json(value))
    }
}

impl From<http::Response<Bytes>> for Response {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        Self::new(parts.status, parts.headers, body, parts.version)
    }
}
