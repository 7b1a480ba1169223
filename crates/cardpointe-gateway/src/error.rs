use thiserror::Error;

/// Errors raised while building a [`CardPointeClient`](crate::CardPointeClient).
///
/// All of these fire before any request leaves the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config option: {0}")]
    MissingRequired(&'static str),

    #[error("base_url cannot be set directly; use the site option to configure the REST URL")]
    BaseUrlOverride,

    #[error("invalid site: {0}")]
    InvalidSite(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("failed to build transport: {0}")]
    Transport(String),
}

/// Errors returned by request operations on the client.
#[derive(Debug, Error)]
pub enum CardPointeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A response declared `application/json` whose body did not parse.
///
/// The response it came from is left untouched and can still be read raw.
#[derive(Debug, Error)]
#[error("failed to decode JSON body of {status} response: {source}")]
pub struct ParseError {
    pub status: http::StatusCode,
    #[source]
    pub source: serde_json::Error,
}
