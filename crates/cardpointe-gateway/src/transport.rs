//! The HTTP engine the client delegates to.
//!
//! [`CardPointeClient`](crate::CardPointeClient) builds complete requests
//! (URL, auth, headers, body) and hands them to a [`Transport`]. Anything the
//! engine does beyond that, like timeouts, proxies and redirects, is
//! configured through the pass-through options of
//! [`ClientConfig`](crate::ClientConfig).

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::{CardPointeError, ConfigError};

/// Executes a prepared request and returns the buffered response.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl std::future::Future<Output = Result<http::Response<Bytes>, CardPointeError>> + Send;
}

/// [`Transport`] backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a `reqwest::Client` from the pass-through options. Options left
    /// unset keep reqwest's defaults. A zero timeout means no timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeout_secs.filter(|t| !t.is_zero()) {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout_secs.filter(|t| !t.is_zero()) {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(ref proxy) = config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ConfigError::InvalidProxy(format!("{proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        if let Some(ref agent) = config.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(max) = config.max_redirects {
            builder = builder.redirect(reqwest::redirect::Policy::limited(max));
        }

        let http = builder
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// Use an existing `reqwest::Client` as-is.
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: reqwest::Request,
    ) -> Result<http::Response<Bytes>, CardPointeError> {
        let resp = self.http.execute(request).await?;
        let status = resp.status();
        let version = resp.version();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        let mut out = http::Response::new(body);
        *out.status_mut() = status;
        *out.version_mut() = version;
        *out.headers_mut() = headers;
        Ok(out)
    }
}
