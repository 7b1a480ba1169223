use base64::Engine;
use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::HeaderMap;
use reqwest::Method;
use serde::Serialize;

use crate::config::{rest_base_url, ClientConfig, Credentials};
use crate::error::{CardPointeError, ConfigError};
use crate::middleware::{data_decode, HandlerStack, DATA_DECODE};
use crate::response::Response;
use crate::transport::{ReqwestTransport, Transport};

/// Client for the CardPointe Gateway REST API.
///
/// Every request goes to `https://<site>.cardconnect.com/cardconnect/rest/<path>`
/// with `Authorization: Basic base64(user:pass)`. Responses pass through the
/// client's [`HandlerStack`], which by default holds the `data_decode` step so
/// that [`Response::data`] returns parsed JSON.
pub struct CardPointeClient<T: Transport = ReqwestTransport> {
    transport: T,
    base_url: url::Url,
    headers: HeaderMap,
    stack: HandlerStack,
}

impl<T: Transport> std::fmt::Debug for CardPointeClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPointeClient")
            .field("base_url", &self.base_url.as_str())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("stack", &self.stack)
            .finish()
    }
}

impl CardPointeClient<ReqwestTransport> {
    /// Validate `config` and build a client over reqwest.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        // Validate before touching the transport so a bad config never
        // builds an engine.
        config.credentials()?;
        let transport = ReqwestTransport::from_config(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> CardPointeClient<T> {
    /// Build a client over a custom [`Transport`]. Pass-through options in
    /// `config` are the transport's concern and are ignored here.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ConfigError> {
        let creds = config.credentials()?;
        let base_url = rest_base_url(creds.site)?;
        let headers = default_headers(&config, &creds)?;

        let mut stack = HandlerStack::new();
        stack.push(DATA_DECODE, data_decode);

        tracing::debug!(base_url = %base_url, user = %creds.user, "CardPointe client configured");

        Ok(Self {
            transport,
            base_url,
            headers,
            stack,
        })
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// Headers sent with every request, `Authorization` included.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn handler_stack(&self) -> &HandlerStack {
        &self.stack
    }

    pub fn handler_stack_mut(&mut self) -> &mut HandlerStack {
        &mut self.stack
    }

    /// Resolve `path` under the REST base URL. Leading slashes are dropped so
    /// the path always stays below `/cardconnect/rest/`.
    pub fn url_for(&self, path: &str) -> Result<url::Url, CardPointeError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CardPointeError::InvalidPath(format!("{path}: {e}")))?;

        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(CardPointeError::InvalidPath(path.to_string()));
        }
        Ok(url)
    }

    /// Send a request with an optional raw body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<(Vec<u8>, HeaderValue)>,
    ) -> Result<Response, CardPointeError> {
        let url = self.url_for(path)?;
        let mut request = reqwest::Request::new(method, url);
        *request.headers_mut() = self.headers.clone();

        if let Some((bytes, content_type)) = body {
            request.headers_mut().insert(CONTENT_TYPE, content_type);
            *request.body_mut() = Some(bytes.into());
        }

        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
        let raw = self.transport.send(request).await?;
        tracing::debug!(status = %raw.status(), "received response");

        Ok(self.stack.apply(Response::from(raw)))
    }

    pub async fn get(&self, path: &str) -> Result<Response, CardPointeError> {
        self.send(Method::GET, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, CardPointeError> {
        self.send(Method::DELETE, path, None).await
    }

    /// PUT a JSON body. The Gateway API uses PUT for most operations.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, CardPointeError> {
        self.send(Method::PUT, path, Some(json_body(body)?)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, CardPointeError> {
        self.send(Method::POST, path, Some(json_body(body)?)).await
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<(Vec<u8>, HeaderValue), CardPointeError> {
    Ok((
        serde_json::to_vec(body)?,
        HeaderValue::from_static("application/json"),
    ))
}

/// `Basic base64(user:pass)`, marked sensitive.
pub fn basic_auth_header(user: &str, pass: &str) -> HeaderValue {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{pass}"));
    // Base64 output and the "Basic " prefix are always visible ASCII.
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    value.set_sensitive(true);
    value
}

/// Caller headers with the computed `Authorization` laid over them.
fn default_headers(config: &ClientConfig, creds: &Credentials<'_>) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::with_capacity(config.headers.len() + 1);
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
        headers.insert(name, value);
    }

    // HeaderName is case-insensitive, so this overwrites "authorization" too.
    headers.insert(AUTHORIZATION, basic_auth_header(creds.user, creds.pass));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    struct NoopTransport;

    impl Transport for NoopTransport {
        async fn send(
            &self,
            _request: reqwest::Request,
        ) -> Result<http::Response<Bytes>, CardPointeError> {
            Ok(http::Response::new(Bytes::new()))
        }
    }

    fn client(config: ClientConfig) -> CardPointeClient<NoopTransport> {
        CardPointeClient::with_transport(config, NoopTransport).unwrap()
    }

    #[test]
    fn test_basic_auth_header() {
        let value = basic_auth_header("alice", "secret");
        assert_eq!(value.to_str().unwrap(), "Basic YWxpY2U6c2VjcmV0");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_base_url_and_auth() {
        let client = client(ClientConfig::new("alice", "secret", "example"));
        assert_eq!(
            client.base_url().as_str(),
            "https://example.cardconnect.com/cardconnect/rest/"
        );
        assert_eq!(
            client.default_headers()[AUTHORIZATION],
            "Basic YWxpY2U6c2VjcmV0"
        );
    }

    #[test]
    fn test_caller_authorization_is_overwritten() {
        let client = client(
            ClientConfig::new("alice", "secret", "example")
                .with_header("authorization", "Bearer nope")
                .with_header("X-Merchant", "496160873888"),
        );
        let headers = client.default_headers();
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers[AUTHORIZATION], "Basic YWxpY2U6c2VjcmV0");
        assert_eq!(headers["x-merchant"], "496160873888");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = CardPointeClient::with_transport(
            ClientConfig::new("alice", "secret", "example").with_header("bad header", "x"),
            NoopTransport,
        );
        assert!(matches!(result, Err(ConfigError::InvalidHeader(_))));
    }

    #[test]
    fn test_data_decode_registered() {
        let client = client(ClientConfig::new("alice", "secret", "example"));
        assert_eq!(client.handler_stack().names(), vec![DATA_DECODE]);
    }

    #[test]
    fn test_url_for_stays_under_rest_prefix() {
        let client = client(ClientConfig::new("alice", "secret", "example"));
        assert_eq!(
            client.url_for("inquire/123/496160873888").unwrap().as_str(),
            "https://example.cardconnect.com/cardconnect/rest/inquire/123/496160873888"
        );
        assert_eq!(
            client.url_for("/auth").unwrap().as_str(),
            "https://example.cardconnect.com/cardconnect/rest/auth"
        );
        assert!(client.url_for("../../admin").is_err());
        assert!(client.url_for("https://elsewhere.example.com/").is_err());
    }

    #[test]
    fn test_new_rejects_missing_site() {
        let cfg = ClientConfig {
            user: Some("alice".into()),
            pass: Some("secret".into()),
            ..Default::default()
        };
        assert!(matches!(
            CardPointeClient::new(cfg),
            Err(ConfigError::MissingRequired("site"))
        ));
    }
}
