use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Host suffix every CardPointe site lives under.
pub const SITE_DOMAIN: &str = "cardconnect.com";

/// Path prefix of the Gateway REST API.
pub const REST_PATH: &str = "/cardconnect/rest/";

/// Client configuration.
///
/// `user`, `pass` and `site` are required. `base_url` exists only so that a
/// mapping carrying it can be rejected: the REST URL is always derived from
/// `site`. Everything below `headers` is handed to the transport untouched.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API username
    pub user: Option<String>,
    /// API password
    pub pass: Option<String>,
    /// Site name, the `<site>` in `https://<site>.cardconnect.com`
    pub site: Option<String>,
    /// Explicit base URL. Always rejected when set.
    #[serde(alias = "base_uri", alias = "base-url")]
    pub base_url: Option<String>,
    /// Extra headers sent with every request. `Authorization` is overwritten.
    pub headers: BTreeMap<String, String>,
    /// Total request timeout. Read from fractional seconds in a mapping.
    /// None or zero leaves the transport without one.
    #[serde(deserialize_with = "secs_f64")]
    pub timeout_secs: Option<Duration>,
    /// Connect timeout, same rules as `timeout_secs`.
    #[serde(deserialize_with = "secs_f64")]
    pub connect_timeout_secs: Option<Duration>,
    /// Proxy URL for all requests
    pub proxy: Option<String>,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Maximum redirects to follow (None = transport default)
    pub max_redirects: Option<usize>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "[REDACTED]"))
            .field("site", &self.site)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("proxy", &self.proxy.as_deref().map(redact_userinfo))
            .field("user_agent", &self.user_agent)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

fn secs_f64<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer)?
        .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
        .transpose()
}

/// Proxy URL with any `user:password@` part masked.
fn redact_userinfo(proxy: &str) -> String {
    match url::Url::parse(proxy) {
        Ok(mut url) => {
            if !url.username().is_empty() || url.password().is_some() {
                // Only fails for cannot-be-a-base URLs, which carry no userinfo.
                let _ = url.set_username("***");
                let _ = url.set_password(None);
            }
            url.to_string()
        }
        Err(_) => "[REDACTED]".to_string(),
    }
}

/// Validated credentials borrowed from a [`ClientConfig`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Credentials<'a> {
    pub user: &'a str,
    pub pass: &'a str,
    pub site: &'a str,
}

impl ClientConfig {
    /// Configuration with the three required options set.
    pub fn new(
        user: impl Into<String>,
        pass: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user.into()),
            pass: Some(pass.into()),
            site: Some(site.into()),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout);
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Check required options, in order: user, pass, site, then the
    /// base URL override.
    pub(crate) fn credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        let user = required(self.user.as_deref(), "user")?;
        let pass = required(self.pass.as_deref(), "pass")?;
        let site = required(self.site.as_deref(), "site")?;

        if self.base_url.as_deref().is_some_and(|u| !u.is_empty()) {
            return Err(ConfigError::BaseUrlOverride);
        }

        Ok(Credentials { user, pass, site })
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingRequired(name))
}

/// Build `https://<site>.cardconnect.com/cardconnect/rest/`.
pub fn rest_base_url(site: &str) -> Result<url::Url, ConfigError> {
    let raw = format!("https://{site}.{SITE_DOMAIN}{REST_PATH}");
    let url = url::Url::parse(&raw).map_err(|e| ConfigError::InvalidSite(format!("{site}: {e}")))?;

    // A site like "evil.com/x?" parses fine but points somewhere else.
    let expected_host = format!("{}.{SITE_DOMAIN}", site.to_ascii_lowercase());
    if url.host_str() != Some(expected_host.as_str()) || url.path() != REST_PATH {
        return Err(ConfigError::InvalidSite(site.to_string()));
    }
    Ok(url)
}
