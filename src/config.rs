//! Connection configuration.

use std::time::Duration;

use url::Url;

use crate::error::{Result, SocketError};

/// Environment variable holding the endpoint used by [`ConnectOptions::from_env`].
pub const URI_ENV: &str = "SOCKET_PROVIDER_URI";
/// Environment variable overriding the connect timeout, in milliseconds.
pub const CONNECT_TIMEOUT_ENV: &str = "SOCKET_PROVIDER_CONNECT_TIMEOUT_MS";

pub const DEFAULT_URI: &str = "ws://localhost:3000/socket";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how a [`Socket`](crate::socket::Socket) connects.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOptions {
    url: Url,
    query: Vec<(String, String)>,
    connect_timeout: Duration,
}

impl ConnectOptions {
    /// Parse a target address.
    ///
    /// `http://` and `https://` addresses are rewritten to `ws://` and `wss://`
    /// so the same base URL used for REST calls can be handed over as-is.
    pub fn parse(uri: &str) -> Result<Self> {
        let mut url = Url::parse(uri)?;
        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(SocketError::UnsupportedScheme(other.to_string())),
        };
        if url.scheme() != scheme {
            url.set_scheme(scheme)
                .map_err(|_| SocketError::UnsupportedScheme(url.scheme().to_string()))?;
        }

        Ok(Self {
            url,
            query: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Read the endpoint from the environment.
    ///
    /// Environment variables:
    /// - `SOCKET_PROVIDER_URI`: target address (default: "ws://localhost:3000/socket")
    /// - `SOCKET_PROVIDER_CONNECT_TIMEOUT_MS`: connect timeout (default: 5000)
    pub fn from_env() -> Result<Self> {
        let uri = std::env::var(URI_ENV).unwrap_or_else(|_| DEFAULT_URI.to_string());
        let mut options = Self::parse(&uri)?;

        if let Some(ms) = std::env::var(CONNECT_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            options.connect_timeout = Duration::from_millis(ms);
        }

        Ok(options)
    }

    /// Append a query parameter to the endpoint.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// The URL the driver dials, query parameters included.
    pub fn endpoint(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_schemes_become_websocket_schemes() {
        let plain = ConnectOptions::parse("http://localhost:8080/ws").unwrap();
        assert_eq!(plain.endpoint().as_str(), "ws://localhost:8080/ws");

        let secure = ConnectOptions::parse("https://example.com/ws").unwrap();
        assert_eq!(secure.endpoint().scheme(), "wss");
    }

    #[test]
    fn websocket_schemes_are_kept() {
        let options = ConnectOptions::parse("wss://example.com/socket").unwrap();
        assert_eq!(options.endpoint().as_str(), "wss://example.com/socket");
    }

    #[test]
    fn other_schemes_are_rejected() {
        let err = ConnectOptions::parse("ftp://example.com").unwrap_err();
        assert!(matches!(err, SocketError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = ConnectOptions::parse("::not a uri::").unwrap_err();
        assert!(matches!(err, SocketError::InvalidUri(_)));
    }

    #[test]
    fn query_is_appended_and_encoded() {
        let options = ConnectOptions::parse("ws://localhost:3000/socket?v=1")
            .unwrap()
            .with_query("token", "a b&c");
        assert_eq!(
            options.endpoint().as_str(),
            "ws://localhost:3000/socket?v=1&token=a+b%26c"
        );
    }

    #[test]
    fn timeout_defaults_and_overrides() {
        let options = ConnectOptions::parse(DEFAULT_URI).unwrap();
        assert_eq!(options.connect_timeout(), DEFAULT_CONNECT_TIMEOUT);

        let options = options.with_connect_timeout(Duration::from_millis(250));
        assert_eq!(options.connect_timeout(), Duration::from_millis(250));
    }
}
