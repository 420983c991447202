//! Error type shared by the socket and the provider.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("invalid socket uri: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("unsupported uri scheme '{0}' (expected ws, wss, http or https)")]
    UnsupportedScheme(String),

    /// No connection handle is currently published.
    #[error("socket is not connected")]
    NotConnected,

    /// The connection was disconnected and no longer accepts packets.
    #[error("socket is closed")]
    Closed,

    /// The platform driver could not be started.
    #[error("cannot start socket driver: {0}")]
    Runtime(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An accessor was used outside of a `SocketProvider` subtree.
    #[error("no SocketProvider found above this component")]
    MissingProvider,
}

pub type Result<T> = std::result::Result<T, SocketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_convert() {
        let err: SocketError = url::Url::parse("not a uri").unwrap_err().into();
        assert!(matches!(err, SocketError::InvalidUri(_)));
        assert!(err.to_string().starts_with("invalid socket uri"));
    }

    #[test]
    fn scheme_error_names_the_scheme() {
        let err = SocketError::UnsupportedScheme("ftp".into());
        assert!(err.to_string().contains("'ftp'"));
    }
}
