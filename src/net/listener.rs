//! TCP listener setup.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Report the bound address (useful when binding port 0)

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured address is not a socket address.
    #[error("Invalid bind address: {0}")]
    Address(#[source] std::net::AddrParseError),
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(ListenerError::Address)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(ListenerError::Bind)?;

    let local_addr = listener
        .local_addr()
        .map_err(ListenerError::Bind)?;

    tracing::info!(
        address = %local_addr,
        "Listener bound"
    );

    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bad_address() {
        let config = ListenerConfig {
            bind_address: "localhost".to_string(),
        };
        let err = bind(&config).await.unwrap_err();
        assert!(matches!(err, ListenerError::Address(_)));
        assert!(err.to_string().starts_with("Invalid bind address: "));
    }
}
