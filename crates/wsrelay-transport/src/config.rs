//! Connection configuration

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use url::Url;
use wsrelay_proto::DEFAULT_MAX_MESSAGE_SIZE;

use crate::error::{TransportError, TransportResult};

/// Client connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Target URL (ws:// or wss://)
    pub url: String,

    /// Maximum size of a reassembled inbound message
    pub max_message_size: usize,

    /// Maximum size of a single inbound frame
    pub max_frame_size: usize,

    /// Set TCP_NODELAY on the underlying socket
    pub disable_nagle: bool,
}

impl ConnectionConfig {
    /// Create a configuration with the default 10MB limits
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_frame_size: DEFAULT_MAX_MESSAGE_SIZE,
            disable_nagle: true,
        }
    }

    /// Set both the message and the frame limit
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self.max_frame_size = size;
        self
    }

    pub fn with_nagle(mut self, enabled: bool) -> Self {
        self.disable_nagle = !enabled;
        self
    }

    /// Validate the configuration and return the parsed target URL
    pub fn validate(&self) -> TransportResult<Url> {
        let url = Url::parse(&self.url).map_err(|e| TransportError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(TransportError::InvalidUrl {
                    url: self.url.clone(),
                    reason: format!("unsupported scheme '{}', expected ws or wss", other),
                })
            }
        }

        if self.max_message_size == 0 || self.max_frame_size == 0 {
            return Err(TransportError::ConfigurationError(
                "Message and frame size limits must be non-zero".to_string(),
            ));
        }

        if self.max_frame_size > self.max_message_size {
            return Err(TransportError::ConfigurationError(format!(
                "Frame limit ({}) exceeds message limit ({})",
                self.max_frame_size, self.max_message_size
            )));
        }

        Ok(url)
    }

    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.max_message_size);
        config.max_frame_size = Some(self.max_frame_size);
        config
    }
}

// Initialize rustls crypto provider
static CRYPTO_PROVIDER_INIT: std::sync::Once = std::sync::Once::new();

pub(crate) fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("Rustls crypto provider already installed");
        }
    });
}
