//! WebSocket connection limits.

use std::time::Duration;
use tungstenite::protocol::WebSocketConfig as ProtocolConfig;

/// Per-connection limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketConfig {
    /// Largest accepted message in bytes (default: 64 MB).
    pub max_message_size: usize,
    /// Largest accepted frame in bytes (default: 16 MB).
    pub max_frame_size: usize,
    /// Close the connection after this long without a frame. `None` keeps
    /// idle connections open (default: 5 minutes).
    pub idle_timeout: Option<Duration>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 64 * 1024 * 1024,
            max_frame_size: 16 * 1024 * 1024,
            idle_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl WebSocketConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum message size.
    #[must_use]
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Returns the tungstenite protocol configuration.
    #[must_use]
    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_frame_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebSocketConfig::default();
        assert_eq!(config.max_message_size, 64 * 1024 * 1024);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_protocol_config_carries_limits() {
        let config = WebSocketConfig::new().max_message_size(1024).max_frame_size(512);
        let protocol = config.protocol_config();
        assert_eq!(protocol.max_message_size, Some(1024));
        assert_eq!(protocol.max_frame_size, Some(512));
    }
}
