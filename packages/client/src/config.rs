//! Client configuration.

use std::time::Duration;

/// Default bound on consecutive reconnect attempts
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default base interval for reconnect backoff
pub const DEFAULT_RECONNECT_BASE_INTERVAL: Duration = Duration::from_secs(5);

/// Default window for a connection attempt to leave `Connecting`
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the realtime client.
///
/// The WebSocket base URL is derived from the REST base URL by scheme
/// substitution unless configured independently. The retry knobs default
/// to the production constants; tests shrink them.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend (e.g. `https://api.ichiba.example`)
    pub rest_base_url: String,
    /// Base URL of the WebSocket backend (e.g. `wss://api.ichiba.example`)
    pub ws_base_url: String,
    /// Kill switch: when false, `open` refuses to connect (local
    /// development without a realtime backend)
    pub realtime_enabled: bool,
    /// Bound on consecutive reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Base interval for exponential reconnect backoff
    pub reconnect_base_interval: Duration,
    /// Window for a connection attempt to complete its transport handshake
    pub handshake_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration from the REST base URL, deriving the
    /// WebSocket base URL by scheme substitution.
    pub fn new(rest_base_url: impl Into<String>) -> Self {
        let rest_base_url = rest_base_url.into();
        let ws_base_url = derive_ws_base_url(&rest_base_url);
        Self {
            rest_base_url,
            ws_base_url,
            realtime_enabled: true,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_interval: DEFAULT_RECONNECT_BASE_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Override the derived WebSocket base URL
    pub fn with_ws_base_url(mut self, ws_base_url: impl Into<String>) -> Self {
        self.ws_base_url = ws_base_url.into();
        self
    }

    /// Disable the realtime connection entirely
    pub fn without_realtime(mut self) -> Self {
        self.realtime_enabled = false;
        self
    }

    /// Override the reconnect bound and base interval (mainly for tests)
    pub fn with_reconnect_policy(mut self, max_attempts: u32, base_interval: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_base_interval = base_interval;
        self
    }

    /// Override the handshake window
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// Derive the WebSocket base URL from the REST base URL.
///
/// `http` becomes `ws`, `https` becomes `wss`; a URL already using a
/// WebSocket scheme passes through unchanged.
pub fn derive_ws_base_url(rest_base_url: &str) -> String {
    if let Some(rest) = rest_base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rest_base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rest_base_url.to_string()
    }
}
