//! Configuration for transport clients and servers.

use otelgen::Encoding;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default cap on a single frame, large enough for big metric batches.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Configuration for export clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Wire encoding of requests and acknowledgements.
    ///
    /// Default: `Encoding::Binary`
    pub encoding: Encoding,

    /// Maximum unacknowledged requests per connection (streaming only).
    ///
    /// A window of 1 is strict mode: every request waits for its
    /// acknowledgement before the next is sent.
    ///
    /// Default: 1
    pub ack_window: NonZeroUsize,

    /// Largest accepted frame in bytes.
    ///
    /// Default: 64 MiB
    pub max_frame_length: usize,

    /// Bound on each frame read or write. `None` waits indefinitely.
    ///
    /// Default: None
    pub io_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl ClientConfig {
    /// One request in flight at a time.
    pub fn strict() -> Self {
        Self {
            encoding: Encoding::Binary,
            ack_window: NonZeroUsize::MIN,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            io_timeout: None,
        }
    }

    /// Up to `window` requests in flight; a window of 0 is treated as 1.
    pub fn pipelined(window: usize) -> Self {
        Self::strict().with_ack_window(window)
    }

    /// Returns `true` if every request waits for its acknowledgement.
    pub fn is_strict(&self) -> bool {
        self.ack_window.get() == 1
    }

    /// Sets the wire encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the acknowledgement window; 0 is treated as 1.
    pub fn with_ack_window(mut self, window: usize) -> Self {
        self.ack_window = NonZeroUsize::new(window).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Sets the maximum frame length.
    pub fn with_max_frame_length(mut self, len: usize) -> Self {
        self.max_frame_length = len;
        self
    }

    /// Sets the I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }
}

/// Configuration for transport servers.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Wire encoding expected from clients.
    ///
    /// Default: `Encoding::Binary`
    pub encoding: Encoding,

    /// Largest accepted frame in bytes.
    ///
    /// Default: 64 MiB
    pub max_frame_length: usize,

    /// Bound on each frame read or write. `None` waits indefinitely.
    ///
    /// Default: None
    pub io_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::Binary,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            io_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Sets the wire encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the maximum frame length.
    pub fn with_max_frame_length(mut self, len: usize) -> Self {
        self.max_frame_length = len;
        self
    }

    /// Sets the I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_presets() {
        assert!(ClientConfig::default().is_strict());
        assert_eq!(ClientConfig::pipelined(8).ack_window.get(), 8);
        assert!(ClientConfig::pipelined(0).is_strict());

        let config = ClientConfig::strict()
            .with_encoding(Encoding::Json)
            .with_io_timeout(Duration::from_secs(1));
        assert_eq!(config.encoding, Encoding::Json);
        assert_eq!(config.io_timeout, Some(Duration::from_secs(1)));
    }
}
