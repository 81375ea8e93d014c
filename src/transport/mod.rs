// Command transports
//
// Every source hands over one command byte at a time. Sources that can talk
// back (the serial link) also carry the diagnostic text channel.

mod keyboard;
mod pubsub;
mod serial;

pub use keyboard::KeyboardSource;
pub use pubsub::{PubSubSource, TelemetryPublisher};
pub use serial::SerialSource;

/// Error types for command transports
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zenoh error: {0}")]
    PubSub(String),

    #[error("Command source closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Byte-at-a-time command input
pub trait CommandSource {
    /// Next command byte if one is waiting; never blocks
    fn poll_byte(&mut self) -> Result<Option<u8>>;

    /// Send a progress line back to the sender, if the transport can
    fn announce(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }

    /// Human-readable name for logs
    fn describe(&self) -> String;
}

impl<S: CommandSource + ?Sized> CommandSource for Box<S> {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        (**self).poll_byte()
    }

    fn announce(&mut self, line: &str) -> Result<()> {
        (**self).announce(line)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
