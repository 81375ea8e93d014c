// Timing, topics, speed limits and command-line options
use std::time::Duration;

use clap::{Parser, ValueEnum};

// Control loop polling period
pub const TICK: Duration = Duration::from_millis(10);

// Speed Setting limits (PWM duty, 8-bit)
pub const MIN_SPEED: u8 = 100;
pub const MAX_SPEED: u8 = 255;
pub const SPEED_STEP: u8 = 25;
pub const DEFAULT_SPEED: u8 = 200;

// Serial link to the command sender (Bluetooth SPP shows up as a tty)
pub const DEFAULT_PORT: &str = "/dev/rfcomm0";
pub const DEFAULT_BAUDRATE: u32 = 115_200;

pub const DEVICE_NAME: &str = "ESP32_4WD_Robot";

// Title banner on the status display
pub const TITLE: &str = "4WD ROBOT";

// Zenoh topics
pub const TOPIC_CMD: &str = "skid/cmd"; // raw command bytes
pub const TOPIC_STATUS: &str = "skid/state/status"; // status snapshots
pub const TOPIC_BANKS: &str = "skid/rt/banks"; // bank actuation

/// Where command bytes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputKind {
    /// Serial port (Bluetooth SPP or USB UART)
    Serial,
    /// Local keyboard in raw mode
    Keyboard,
    /// Zenoh subscriber on the command topic
    Pubsub,
}

/// Where status updates are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayKind {
    Terminal,
    Headless,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "skid-drive-runtime", about = "Four-wheel skid-steer drive runtime")]
pub struct Args {
    /// Command source
    #[arg(long, value_enum, default_value_t = InputKind::Serial)]
    pub input: InputKind,

    /// Serial port used with `--input serial`
    #[arg(long, default_value = DEFAULT_PORT)]
    pub port: String,

    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    pub baud: u32,

    /// Status display
    #[arg(long, value_enum, default_value_t = DisplayKind::Terminal)]
    pub display: DisplayKind,

    /// Initial Speed Setting (clamped to 100..=255)
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    pub speed: u8,

    /// Publish status snapshots and bank actuation over zenoh
    #[arg(long)]
    pub publish: bool,

    /// Name shown in the startup banner
    #[arg(long, default_value = DEVICE_NAME)]
    pub device_name: String,
}

impl Args {
    /// Whether a zenoh session is needed at all
    pub fn needs_session(&self) -> bool {
        self.publish || self.input == InputKind::Pubsub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["skid-drive-runtime"]);
        assert_eq!(args.input, InputKind::Serial);
        assert_eq!(args.display, DisplayKind::Terminal);
        assert_eq!(args.speed, DEFAULT_SPEED);
        assert_eq!(args.baud, DEFAULT_BAUDRATE);
        assert!(!args.needs_session());
    }

    #[test]
    fn test_pubsub_input_needs_session() {
        let args = Args::parse_from(["skid-drive-runtime", "--input", "pubsub", "--display", "headless"]);
        assert_eq!(args.input, InputKind::Pubsub);
        assert_eq!(args.display, DisplayKind::Headless);
        assert!(args.needs_session());
    }

    #[test]
    fn test_speed_limits_are_step_aligned() {
        assert_eq!((DEFAULT_SPEED - MIN_SPEED) % SPEED_STEP, 0);
        assert!(MIN_SPEED < MAX_SPEED);
    }
}
