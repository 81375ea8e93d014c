// Message types passed between the core, the display and telemetry

use serde::{Deserialize, Serialize};

use crate::motor::{BankState, DriveState};

/// What the status display shows after a recognized command
///
/// Transient: rendered once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub command_label: String,
    pub status_text: String,
    pub speed: u8,
}

impl StatusSnapshot {
    pub fn new(command_label: impl Into<String>, status_text: impl Into<String>, speed: u8) -> Self {
        Self {
            command_label: command_label.into(),
            status_text: status_text.into(),
            speed,
        }
    }

    /// Snapshot describing a drive state at the given speed
    pub fn for_state(state: DriveState, speed: u8) -> Self {
        Self::new(state.label(), state.description(), speed)
    }

    /// Idle display shown at startup and after the diagnostic
    pub fn ready(speed: u8) -> Self {
        Self::new("READY", "Waiting for command", speed)
    }
}

/// Bank outputs published for whatever drives the real motors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankActuation {
    pub state: DriveState,
    pub speed_setting: u8,
    pub left: BankState,
    pub right: BankState,
}

/// Something the core wants shown or said after a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Redraw the status display
    Status(StatusSnapshot),
    /// Human-readable progress line for the diagnostic text channel
    Line(String),
}
