// Command interpreter: one byte in, one drive action out
//
// Dispatch is table-driven. Letters are matched case-insensitively; `+` and
// `-` are literal.

use tracing::{info, trace, warn};

use crate::config::SPEED_STEP;
use crate::messages::StatusSnapshot;
use crate::motor::{DriveController, DriveState};

/// What a command byte asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(DriveState),
    AdjustSpeed(i16),
    RunDiagnostic,
    Unknown(u8),
}

/// Result of applying one command byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Command applied; redraw the display with this snapshot
    Applied(StatusSnapshot),
    /// The diagnostic sequence was requested
    StartDiagnostic,
    /// Nothing changed
    Ignored,
}

const STEP: i16 = SPEED_STEP as i16;

/// Byte -> action; letters are stored upper-case
static COMMANDS: [(u8, Action); 10] = [
    (b'W', Action::Move(DriveState::Forward)),
    (b'S', Action::Move(DriveState::Backward)),
    (b'A', Action::Move(DriveState::TurnLeft)),
    (b'D', Action::Move(DriveState::TurnRight)),
    (b'Q', Action::Move(DriveState::SpinLeft)),
    (b'E', Action::Move(DriveState::SpinRight)),
    (b'X', Action::Move(DriveState::Stopped)),
    (b'+', Action::AdjustSpeed(STEP)),
    (b'-', Action::AdjustSpeed(-STEP)),
    (b'T', Action::RunDiagnostic),
];

impl Action {
    /// Map a received byte to an action
    pub fn from_byte(byte: u8) -> Self {
        let code = byte.to_ascii_uppercase();
        COMMANDS
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Action::Unknown(byte), |(_, action)| *action)
    }

    /// Display label and status text for commands that redraw the display
    ///
    /// Motion commands take both from their drive state.
    pub fn describe(&self) -> Option<(&'static str, &'static str)> {
        match *self {
            Action::Move(state) => Some((state.label(), state.description())),
            Action::AdjustSpeed(delta) if delta > 0 => Some(("SPEED UP", "Speed increased")),
            Action::AdjustSpeed(_) => Some(("SPEED DOWN", "Speed decreased")),
            Action::RunDiagnostic | Action::Unknown(_) => None,
        }
    }
}

/// Apply a command byte to the drive controller
///
/// Every recognized command except the diagnostic yields exactly one
/// snapshot. Unknown bytes leave the controller untouched.
pub fn interpret(byte: u8, drive: &mut DriveController) -> Outcome {
    let action = Action::from_byte(byte);

    match action {
        Action::Move(state) => drive.apply(state),
        Action::AdjustSpeed(delta) => {
            drive.adjust_speed(delta);
        }
        Action::RunDiagnostic => {
            info!("Command {}: diagnostic requested", byte as char);
            return Outcome::StartDiagnostic;
        }
        Action::Unknown(_) => {
            if byte == b'\r' || byte == b'\n' {
                trace!("Ignoring line terminator 0x{:02X}", byte);
            } else {
                warn!("Unknown command: {:?} (0x{:02X})", byte as char, byte);
            }
            return Outcome::Ignored;
        }
    }

    let Some((label, status)) = action.describe() else {
        return Outcome::Ignored;
    };
    info!("Command {}: {} (speed {})", byte as char, label, drive.speed());
    Outcome::Applied(StatusSnapshot::new(label, status, drive.speed()))
}
