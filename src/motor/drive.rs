// Drive controller for the skid-steer base
//
// Owns both motor banks and the shared Speed Setting. All bank mutation goes
// through here, so the two banks always form one of the seven drive states.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::bank::{Direction, MotorBank, Side};
use crate::config::{DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
use crate::messages::BankActuation;

/// Motion state named by what the vehicle does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveState {
    #[default]
    Stopped,
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    SpinLeft,
    SpinRight,
}

impl DriveState {
    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            DriveState::Stopped => "STOP",
            DriveState::Forward => "FORWARD",
            DriveState::Backward => "BACKWARD",
            DriveState::TurnLeft => "TURN LEFT",
            DriveState::TurnRight => "TURN RIGHT",
            DriveState::SpinLeft => "SPIN LEFT",
            DriveState::SpinRight => "SPIN RIGHT",
        }
    }

    /// One-line description for the status region
    pub fn description(self) -> &'static str {
        match self {
            DriveState::Stopped => "Motors stopped",
            DriveState::Forward => "Moving ahead",
            DriveState::Backward => "Moving back",
            DriveState::TurnLeft => "Turning left",
            DriveState::TurnRight => "Turning right",
            DriveState::SpinLeft => "Rotating CCW",
            DriveState::SpinRight => "Rotating CW",
        }
    }

    /// Short name used in diagnostic announcements
    pub fn name(self) -> &'static str {
        match self {
            DriveState::Stopped => "Stop",
            DriveState::Forward => "Forward",
            DriveState::Backward => "Backward",
            DriveState::TurnLeft => "Turn Left",
            DriveState::TurnRight => "Turn Right",
            DriveState::SpinLeft => "Spin Left",
            DriveState::SpinRight => "Spin Right",
        }
    }

    pub fn is_moving(self) -> bool {
        self != DriveState::Stopped
    }
}

/// Clamp any integer into the Speed Setting range
pub fn clamp_speed(value: i32) -> u8 {
    value.clamp(MIN_SPEED as i32, MAX_SPEED as i32) as u8
}

/// Owner of both motor banks and the Speed Setting
#[derive(Debug)]
pub struct DriveController {
    left: MotorBank,
    right: MotorBank,
    speed: u8,
}

impl DriveController {
    /// Create a stopped controller at the default speed
    pub fn new() -> Self {
        Self::with_speed(DEFAULT_SPEED)
    }

    /// Create a stopped controller; `speed` is clamped into range
    pub fn with_speed(speed: u8) -> Self {
        Self {
            left: MotorBank::new(Side::Left),
            right: MotorBank::new(Side::Right),
            speed: clamp_speed(speed as i32),
        }
    }

    pub fn stop(&mut self) {
        self.apply(DriveState::Stopped);
    }

    pub fn forward(&mut self) {
        self.apply(DriveState::Forward);
    }

    pub fn backward(&mut self) {
        self.apply(DriveState::Backward);
    }

    pub fn turn_left(&mut self) {
        self.apply(DriveState::TurnLeft);
    }

    pub fn turn_right(&mut self) {
        self.apply(DriveState::TurnRight);
    }

    pub fn spin_left(&mut self) {
        self.apply(DriveState::SpinLeft);
    }

    pub fn spin_right(&mut self) {
        self.apply(DriveState::SpinRight);
    }

    /// Re-assert `state` on both banks from scratch
    ///
    /// Half speed for turns is taken from the current Speed Setting.
    pub fn apply(&mut self, state: DriveState) {
        let full = self.speed;
        let half = self.speed / 2;

        let (left, right) = match state {
            DriveState::Stopped => ((Direction::Stopped, 0), (Direction::Stopped, 0)),
            DriveState::Forward => ((Direction::Forward, full), (Direction::Forward, full)),
            DriveState::Backward => ((Direction::Backward, full), (Direction::Backward, full)),
            DriveState::TurnLeft => ((Direction::Forward, half), (Direction::Forward, full)),
            DriveState::TurnRight => ((Direction::Forward, full), (Direction::Forward, half)),
            DriveState::SpinLeft => ((Direction::Backward, full), (Direction::Forward, full)),
            DriveState::SpinRight => ((Direction::Forward, full), (Direction::Backward, full)),
        };

        self.left.set_direction(left.0);
        self.left.set_speed(left.1);
        self.right.set_direction(right.0);
        self.right.set_speed(right.1);

        debug!(
            "Drive {:?}: left={}@{}, right={}@{}",
            state,
            dir_char(left.0),
            left.1,
            dir_char(right.0),
            right.1
        );
    }

    /// Step the Speed Setting by `delta` and clamp it
    ///
    /// A moving vehicle picks up the new magnitude immediately. Returns the
    /// resulting Speed Setting.
    pub fn adjust_speed(&mut self, delta: i16) -> u8 {
        self.set_speed_clamped(self.speed as i32 + delta as i32)
    }

    /// Set the Speed Setting to an absolute value, clamped
    pub fn set_speed(&mut self, speed: u8) -> u8 {
        self.set_speed_clamped(speed as i32)
    }

    fn set_speed_clamped(&mut self, value: i32) -> u8 {
        let state = self.state();
        let previous = self.speed;
        self.speed = clamp_speed(value);

        if self.speed != previous {
            info!("Speed {} -> {}", previous, self.speed);
        }
        if state.is_moving() {
            self.apply(state);
        }
        self.speed
    }

    /// Current Speed Setting
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Drive state derived from what the banks are doing
    pub fn state(&self) -> DriveState {
        use Direction::*;

        match (self.left.direction(), self.right.direction()) {
            (Forward, Forward) => match self.left.speed().cmp(&self.right.speed()) {
                std::cmp::Ordering::Less => DriveState::TurnLeft,
                std::cmp::Ordering::Greater => DriveState::TurnRight,
                std::cmp::Ordering::Equal => DriveState::Forward,
            },
            (Backward, Backward) => DriveState::Backward,
            (Backward, Forward) => DriveState::SpinLeft,
            (Forward, Backward) => DriveState::SpinRight,
            // one side stopped never comes out of `apply`
            _ => DriveState::Stopped,
        }
    }

    pub fn left(&self) -> &MotorBank {
        &self.left
    }

    pub fn right(&self) -> &MotorBank {
        &self.right
    }

    /// Serializable view of both banks
    pub fn banks(&self) -> BankActuation {
        BankActuation {
            state: self.state(),
            speed_setting: self.speed,
            left: self.left.state(),
            right: self.right.state(),
        }
    }
}

impl Default for DriveController {
    fn default() -> Self {
        Self::new()
    }
}

fn dir_char(direction: Direction) -> char {
    match direction {
        Direction::Forward => 'F',
        Direction::Backward => 'B',
        Direction::Stopped => '-',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::BankState;

    fn bank(direction: Direction, speed: u8) -> BankState {
        BankState { direction, speed }
    }

    #[test]
    fn test_drive_table() {
        let cases = [
            (DriveState::Stopped, Direction::Stopped, 0, Direction::Stopped, 0),
            (DriveState::Forward, Direction::Forward, 200, Direction::Forward, 200),
            (DriveState::Backward, Direction::Backward, 200, Direction::Backward, 200),
            (DriveState::TurnLeft, Direction::Forward, 100, Direction::Forward, 200),
            (DriveState::TurnRight, Direction::Forward, 200, Direction::Forward, 100),
            (DriveState::SpinLeft, Direction::Backward, 200, Direction::Forward, 200),
            (DriveState::SpinRight, Direction::Forward, 200, Direction::Backward, 200),
        ];

        for (state, ld, ls, rd, rs) in cases {
            let mut drive = DriveController::with_speed(200);
            // start from a different state to check full re-assertion
            drive.spin_right();
            drive.apply(state);
            assert_eq!(drive.left().state(), bank(ld, ls), "left bank for {:?}", state);
            assert_eq!(drive.right().state(), bank(rd, rs), "right bank for {:?}", state);
            assert_eq!(drive.state(), state);
        }
    }

    #[test]
    fn test_named_operations_match_apply() {
        let mut drive = DriveController::new();
        drive.forward();
        assert_eq!(drive.state(), DriveState::Forward);
        drive.backward();
        assert_eq!(drive.state(), DriveState::Backward);
        drive.turn_left();
        assert_eq!(drive.state(), DriveState::TurnLeft);
        drive.turn_right();
        assert_eq!(drive.state(), DriveState::TurnRight);
        drive.spin_left();
        assert_eq!(drive.state(), DriveState::SpinLeft);
        drive.spin_right();
        assert_eq!(drive.state(), DriveState::SpinRight);
        drive.stop();
        assert_eq!(drive.state(), DriveState::Stopped);
    }

    #[test]
    fn test_operations_are_idempotent() {
        let mut drive = DriveController::new();
        drive.turn_right();
        let first = drive.banks();
        drive.turn_right();
        assert_eq!(drive.banks(), first);
    }

    #[test]
    fn test_speed_clamps_at_both_ends() {
        let mut drive = DriveController::with_speed(240);
        assert_eq!(drive.adjust_speed(25), 255);
        for _ in 0..5 {
            assert_eq!(drive.adjust_speed(25), 255);
        }

        let mut drive = DriveController::with_speed(MIN_SPEED);
        for _ in 0..5 {
            assert_eq!(drive.adjust_speed(-25), MIN_SPEED);
        }
    }

    #[test]
    fn test_with_speed_clamps_initial_value() {
        assert_eq!(DriveController::with_speed(0).speed(), MIN_SPEED);
        assert_eq!(DriveController::with_speed(255).speed(), 255);
    }

    #[test]
    fn test_speed_change_reapplies_while_moving() {
        let mut drive = DriveController::with_speed(200);
        drive.forward();
        drive.adjust_speed(25);
        assert_eq!(drive.left().state(), bank(Direction::Forward, 225));
        assert_eq!(drive.right().state(), bank(Direction::Forward, 225));
        assert_eq!(drive.state(), DriveState::Forward);
    }

    #[test]
    fn test_turn_half_speed_tracks_current_setting() {
        let mut drive = DriveController::with_speed(200);
        drive.turn_left();
        drive.adjust_speed(-25);
        // 175 / 2 = 87, not the stale 100
        assert_eq!(drive.left().speed(), 87);
        assert_eq!(drive.right().speed(), 175);
        assert_eq!(drive.state(), DriveState::TurnLeft);

        drive.set_speed(255);
        drive.turn_right();
        assert_eq!(drive.left().speed(), 255);
        assert_eq!(drive.right().speed(), 127);
    }

    #[test]
    fn test_speed_change_while_stopped_keeps_banks_idle() {
        let mut drive = DriveController::with_speed(200);
        drive.adjust_speed(25);
        assert_eq!(drive.state(), DriveState::Stopped);
        assert_eq!(drive.left().state(), bank(Direction::Stopped, 0));
        assert_eq!(drive.speed(), 225);
    }

    #[test]
    fn test_labels_are_unique() {
        use DriveState::*;
        let all = [Stopped, Forward, Backward, TurnLeft, TurnRight, SpinLeft, SpinRight];
        let labels: std::collections::HashSet<_> = all.iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), all.len());
    }
}
