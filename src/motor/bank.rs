// Motor bank: the two motors on one side of the vehicle
//
// Both motors of a bank share one direction pair (IN1/IN2) and one PWM speed
// channel, so the bank is driven as a single unit.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction of a motor bank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    Stopped,
}

/// Left or right side of the vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Physical output levels of one bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankOutputs {
    pub in1: bool,
    pub in2: bool,
    pub duty: u8,
}

/// Serializable snapshot of one bank
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankState {
    pub direction: Direction,
    pub speed: u8,
}

/// One side's direction pair and speed channel
#[derive(Debug)]
pub struct MotorBank {
    side: Side,
    direction: Direction,
    speed: u8,
}

impl MotorBank {
    /// Create a stopped bank with zero duty
    pub(crate) fn new(side: Side) -> Self {
        Self {
            side,
            direction: Direction::Stopped,
            speed: 0,
        }
    }

    /// Set both direction outputs of the bank
    pub(crate) fn set_direction(&mut self, direction: Direction) {
        if self.direction != direction {
            debug!("{:?} bank direction: {:?} -> {:?}", self.side, self.direction, direction);
        }
        self.direction = direction;
    }

    /// Set the PWM magnitude. Range checks belong to the caller.
    pub(crate) fn set_speed(&mut self, speed: u8) {
        self.speed = speed;
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn state(&self) -> BankState {
        BankState {
            direction: self.direction,
            speed: self.speed,
        }
    }

    /// Pin levels as seen by the H-bridge
    ///
    /// Stopped de-asserts both direction pins; the duty value is left as is.
    pub fn outputs(&self) -> BankOutputs {
        let (in1, in2) = match self.direction {
            Direction::Forward => (true, false),
            Direction::Backward => (false, true),
            Direction::Stopped => (false, false),
        };
        BankOutputs {
            in1,
            in2,
            duty: self.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bank_is_stopped() {
        let bank = MotorBank::new(Side::Left);
        assert_eq!(bank.direction(), Direction::Stopped);
        assert_eq!(bank.speed(), 0);
    }

    #[test]
    fn test_direction_pins() {
        let mut bank = MotorBank::new(Side::Right);

        bank.set_direction(Direction::Forward);
        let out = bank.outputs();
        assert!(out.in1 && !out.in2);

        bank.set_direction(Direction::Backward);
        let out = bank.outputs();
        assert!(!out.in1 && out.in2);

        bank.set_direction(Direction::Stopped);
        let out = bank.outputs();
        assert!(!out.in1 && !out.in2, "Stopped must de-assert both pins");
    }

    #[test]
    fn test_speed_independent_of_direction() {
        let mut bank = MotorBank::new(Side::Left);
        bank.set_speed(180);
        bank.set_direction(Direction::Backward);
        assert_eq!(bank.outputs().duty, 180);
        bank.set_direction(Direction::Stopped);
        assert_eq!(bank.speed(), 180);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let mut bank = MotorBank::new(Side::Left);
        bank.set_direction(Direction::Forward);
        bank.set_speed(200);
        let json = serde_json::to_string(&bank.state()).unwrap();
        assert_eq!(json, r#"{"direction":"forward","speed":200}"#);
    }
}
