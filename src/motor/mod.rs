// Motor control module for the four-wheel skid-steer base
//
// Provides:
// - Motor bank model (direction pair + PWM channel per side)
// - Drive controller composing both banks into named motion states

mod bank;
mod drive;

pub use bank::{BankOutputs, BankState, Direction, MotorBank, Side};
pub use drive::{DriveController, DriveState, clamp_speed};
