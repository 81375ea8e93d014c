pub mod command;
pub mod config;
pub mod diagnostic;
pub mod display;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod transport;
