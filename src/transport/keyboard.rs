// Local keyboard as a command source (raw terminal mode)

use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::{info, warn};

use super::{CommandSource, Result, TransportError};

/// Key presses become command bytes; Esc or Ctrl+C closes the source
pub struct KeyboardSource {
    _raw: RawMode,
}

impl KeyboardSource {
    pub fn new() -> Result<Self> {
        let raw = RawMode::enable()?;
        info!("Keyboard input: WASD move, Q/E spin, X stop, +/- speed, T test, Esc quit");
        Ok(Self { _raw: raw })
    }
}

/// Map a key event to a command byte
fn key_to_byte(key: KeyEvent) -> Result<Option<u8>> {
    if key.kind != KeyEventKind::Press {
        return Ok(None);
    }
    match key.code {
        KeyCode::Esc => Err(TransportError::Closed),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Err(TransportError::Closed)
        }
        KeyCode::Char(c) if c.is_ascii() => Ok(Some(c as u8)),
        _ => Ok(None),
    }
}

impl CommandSource for KeyboardSource {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(byte) = key_to_byte(key)? {
                    return Ok(Some(byte));
                }
            }
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        "keyboard".to_string()
    }
}

/// Raw mode for as long as the guard lives
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
    }
}
