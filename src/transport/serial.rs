// Serial command link (Bluetooth SPP or USB UART)

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use super::{CommandSource, Result, TransportError};

/// Read timeout; reads only happen once bytes are known to be waiting
const READ_TIMEOUT_MS: u64 = 5;

/// Serial port delivering one command byte per character
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialSource {
    /// Open the port at the given baud rate
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self> {
        info!("Opening command link on {} @ {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl CommandSource for SerialSource {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => {
                debug!("Serial byte 0x{:02X}", byte[0]);
                Ok(Some(byte[0]))
            }
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(TransportError::Closed),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn announce(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\r\n")?;
        self.port.flush()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("serial {}", self.name)
    }
}
