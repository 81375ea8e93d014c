// Keyboard teleop over the serial link: W/A/S/D move, Q/E spin, X stop,
// +/- speed, T self-test, H help, Esc quit
//
// Usage: cargo run --example teleop -- [port]
// Without a port the available serial ports are listed and one that looks
// like the robot's Bluetooth link is picked.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serialport::{SerialPort, SerialPortType};
use skid_drive_runtime::config::{DEFAULT_BAUDRATE, DEVICE_NAME};
use std::io::{self, Read, Write};
use std::thread::sleep;
use std::time::Duration;
use tracing::{info, warn};

const VALID_COMMANDS: [char; 10] = ['W', 'A', 'S', 'D', 'Q', 'E', 'X', '+', '-', 'T'];
const LINK_SETTLE: Duration = Duration::from_secs(2);
const RESPONSE_WAIT: Duration = Duration::from_millis(50);
const POLL: Duration = Duration::from_millis(10);

type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;

// Raw mode needs explicit carriage returns
fn say(line: &str) {
    print!("{}\r\n", line);
    if let Err(e) = io::stdout().flush() {
        warn!("Could not flush stdout: {}", e);
    }
}

fn describe(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .clone()
            .or_else(|| usb.manufacturer.clone())
            .unwrap_or_else(|| "USB serial".to_string()),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI serial".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

fn looks_like_robot(port: &serialport::SerialPortInfo) -> bool {
    let desc = describe(port).to_lowercase();
    desc.contains("bluetooth") || desc.contains("esp32") || port.port_name.contains("rfcomm")
}

/// Pick the robot's port, asking the user when nothing obvious shows up
fn find_port() -> BoxResult<Option<String>> {
    println!("Searching for {}...", DEVICE_NAME);
    let ports = serialport::available_ports()?;

    for port in &ports {
        println!("  Found: {} - {}", port.port_name, describe(port));
        if looks_like_robot(port) {
            return Ok(Some(port.port_name.clone()));
        }
    }

    if ports.is_empty() {
        return Ok(None);
    }

    println!();
    println!("Available ports:");
    for (i, port) in ports.iter().enumerate() {
        println!("  [{}] {} - {}", i, port.port_name, describe(port));
    }

    print!("\nEnter port number (or full port name like /dev/ttyUSB0): ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let choice = input.trim();

    if choice.is_empty() {
        return Ok(None);
    }
    match choice.parse::<usize>() {
        Ok(idx) if idx < ports.len() => Ok(Some(ports[idx].port_name.clone())),
        _ => Ok(Some(choice.to_string())),
    }
}

fn print_controls() {
    let rule = "=".repeat(50);
    say("");
    say(&rule);
    say("4WD ROBOT CONTROL");
    say(&rule);
    say("");
    say("Movement Controls:");
    say("  W - Forward");
    say("  S - Backward");
    say("  A - Turn Left");
    say("  D - Turn Right");
    say("  Q - Spin Left (counter-clockwise)");
    say("  E - Spin Right (clockwise)");
    say("  X - STOP");
    say("");
    say("Speed Controls:");
    say("  + - Increase Speed");
    say("  - - Decrease Speed");
    say("");
    say("Other:");
    say("  T - Run Full Test Sequence");
    say("  H - Show this help");
    say("  ESC - Exit");
    say(&rule);
    say("");
    say("Ready! Press keys to control the robot...");
    say("(Commands are sent immediately, no Enter needed)");
    say("");
}

/// Send one command byte and print the robot's reply line, if any
/// Send a bare stop; a failure is logged, there is nothing else left to do
fn send_stop(port: &mut impl Write) -> bool {
    match port.write_all(b"X").and_then(|_| port.flush()) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not send stop command: {}", e);
            false
        }
    }
}

fn send_command(port: &mut Box<dyn SerialPort>, cmd: char) -> BoxResult<()> {
    let mut buf = [0u8; 4];
    port.write_all(cmd.encode_utf8(&mut buf).as_bytes())?;
    port.flush()?;
    say(&format!("Sent: {}", cmd));

    sleep(RESPONSE_WAIT);
    let waiting = port.bytes_to_read()? as usize;
    if waiting > 0 {
        let mut reply = vec![0u8; waiting];
        let n = port.read(&mut reply)?;
        let text = String::from_utf8_lossy(&reply[..n]);
        if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
            say(&format!("Robot: {}", line));
        }
    }
    Ok(())
}

/// What a key press means to the teleop loop
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Send(char),
    Help,
    Quit,
    Ignore,
}

fn classify(key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char(c) => {
            let c = c.to_ascii_uppercase();
            if VALID_COMMANDS.contains(&c) {
                KeyAction::Send(c)
            } else if c == 'H' {
                KeyAction::Help
            } else {
                KeyAction::Ignore
            }
        }
        _ => KeyAction::Ignore,
    }
}

fn run_teleop(port: &mut Box<dyn SerialPort>) -> BoxResult<()> {
    print_controls();
    let mut last_key: Option<char> = None;

    loop {
        if !event::poll(POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match classify(key) {
            KeyAction::Quit => {
                say("");
                say("Exiting...");
                send_command(port, 'X')?;
                return Ok(());
            }
            KeyAction::Help => print_controls(),
            // holding a key repeats it; only send on change
            KeyAction::Send(cmd) if last_key != Some(cmd) => {
                last_key = Some(cmd);
                send_command(port, cmd)?;
            }
            KeyAction::Send(_) | KeyAction::Ignore => {}
        }
    }
}

fn main() -> BoxResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .init();

    println!("{}", "=".repeat(50));
    println!("4WD Robot - PC Controller");
    println!("{}", "=".repeat(50));

    let port_name = match std::env::args().nth(1) {
        Some(name) => Some(name),
        None => find_port()?,
    };

    let Some(port_name) = port_name else {
        println!("Error: No port specified");
        return Ok(());
    };

    println!();
    println!("Connecting to {}...", port_name);
    let mut port = match serialport::new(&port_name, DEFAULT_BAUDRATE)
        .timeout(Duration::from_secs(1))
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            println!("Error connecting: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("1. Make sure the robot is powered on");
            println!("2. Pair with '{}' in Bluetooth settings first", DEVICE_NAME);
            println!("3. Check that the correct port is selected");
            println!("4. On Linux, you may need: sudo usermod -a -G dialout $USER");
            return Err(e.into());
        }
    };
    sleep(LINK_SETTLE);
    info!("Connected to {} on {}", DEVICE_NAME, port_name);

    enable_raw_mode()?;
    let result = run_teleop(&mut port);
    disable_raw_mode()?;

    if let Err(e) = &result {
        warn!("Teleop stopped on error: {}", e);
        // never leave the robot driving
        send_stop(&mut port);
    }
    println!("Disconnected from robot");
    println!("Goodbye!");

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    struct BrokenLink;

    impl Write for BrokenLink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "link down"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_stop_writes_x() {
        let mut sent = Vec::new();
        assert!(send_stop(&mut sent));
        assert_eq!(sent, b"X");
    }

    #[test]
    fn test_send_stop_reports_failure() {
        assert!(!send_stop(&mut BrokenLink));
    }

    #[test]
    fn test_keys_are_uppercased() {
        assert_eq!(classify(key(KeyCode::Char('w'))), KeyAction::Send('W'));
        assert_eq!(classify(key(KeyCode::Char('+'))), KeyAction::Send('+'));
        assert_eq!(classify(key(KeyCode::Char('t'))), KeyAction::Send('T'));
    }

    #[test]
    fn test_help_quit_ignore() {
        assert_eq!(classify(key(KeyCode::Char('h'))), KeyAction::Help);
        assert_eq!(classify(key(KeyCode::Esc)), KeyAction::Quit);
        assert_eq!(
            classify(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(classify(key(KeyCode::Char('z'))), KeyAction::Ignore);
        assert_eq!(classify(key(KeyCode::Enter)), KeyAction::Ignore);
    }
}
