// Polling control loop
//
// One task owns the drive controller. Every tick it either advances the
// running diagnostic or drains whatever command bytes are waiting. While the
// diagnostic runs the transport is not read, so commands sent meanwhile stay
// queued and are handled once it has finished.

use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

// local imports
use crate::command::{self, Outcome};
use crate::config::{Args, DisplayKind, InputKind, TICK, TITLE, TOPIC_BANKS, TOPIC_CMD, TOPIC_STATUS};
use crate::diagnostic::{DiagnosticSequencer, Progress};
use crate::display::{DisplayError, DisplaySurface, HeadlessDisplay, StatusReporter, TerminalDisplay};
use crate::messages::{BankActuation, Notice, StatusSnapshot};
use crate::motor::{DriveController, DriveState};
use crate::transport::{
    CommandSource, KeyboardSource, PubSubSource, SerialSource, TelemetryPublisher, TransportError,
};

/// Error types for the runtime
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error("Zenoh error: {0}")]
    PubSub(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// What one tick produced, for telemetry
#[derive(Debug, Default)]
pub struct TickReport {
    pub notices: Vec<Notice>,
    /// New bank outputs, if they changed during the tick
    pub banks: Option<BankActuation>,
}

pub struct Runtime<S, D> {
    drive: DriveController,
    reporter: StatusReporter<D>,
    source: S,
    diagnostic: Option<DiagnosticSequencer>,
}

impl<S: CommandSource, D: DisplaySurface> Runtime<S, D> {
    pub fn new(drive: DriveController, source: S, display: D) -> Self {
        Self {
            drive,
            reporter: StatusReporter::new(display),
            source,
            diagnostic: None,
        }
    }

    /// Draw the title and the idle display
    pub fn start(&mut self, title: &str) -> Result<()> {
        info!("Reading commands from {}", self.source.describe());
        self.reporter.draw_title(title)?;
        self.reporter.show_ready(self.drive.speed())?;
        Ok(())
    }

    /// Run one loop iteration, `elapsed` after the previous one
    pub fn tick(&mut self, elapsed: Duration) -> Result<TickReport> {
        let before = self.drive.banks();
        let mut notices = Vec::new();

        let polled = match self.diagnostic.as_mut() {
            Some(seq) => {
                if seq.advance(elapsed, &mut self.drive, &mut notices) == Progress::Finished {
                    info!("Diagnostic sequence finished");
                    self.diagnostic = None;
                }
                Ok(())
            }
            None => self.drain(&mut notices),
        };

        // show what did happen before reporting a transport failure
        self.emit(&notices)?;
        polled?;

        let after = self.drive.banks();
        Ok(TickReport {
            notices,
            banks: (after != before).then_some(after),
        })
    }

    /// Interpret waiting bytes until the source runs dry or a diagnostic starts
    fn drain(&mut self, notices: &mut Vec<Notice>) -> Result<()> {
        while let Some(byte) = self.source.poll_byte()? {
            match command::interpret(byte, &mut self.drive) {
                Outcome::Applied(snapshot) => notices.push(Notice::Status(snapshot)),
                Outcome::StartDiagnostic => {
                    let mut seq = DiagnosticSequencer::start(&self.drive);
                    info!(
                        "Diagnostic running for {:.1}s; commands wait until it ends",
                        seq.total_duration().as_secs_f32()
                    );
                    seq.advance(Duration::ZERO, &mut self.drive, notices);
                    self.diagnostic = Some(seq);
                    break;
                }
                Outcome::Ignored => {}
            }
        }
        Ok(())
    }

    fn emit(&mut self, notices: &[Notice]) -> Result<()> {
        for notice in notices {
            match notice {
                Notice::Status(snapshot) => self.reporter.render(snapshot)?,
                Notice::Line(line) => {
                    // the text channel is optional; a failed echo is not fatal
                    if let Err(e) = self.source.announce(line) {
                        warn!("Could not announce {:?}: {}", line, e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Stop both banks and show it
    ///
    /// An interrupted diagnostic still puts its saved Speed Setting back.
    pub fn shutdown(&mut self) -> Result<StatusSnapshot> {
        info!("Stopping motors");
        self.drive.stop();
        if let Some(seq) = self.diagnostic.take() {
            warn!("Diagnostic interrupted; restoring speed {}", seq.saved_speed());
            self.drive.set_speed(seq.saved_speed());
        }
        let snapshot = StatusSnapshot::for_state(DriveState::Stopped, self.drive.speed());
        self.reporter.render(&snapshot)?;
        Ok(snapshot)
    }

    pub fn drive(&self) -> &DriveController {
        &self.drive
    }

    pub fn reporter(&self) -> &StatusReporter<D> {
        &self.reporter
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn diagnostic_running(&self) -> bool {
        self.diagnostic.is_some()
    }
}

async fn publish(publisher: Option<&TelemetryPublisher>, report: &TickReport) -> Result<()> {
    let Some(publisher) = publisher else {
        return Ok(());
    };
    for notice in &report.notices {
        if let Notice::Status(snapshot) = notice {
            publisher.publish_status(snapshot).await?;
        }
    }
    if let Some(banks) = &report.banks {
        publisher.publish_banks(banks).await?;
    }
    Ok(())
}

fn zenoh_err(e: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::PubSub(e.to_string())
}

pub async fn run(args: Args) -> Result<()> {
    let session = if args.needs_session() {
        info!("Opening Zenoh session...");
        Some(zenoh::open(zenoh::Config::default()).await.map_err(zenoh_err)?)
    } else {
        None
    };

    let publisher = match (&session, args.publish) {
        (Some(session), true) => {
            Some(TelemetryPublisher::declare(session, TOPIC_STATUS, TOPIC_BANKS).await?)
        }
        _ => None,
    };

    // display first so raw mode is entered inside the alternate screen
    let display: Box<dyn DisplaySurface> = match args.display {
        DisplayKind::Terminal => Box::new(TerminalDisplay::open()?),
        DisplayKind::Headless => Box::new(HeadlessDisplay::new()),
    };

    let source: Box<dyn CommandSource> = match (args.input, &session) {
        (InputKind::Serial, _) => Box::new(SerialSource::open(&args.port, args.baud)?),
        (InputKind::Keyboard, _) => Box::new(KeyboardSource::new()?),
        (InputKind::Pubsub, Some(session)) => Box::new(PubSubSource::declare(session, TOPIC_CMD).await?),
        (InputKind::Pubsub, None) => return Err(zenoh_err("no session for pubsub input")),
    };

    let drive = DriveController::with_speed(args.speed);
    let mut runtime = Runtime::new(drive, source, display);
    runtime.start(TITLE)?;

    info!(
        "{} ready: speed {}, {}ms tick",
        args.device_name,
        runtime.drive().speed(),
        TICK.as_millis()
    );

    let mut tick = interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last = Instant::now();

    let outcome = loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break Ok(());
            }
        }

        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        match runtime.tick(elapsed) {
            Ok(report) => {
                if let Err(e) = publish(publisher.as_ref(), &report).await {
                    warn!("Telemetry publish failed: {}", e);
                }
            }
            Err(RuntimeError::Transport(TransportError::Closed)) => {
                info!("Command source closed");
                break Ok(());
            }
            Err(e) => break Err(e),
        }
    };

    // Always leave the motors stopped
    match runtime.shutdown() {
        Ok(snapshot) => {
            let report = TickReport {
                notices: vec![Notice::Status(snapshot)],
                banks: Some(runtime.drive().banks()),
            };
            if let Err(e) = publish(publisher.as_ref(), &report).await {
                warn!("Telemetry publish failed: {}", e);
            }
        }
        Err(e) => error!("Failed to render shutdown state: {}", e),
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::recording::{DrawOp, RecordingDisplay};
    use crate::motor::Direction;
    use crate::transport::scripted::ScriptedSource;

    fn runtime(bytes: &[u8]) -> Runtime<ScriptedSource, RecordingDisplay> {
        Runtime::new(
            DriveController::with_speed(200),
            ScriptedSource::new(bytes),
            RecordingDisplay::default(),
        )
    }

    fn frames(rt: &Runtime<ScriptedSource, RecordingDisplay>) -> usize {
        rt.reporter()
            .display()
            .ops
            .iter()
            .filter(|op| **op == DrawOp::Flush)
            .count()
    }

    #[test]
    fn test_start_draws_title_and_ready() {
        let mut rt = runtime(b"");
        rt.start("4WD ROBOT").unwrap();
        let printed = rt.reporter().display().printed();
        assert_eq!(printed[0], "4WD ROBOT");
        assert!(printed.contains(&"READY".to_string()));
        assert_eq!(frames(&rt), 2);
    }

    #[test]
    fn test_commands_render_once_each() {
        let mut rt = runtime(b"W+");
        let report = rt.tick(TICK).unwrap();

        assert_eq!(
            report.notices,
            vec![
                Notice::Status(StatusSnapshot::new("FORWARD", "Moving ahead", 200)),
                Notice::Status(StatusSnapshot::new("SPEED UP", "Speed increased", 225)),
            ]
        );
        assert_eq!(frames(&rt), 2);
        assert_eq!(rt.drive().left().direction(), Direction::Forward);
        assert_eq!(rt.drive().left().speed(), 225);
        assert!(report.banks.is_some());
    }

    #[test]
    fn test_unknown_bytes_do_not_render() {
        let mut rt = runtime(b"zz?\r\n");
        let report = rt.tick(TICK).unwrap();
        assert!(report.notices.is_empty());
        assert!(report.banks.is_none());
        assert_eq!(frames(&rt), 0);
        assert_eq!(rt.drive().state(), DriveState::Stopped);
    }

    #[test]
    fn test_diagnostic_blocks_command_reading() {
        let mut rt = runtime(b"TW");
        rt.tick(TICK).unwrap();
        assert!(rt.diagnostic_running());
        // W is still queued in the transport
        assert_eq!(rt.source().pending.len(), 1);

        let mut ticks = 0;
        while rt.diagnostic_running() {
            rt.tick(Duration::from_millis(100)).unwrap();
            assert_eq!(rt.source().pending.len(), 1);
            ticks += 1;
            assert!(ticks < 1000);
        }
        assert_eq!(rt.drive().state(), DriveState::Stopped);
        assert_eq!(rt.drive().speed(), 200);

        let announced = &rt.source().announced;
        assert_eq!(announced.first().map(String::as_str), Some("=== STARTING TEST SEQUENCE ==="));
        assert_eq!(announced.last().map(String::as_str), Some("=== TEST COMPLETE ==="));

        // the queued command runs on the next tick
        rt.tick(TICK).unwrap();
        assert_eq!(rt.drive().state(), DriveState::Forward);
        assert!(rt.source().pending.is_empty());
    }

    #[test]
    fn test_closed_source_still_renders_earlier_commands() {
        let mut source = ScriptedSource::new(b"S");
        source.close_when_empty = true;
        let mut rt = Runtime::new(DriveController::new(), source, RecordingDisplay::default());

        let err = rt.tick(TICK).unwrap_err();
        assert!(matches!(err, RuntimeError::Transport(TransportError::Closed)));
        assert_eq!(rt.drive().state(), DriveState::Backward);
        assert_eq!(frames(&rt), 1);
    }

    #[test]
    fn test_shutdown_stops_and_reports() {
        let mut rt = runtime(b"Q");
        rt.tick(TICK).unwrap();
        assert_eq!(rt.drive().state(), DriveState::SpinLeft);

        let snapshot = rt.shutdown().unwrap();
        assert_eq!(snapshot, StatusSnapshot::new("STOP", "Motors stopped", 200));
        assert_eq!(rt.drive().state(), DriveState::Stopped);
    }

    #[test]
    fn test_shutdown_mid_ramp_restores_speed() {
        let mut rt = runtime(b"T");
        rt.tick(TICK).unwrap();
        // banner and four motion tests take 14 s; 600 ms in is the 125 ramp step
        rt.tick(Duration::from_millis(14_600)).unwrap();
        assert!(rt.diagnostic_running());
        assert_eq!(rt.drive().state(), DriveState::Forward);
        assert_eq!(rt.drive().speed(), 125);

        let snapshot = rt.shutdown().unwrap();
        assert_eq!(snapshot, StatusSnapshot::new("STOP", "Motors stopped", 200));
        assert_eq!(rt.drive().speed(), 200);
        assert_eq!(rt.drive().state(), DriveState::Stopped);
        assert!(!rt.diagnostic_running());
    }

    #[test]
    fn test_commands_after_idle_ticks() {
        let mut rt = runtime(b"");
        rt.tick(TICK).unwrap();
        rt.source_mut().push(b"d");
        rt.tick(TICK).unwrap();
        assert_eq!(rt.drive().state(), DriveState::TurnRight);
        assert_eq!(rt.drive().right().speed(), 100);
    }
}
