// Built-in self-test: every motion state, then a forward speed ramp
//
// The script is a flat list of steps. Each step does its work on entry and
// then holds for a fixed time; the control loop advances the sequencer with
// the time that actually elapsed. Once started it always runs to the end.

use std::time::Duration;

use tracing::info;

use crate::config::{MAX_SPEED, MIN_SPEED, SPEED_STEP};
use crate::messages::{Notice, StatusSnapshot};
use crate::motor::{DriveController, DriveState};

pub const ANNOUNCE_HOLD: Duration = Duration::from_millis(2000);
pub const MOTION_HOLD: Duration = Duration::from_millis(2000);
pub const PAUSE_HOLD: Duration = Duration::from_millis(1000);
pub const RAMP_HOLD: Duration = Duration::from_millis(500);

/// States exercised one by one before the ramp
pub const TESTED_STATES: [DriveState; 4] = [
    DriveState::Forward,
    DriveState::Backward,
    DriveState::SpinLeft,
    DriveState::SpinRight,
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum StepKind {
    /// Show a banner, optionally echo a line on the text channel
    Banner {
        label: &'static str,
        status: &'static str,
        line: Option<&'static str>,
    },
    /// Exercise one drive state
    Motion { index: usize, state: DriveState },
    /// Stop between motion tests
    Pause,
    /// Announce the ramp test
    RampStart { index: usize },
    /// Drive forward at a fixed speed
    Ramp { speed: u8 },
    /// Stop and put the Speed Setting back
    Restore,
    /// Back to the idle display
    Ready,
}

#[derive(Debug, Clone)]
struct Step {
    kind: StepKind,
    hold: Duration,
}

impl Step {
    fn new(kind: StepKind, hold: Duration) -> Self {
        Self { kind, hold }
    }
}

/// Speeds visited by the ramp: MIN_SPEED..=MAX_SPEED in SPEED_STEP increments
pub fn ramp_speeds() -> impl Iterator<Item = u8> {
    (MIN_SPEED..=MAX_SPEED).step_by(SPEED_STEP as usize)
}

fn script() -> Vec<Step> {
    let mut steps = vec![Step::new(
        StepKind::Banner {
            label: "TEST MODE",
            status: "Starting test...",
            line: Some("=== STARTING TEST SEQUENCE ==="),
        },
        ANNOUNCE_HOLD,
    )];

    for (i, &state) in TESTED_STATES.iter().enumerate() {
        steps.push(Step::new(StepKind::Motion { index: i + 1, state }, MOTION_HOLD));
        steps.push(Step::new(StepKind::Pause, PAUSE_HOLD));
    }

    steps.push(Step::new(
        StepKind::RampStart {
            index: TESTED_STATES.len() + 1,
        },
        Duration::ZERO,
    ));
    for speed in ramp_speeds() {
        steps.push(Step::new(StepKind::Ramp { speed }, RAMP_HOLD));
    }
    steps.push(Step::new(StepKind::Restore, Duration::ZERO));

    steps.push(Step::new(
        StepKind::Banner {
            label: "TEST DONE",
            status: "All tests passed",
            line: Some("=== TEST COMPLETE ==="),
        },
        ANNOUNCE_HOLD,
    ));
    steps.push(Step::new(StepKind::Ready, Duration::ZERO));
    steps
}

/// Progress of the sequencer after an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Running,
    Finished,
}

/// Timed self-test driving the controller through its states
#[derive(Debug)]
pub struct DiagnosticSequencer {
    steps: Vec<Step>,
    cursor: usize,
    remaining: Duration,
    saved_speed: u8,
}

impl DiagnosticSequencer {
    /// Prepare the script, remembering the Speed Setting to restore later
    ///
    /// Nothing happens on the controller until the first `advance`.
    pub fn start(drive: &DriveController) -> Self {
        info!("Diagnostic sequence armed (speed {} will be restored)", drive.speed());
        Self {
            steps: script(),
            cursor: 0,
            remaining: Duration::ZERO,
            saved_speed: drive.speed(),
        }
    }

    /// Advance by `elapsed`, entering every step whose turn has come
    ///
    /// Work done on entering steps is reported through `notices`.
    pub fn advance(
        &mut self,
        mut elapsed: Duration,
        drive: &mut DriveController,
        notices: &mut Vec<Notice>,
    ) -> Progress {
        loop {
            if elapsed < self.remaining {
                self.remaining -= elapsed;
                return Progress::Running;
            }
            elapsed -= self.remaining;
            self.remaining = Duration::ZERO;

            let Some(step) = self.steps.get(self.cursor) else {
                return Progress::Finished;
            };
            self.cursor += 1;
            let hold = step.hold;
            let kind = step.kind.clone();
            self.enter(kind, drive, notices);
            self.remaining = hold;
        }
    }

    fn enter(&self, kind: StepKind, drive: &mut DriveController, notices: &mut Vec<Notice>) {
        match kind {
            StepKind::Banner { label, status, line } => {
                drive.stop();
                notices.push(Notice::Status(StatusSnapshot::new(label, status, drive.speed())));
                if let Some(line) = line {
                    announce(notices, line.to_string());
                }
            }
            StepKind::Motion { index, state } => {
                let line = format!("Test {}: {}", index, state.name());
                notices.push(Notice::Status(StatusSnapshot::new(
                    state.label(),
                    line.clone(),
                    drive.speed(),
                )));
                announce(notices, line);
                drive.apply(state);
            }
            StepKind::Pause => drive.stop(),
            StepKind::RampStart { index } => {
                announce(notices, format!("Test {}: Speed ramp", index));
            }
            StepKind::Ramp { speed } => {
                let speed = drive.set_speed(speed);
                notices.push(Notice::Status(StatusSnapshot::new(
                    "SPEED TEST",
                    format!("Speed: {}", speed),
                    speed,
                )));
                drive.forward();
            }
            StepKind::Restore => {
                drive.stop();
                drive.set_speed(self.saved_speed);
            }
            StepKind::Ready => {
                notices.push(Notice::Status(StatusSnapshot::ready(drive.speed())));
            }
        }
    }

    /// Speed that will be restored after the ramp
    pub fn saved_speed(&self) -> u8 {
        self.saved_speed
    }

    /// Total scripted duration
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.hold).sum()
    }
}

fn announce(notices: &mut Vec<Notice>, line: String) {
    info!("{}", line);
    notices.push(Notice::Line(line));
}
