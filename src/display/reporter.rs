// Status reporter: snapshot -> draw calls
//
// Screen layout (240x135):
//
//   y   0..25  title (drawn once)
//   y  28..54  command label
//   y  56..74  status text
//   y  76..135 speed number and bar

use tracing::debug;

use super::{Color, DisplaySurface, Point, Rect, Result, TextStyle};
use crate::messages::StatusSnapshot;

pub const SCREEN_WIDTH: u16 = 240;
pub const SCREEN_HEIGHT: u16 = 135;

const TITLE_AT: Point = Point::new(10, 5);
const TITLE_RULE_Y: u16 = 25;

const COMMAND_REGION: Rect = Rect::new(0, 28, SCREEN_WIDTH, 26);
const COMMAND_AT: Point = Point::new(10, 32);

const STATUS_REGION: Rect = Rect::new(0, 56, SCREEN_WIDTH, 18);
const STATUS_AT: Point = Point::new(10, 60);

const SPEED_REGION: Rect = Rect::new(0, 76, SCREEN_WIDTH, SCREEN_HEIGHT - 76);
const SPEED_AT: Point = Point::new(10, 80);
const BAR_OUTLINE: Rect = Rect::new(10, 104, 220, 16);

/// Width of the bar fill at full scale
pub const BAR_INNER_WIDTH: u16 = BAR_OUTLINE.w - 4;

/// Map a speed in 0..=255 linearly onto the bar fill width
pub fn bar_width(speed: u8) -> u16 {
    (speed as u32 * BAR_INNER_WIDTH as u32 / 255) as u16
}

/// Renders status snapshots onto a display surface
pub struct StatusReporter<D> {
    display: D,
}

impl<D: DisplaySurface> StatusReporter<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    /// Title banner; drawn once at startup
    pub fn draw_title(&mut self, title: &str) -> Result<()> {
        let d = &mut self.display;
        d.fill_rect(Rect::new(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT), Color::Black)?;
        d.set_cursor(TITLE_AT)?;
        d.set_text_style(TextStyle::new(Color::Cyan, 2))?;
        d.print(title)?;
        d.draw_line(
            Point::new(0, TITLE_RULE_Y),
            Point::new(SCREEN_WIDTH - 1, TITLE_RULE_Y),
            Color::Grey,
        )?;
        d.flush()
    }

    /// Redraw every status region from `snapshot`
    pub fn render(&mut self, snapshot: &StatusSnapshot) -> Result<()> {
        debug!(
            "Render: {} / {} / {}",
            snapshot.command_label, snapshot.status_text, snapshot.speed
        );
        let d = &mut self.display;

        d.fill_rect(COMMAND_REGION, Color::Black)?;
        d.fill_rect(STATUS_REGION, Color::Black)?;
        d.fill_rect(SPEED_REGION, Color::Black)?;

        d.set_cursor(COMMAND_AT)?;
        d.set_text_style(TextStyle::new(Color::Yellow, 2))?;
        d.print(&snapshot.command_label)?;

        d.set_cursor(STATUS_AT)?;
        d.set_text_style(TextStyle::new(Color::White, 1))?;
        d.print(&snapshot.status_text)?;

        d.set_cursor(SPEED_AT)?;
        d.set_text_style(TextStyle::new(Color::Green, 2))?;
        d.print(&format!("Speed: {}", snapshot.speed))?;

        d.draw_rect(BAR_OUTLINE, Color::White)?;
        let width = bar_width(snapshot.speed);
        if width > 0 {
            let fill = Rect::new(BAR_OUTLINE.x + 2, BAR_OUTLINE.y + 2, width, BAR_OUTLINE.h - 4);
            d.fill_rect(fill, Color::Green)?;
        }

        d.flush()
    }

    /// Idle display
    pub fn show_ready(&mut self, speed: u8) -> Result<()> {
        self.render(&StatusSnapshot::ready(speed))
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}
