// Headless display: no screen, printed text goes to the log

use tracing::{debug, info};

use super::{Color, DisplaySurface, Point, Rect, Result, TextStyle};

/// Display surface for runs without a terminal
///
/// Text printed between two flushes is joined into one log line.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    pending: Vec<String>,
    frames: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flushed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn fill_rect(&mut self, _rect: Rect, _color: Color) -> Result<()> {
        Ok(())
    }

    fn draw_rect(&mut self, _rect: Rect, _color: Color) -> Result<()> {
        Ok(())
    }

    fn draw_line(&mut self, _from: Point, _to: Point, _color: Color) -> Result<()> {
        Ok(())
    }

    fn set_cursor(&mut self, _at: Point) -> Result<()> {
        Ok(())
    }

    fn set_text_style(&mut self, _style: TextStyle) -> Result<()> {
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        debug!("print {:?}", text);
        self.pending.push(text.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            info!("[display] {}", self.pending.join(" | "));
            self.pending.clear();
        }
        self.frames += 1;
        Ok(())
    }
}
