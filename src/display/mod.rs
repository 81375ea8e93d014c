// Status display
//
// Provides:
// - `DisplaySurface`: the draw primitives a small TFT offers
// - `StatusReporter`: renders status snapshots onto any surface
// - Terminal (crossterm) and headless (tracing) surfaces

mod headless;
mod reporter;
mod terminal;

pub use headless::HeadlessDisplay;
pub use reporter::{BAR_INNER_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH, StatusReporter, bar_width};
pub use terminal::TerminalDisplay;

/// Error type for display output
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Display IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DisplayError>;

/// Pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
    Red,
    Green,
    Yellow,
    Cyan,
    Grey,
}

/// Text color and scale (1 = 6x8 px glyphs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Color,
    pub size: u8,
}

impl TextStyle {
    pub const fn new(color: Color, size: u8) -> Self {
        Self { color, size }
    }
}

/// Drawing surface of the status display
pub trait DisplaySurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// One-pixel outline
    fn draw_rect(&mut self, rect: Rect, color: Color) -> Result<()>;

    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<()>;

    fn set_cursor(&mut self, at: Point) -> Result<()>;

    fn set_text_style(&mut self, style: TextStyle) -> Result<()>;

    /// Print at the cursor, advancing it
    fn print(&mut self, text: &str) -> Result<()>;

    /// Push buffered drawing to the device
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: DisplaySurface + ?Sized> DisplaySurface for Box<D> {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        (**self).fill_rect(rect, color)
    }

    fn draw_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        (**self).draw_rect(rect, color)
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
        (**self).draw_line(from, to, color)
    }

    fn set_cursor(&mut self, at: Point) -> Result<()> {
        (**self).set_cursor(at)
    }

    fn set_text_style(&mut self, style: TextStyle) -> Result<()> {
        (**self).set_text_style(style)
    }

    fn print(&mut self, text: &str) -> Result<()> {
        (**self).print(text)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Surface that records every primitive, for tests
#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum DrawOp {
        Fill(Rect, Color),
        Outline(Rect, Color),
        Line(Point, Point, Color),
        Cursor(Point),
        Style(TextStyle),
        Print(String),
        Flush,
    }

    #[derive(Debug, Default)]
    pub struct RecordingDisplay {
        pub ops: Vec<DrawOp>,
    }

    impl RecordingDisplay {
        pub fn printed(&self) -> Vec<String> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Print(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl DisplaySurface for RecordingDisplay {
        fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
            self.ops.push(DrawOp::Fill(rect, color));
            Ok(())
        }

        fn draw_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
            self.ops.push(DrawOp::Outline(rect, color));
            Ok(())
        }

        fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
            self.ops.push(DrawOp::Line(from, to, color));
            Ok(())
        }

        fn set_cursor(&mut self, at: Point) -> Result<()> {
            self.ops.push(DrawOp::Cursor(at));
            Ok(())
        }

        fn set_text_style(&mut self, style: TextStyle) -> Result<()> {
            self.ops.push(DrawOp::Style(style));
            Ok(())
        }

        fn print(&mut self, text: &str) -> Result<()> {
            self.ops.push(DrawOp::Print(text.to_string()));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.ops.push(DrawOp::Flush);
            Ok(())
        }
    }
}
