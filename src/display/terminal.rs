// Terminal stand-in for the TFT status display
//
// Pixels are mapped onto character cells (one 6x8 glyph per cell), drawn
// into an in-memory grid and pushed to the terminal on flush.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{self, Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;

use super::reporter::{SCREEN_HEIGHT, SCREEN_WIDTH};
use super::{Color, DisplaySurface, Point, Rect, Result, TextStyle};

const CELL_W: u16 = 6;
const CELL_H: u16 = 8;
const COLS: usize = SCREEN_WIDTH.div_ceil(CELL_W) as usize;
const ROWS: usize = SCREEN_HEIGHT.div_ceil(CELL_H) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

/// Character-cell framebuffer
#[derive(Debug)]
struct CellGrid {
    cells: Vec<Cell>,
}

impl CellGrid {
    fn new() -> Self {
        Self {
            cells: vec![Cell::default(); COLS * ROWS],
        }
    }

    fn cell_mut(&mut self, col: usize, row: usize) -> Option<&mut Cell> {
        if col < COLS && row < ROWS {
            self.cells.get_mut(row * COLS + col)
        } else {
            None
        }
    }

    fn plot(&mut self, p: Point, ch: char, color: Color) {
        let (col, row) = to_cell(p);
        if let Some(cell) = self.cell_mut(col, row) {
            cell.ch = ch;
            cell.fg = color;
        }
    }

    fn fill(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        let (c0, r0) = to_cell(Point::new(rect.x, rect.y));
        let (c1, r1) = to_cell(Point::new(rect.x + rect.w - 1, rect.y + rect.h - 1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                if let Some(cell) = self.cell_mut(col, row) {
                    *cell = Cell {
                        bg: color,
                        ..Cell::default()
                    };
                }
            }
        }
    }

    fn line(&mut self, from: Point, to: Point, color: Color) {
        let ch = if from.y == to.y {
            '─'
        } else if from.x == to.x {
            '│'
        } else {
            '•'
        };

        // Bresenham over pixels; cells get hit several times, which is fine
        let (mut x, mut y) = (from.x as i32, from.y as i32);
        let (x1, y1) = (to.x as i32, to.y as i32);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(Point::new(x as u16, y as u16), ch, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn outline(&mut self, rect: Rect, color: Color) {
        if rect.w == 0 || rect.h == 0 {
            return;
        }
        let right = rect.x + rect.w - 1;
        let bottom = rect.y + rect.h - 1;
        self.line(Point::new(rect.x, rect.y), Point::new(right, rect.y), color);
        self.line(Point::new(rect.x, bottom), Point::new(right, bottom), color);
        self.line(Point::new(rect.x, rect.y), Point::new(rect.x, bottom), color);
        self.line(Point::new(right, rect.y), Point::new(right, bottom), color);
        self.plot(Point::new(rect.x, rect.y), '┌', color);
        self.plot(Point::new(right, rect.y), '┐', color);
        self.plot(Point::new(rect.x, bottom), '└', color);
        self.plot(Point::new(right, bottom), '┘', color);
    }

    /// Write text from `at`; returns the number of cells written
    fn text(&mut self, at: Point, text: &str, style: TextStyle) -> usize {
        let (col, row) = to_cell(at);
        let mut written = 0;
        for (i, ch) in text.chars().enumerate() {
            if let Some(cell) = self.cell_mut(col + i, row) {
                cell.ch = ch;
                cell.fg = style.color;
                cell.bold = style.size > 1;
                written += 1;
            }
        }
        written
    }

    #[cfg(test)]
    fn row_text(&self, row: usize) -> String {
        self.cells[row * COLS..(row + 1) * COLS].iter().map(|c| c.ch).collect()
    }
}

fn to_cell(p: Point) -> (usize, usize) {
    ((p.x / CELL_W) as usize, (p.y / CELL_H) as usize)
}

fn term_color(color: Color) -> style::Color {
    match color {
        Color::Black => style::Color::Black,
        Color::White => style::Color::White,
        Color::Red => style::Color::Red,
        Color::Green => style::Color::Green,
        Color::Yellow => style::Color::Yellow,
        Color::Cyan => style::Color::Cyan,
        Color::Grey => style::Color::DarkGrey,
    }
}

/// Status display drawn in the terminal's alternate screen
pub struct TerminalDisplay {
    out: Stdout,
    grid: CellGrid,
    cursor: Point,
    style: TextStyle,
}

impl TerminalDisplay {
    /// Take over the terminal (alternate screen, hidden cursor)
    pub fn open() -> Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self {
            out,
            grid: CellGrid::new(),
            cursor: Point::new(0, 0),
            style: TextStyle::new(Color::White, 1),
        })
    }
}

impl DisplaySurface for TerminalDisplay {
    fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.grid.fill(rect, color);
        Ok(())
    }

    fn draw_rect(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.grid.outline(rect, color);
        Ok(())
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<()> {
        self.grid.line(from, to, color);
        Ok(())
    }

    fn set_cursor(&mut self, at: Point) -> Result<()> {
        self.cursor = at;
        Ok(())
    }

    fn set_text_style(&mut self, style: TextStyle) -> Result<()> {
        self.style = style;
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        let written = self.grid.text(self.cursor, text, self.style);
        self.cursor.x = self.cursor.x.saturating_add(written as u16 * CELL_W);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for row in 0..ROWS {
            queue!(self.out, MoveTo(0, row as u16))?;
            for cell in &self.grid.cells[row * COLS..(row + 1) * COLS] {
                let weight = if cell.bold {
                    Attribute::Bold
                } else {
                    Attribute::NormalIntensity
                };
                queue!(
                    self.out,
                    SetAttribute(weight),
                    SetForegroundColor(term_color(cell.fg)),
                    SetBackgroundColor(term_color(cell.bg)),
                    Print(cell.ch)
                )?;
            }
        }
        queue!(self.out, ResetColor, SetAttribute(Attribute::Reset))?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        // Give the terminal back even if the runtime bailed out
        if let Err(e) = execute!(self.out, ResetColor, Show, LeaveAlternateScreen) {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size() {
        assert_eq!(COLS, 40);
        assert_eq!(ROWS, 17);
    }

    #[test]
    fn test_text_lands_in_cell_row() {
        let mut grid = CellGrid::new();
        let written = grid.text(Point::new(10, 32), "FORWARD", TextStyle::new(Color::Yellow, 2));
        assert_eq!(written, 7);
        // x=10 -> col 1, y=32 -> row 4
        assert!(grid.row_text(4).starts_with(" FORWARD"));
    }

    #[test]
    fn test_text_clipped_at_right_edge() {
        let mut grid = CellGrid::new();
        let written = grid.text(Point::new(228, 0), "ABCDEF", TextStyle::new(Color::White, 1));
        assert_eq!(written, 2); // cols 38 and 39
    }

    #[test]
    fn test_fill_clears_text() {
        let mut grid = CellGrid::new();
        grid.text(Point::new(10, 60), "Moving ahead", TextStyle::new(Color::White, 1));
        grid.fill(Rect::new(0, 56, 240, 18), Color::Black);
        assert_eq!(grid.row_text(7).trim(), "");
    }

    #[test]
    fn test_horizontal_line() {
        let mut grid = CellGrid::new();
        grid.line(Point::new(0, 25), Point::new(239, 25), Color::Grey);
        assert!(grid.row_text(3).chars().all(|c| c == '─'));
    }

    #[test]
    fn test_outline_corners() {
        let mut grid = CellGrid::new();
        grid.outline(Rect::new(10, 104, 220, 16), Color::White);
        let top = grid.row_text(13);
        assert!(top.starts_with(" ┌"));
        assert!(top.trim_end().ends_with('┐'));
        assert!(grid.row_text(14).starts_with(" └"));
    }
}
