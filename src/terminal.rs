// Copyright (c) 2026 glowveil contributors

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); width as usize * height as usize],
        }
    }
}

/// Owns the raw-mode terminal session. Construction failing here is the
/// fatal "no drawing surface" case: the caller reports the io error and
/// never retries.
pub struct Terminal {
    stdout: Stdout,
    mouse: bool,
    last: Option<LastFrame>,
    run_buf: String,
}

impl Terminal {
    pub fn new(mouse: bool) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            if mouse {
                out.execute(event::EnableMouseCapture)?;
            }
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            mouse,
            last: None,
            run_buf: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let size_changed = self
            .last
            .as_ref()
            .map(|l| l.width != frame.width || l.height != frame.height)
            .unwrap_or(true);

        let total = frame.width as usize * frame.height as usize;
        let dirty_is_large = total > 0 && frame.dirty_indices().len() >= total / 3;

        if size_changed || frame.is_dirty_all() || dirty_is_large {
            self.draw_full(frame, size_changed)?;
        } else {
            self.draw_diff(frame)?;
        }
        frame.clear_dirty();
        Ok(())
    }

    fn draw_full(&mut self, frame: &Frame, size_changed: bool) -> Result<()> {
        if size_changed {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame::new(frame.width, frame.height));
        } else if self.last.is_none() {
            self.last = Some(LastFrame::new(frame.width, frame.height));
        }
        let last = self.last.as_mut().expect("set above");

        let mut style = StyleTracker::default();
        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                style.apply(&mut self.stdout, &cell)?;
                self.stdout.queue(Print(cell.ch))?;
                last.cells[idx] = cell;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }

    /// Flush only the dirty cells, coalescing horizontal runs that share
    /// a style into single Print calls.
    fn draw_diff(&mut self, frame: &Frame) -> Result<()> {
        let last = self.last.as_mut().expect("draw_diff requires a prior frame");
        let width = frame.width as usize;

        let mut dirty: Vec<usize> = frame.dirty_indices().to_vec();
        dirty.sort_unstable();

        let mut style = StyleTracker::default();
        let mut i = 0usize;
        while i < dirty.len() {
            let idx0 = dirty[i];
            let cell0 = frame.cell_at_index(idx0);
            if last.cells.get(idx0).copied() == Some(cell0) {
                i += 1;
                continue;
            }

            let x0 = (idx0 % width) as u16;
            let y0 = (idx0 / width) as u16;
            if y0 >= frame.height {
                i += 1;
                continue;
            }

            self.run_buf.clear();
            self.run_buf.push(cell0.ch);
            last.cells[idx0] = cell0;
            let mut prev_idx = idx0;
            let mut j = i + 1;
            while j < dirty.len() {
                let idx1 = dirty[j];
                if idx1 != prev_idx + 1 || idx1 / width != idx0 / width {
                    break;
                }
                let cell1 = frame.cell_at_index(idx1);
                if cell1.fg != cell0.fg || cell1.bg != cell0.bg || cell1.bold != cell0.bold {
                    break;
                }
                self.run_buf.push(cell1.ch);
                last.cells[idx1] = cell1;
                prev_idx = idx1;
                j += 1;
            }

            self.stdout.queue(cursor::MoveTo(x0, y0))?;
            style.apply(&mut self.stdout, &cell0)?;
            self.stdout.queue(Print(self.run_buf.as_str()))?;
            i = j;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()
    }
}

#[derive(Default)]
struct StyleTracker {
    fg: Option<Option<Color>>,
    bg: Option<Option<Color>>,
    bold: Option<bool>,
}

impl StyleTracker {
    fn apply(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if self.fg != Some(cell.fg) {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = Some(cell.bg);
        }
        if self.bold != Some(cell.bold) {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = Some(cell.bold);
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.mouse {
            let _ = self.stdout.execute(event::DisableMouseCapture);
        }
        let _ = self.stdout.execute(SetAttribute(Attribute::Reset));
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

/// Used from the panic hook and signal handlers, where the `Terminal`
/// value is out of reach. Mouse capture is always disabled here; the
/// sequence is harmless when capture was never enabled.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
