// Copyright (c) 2026 glowveil contributors

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Cell {
    pub fn blank_with_bg(bg: Option<Color>) -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg,
            bold: false,
        }
    }
}

/// Cell buffer with dirty tracking. Writers call `set`; the terminal
/// layer reads `dirty_indices` (or `is_dirty_all` after a clear) and
/// calls `clear_dirty` once the diff has been flushed.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    cells: Vec<Cell>,
    blank: Cell,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, bg: Option<Color>) -> Self {
        let len = width as usize * height as usize;
        let blank = Cell::blank_with_bg(bg);
        Self {
            width,
            height,
            cells: vec![blank; len],
            blank,
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        self.cells.get(i).copied().unwrap_or(self.blank)
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        if self.cells[i] == cell {
            return;
        }
        self.cells[i] = cell;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    /// Reset every cell to blank and mark the whole frame dirty.
    pub fn clear_to_blank(&mut self, bg: Option<Color>) {
        self.blank = Cell::blank_with_bg(bg);
        self.cells.fill(self.blank);
        self.dirty_all = true;
        self.dirty_map.fill(false);
        self.dirty.clear();
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn has_changes(&self) -> bool {
        self.dirty_all || !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }
        for &i in &self.dirty {
            self.dirty_map[i] = false;
        }
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_marks_cell_dirty_once() {
        let mut f = Frame::new(4, 4, None);
        f.clear_dirty();
        let cell = Cell {
            ch: 'x',
            fg: None,
            bg: None,
            bold: false,
        };
        f.set(1, 1, cell);
        f.set(1, 1, cell);
        assert_eq!(f.dirty_indices(), &[5]);
    }

    #[test]
    fn identical_writes_stay_clean() {
        let mut f = Frame::new(4, 4, None);
        f.clear_dirty();
        f.set(0, 0, Cell::blank_with_bg(None));
        assert!(!f.has_changes());
    }

    #[test]
    fn clear_to_blank_marks_everything_dirty() {
        let mut f = Frame::new(2, 2, None);
        f.clear_dirty();
        f.set(
            0,
            0,
            Cell {
                ch: 'x',
                fg: None,
                bg: None,
                bold: false,
            },
        );
        f.clear_to_blank(None);
        assert!(f.is_dirty_all());
        assert_eq!(f.get(0, 0).unwrap().ch, ' ');
    }

    #[test]
    fn out_of_bounds_set_is_ignored() {
        let mut f = Frame::new(2, 2, None);
        f.clear_dirty();
        f.set(
            9,
            9,
            Cell {
                ch: 'x',
                fg: None,
                bg: None,
                bold: false,
            },
        );
        assert!(!f.has_changes());
    }
}
