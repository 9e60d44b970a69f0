//! Immutable colour grids for stimulus generators.
//!
//! Every transform returns a new grid, so an input grid can be reused as the
//! starting point of its output without aliasing.

use serde::{Serialize, Serializer};

/// Colour index; 0 is background.
pub type Cell = u8;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, fill: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Build from row slices. Returns `None` if rows differ in length.
    pub fn from_rows(rows: &[Vec<Cell>]) -> Option<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.cols).map(|r| r.to_vec()).collect()
    }

    fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> Cell) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Self { rows, cols, cells }
    }

    /// Copy with one cell recoloured; out-of-bounds positions are ignored.
    pub fn with_cell(&self, row: usize, col: usize, color: Cell) -> Self {
        let mut out = self.clone();
        if row < self.rows && col < self.cols {
            out.cells[row * self.cols + col] = color;
        }
        out
    }

    /// Copy with the inclusive rectangle cols `x0..=x1`, rows `y0..=y1`
    /// filled, clipped to the grid.
    pub fn with_rect(&self, x0: usize, x1: usize, y0: usize, y1: usize, color: Cell) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| {
            if (y0..=y1).contains(&r) && (x0..=x1).contains(&c) {
                color
            } else {
                self.cells[r * self.cols + c]
            }
        })
    }

    /// 90° counter-clockwise; rows and cols swap.
    pub fn rotate_left_90(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| {
            self.cells[c * self.cols + (self.cols - 1 - r)]
        })
    }

    pub fn rotate_180(&self) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| {
            self.cells[(self.rows - 1 - r) * self.cols + (self.cols - 1 - c)]
        })
    }

    /// Flip top ↔ bottom.
    pub fn mirror_x(&self) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| {
            self.cells[(self.rows - 1 - r) * self.cols + c]
        })
    }

    /// Flip left ↔ right.
    pub fn mirror_y(&self) -> Self {
        Self::from_fn(self.rows, self.cols, |r, c| {
            self.cells[r * self.cols + (self.cols - 1 - c)]
        })
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}
