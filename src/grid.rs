//! Keyboard LED grid.
//!
//! The grid is a dense rows x columns matrix of colors. Its size comes from
//! the hardware sink and may change when the device is swapped, so every
//! write is bounds-checked and out-of-range writes are dropped.

use crate::color::{BLACK, Rgb};

/// Dimensions of the keyboard LED matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl GridSize {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of cells in the grid
    pub const fn cells(self) -> usize {
        self.rows * self.cols
    }

    /// Check whether a position lies inside the grid
    pub const fn contains(self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub const fn is_empty(self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// Row-major color buffer owned by an effect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorGrid {
    size: GridSize,
    cells: Vec<Rgb>,
}

impl ColorGrid {
    /// Create a grid with every cell off
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![BLACK; size.cells()],
        }
    }

    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Reallocate for a new size, clearing every cell
    pub fn resize(&mut self, size: GridSize) {
        self.size = size;
        self.cells.clear();
        self.cells.resize(size.cells(), BLACK);
    }

    /// Set a cell, ignoring positions outside the grid
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, color: Rgb) {
        if let Some(index) = self.index(row, col) {
            self.cells[index] = color;
        }
    }

    /// Get a cell, `None` outside the grid
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        self.index(row, col).map(|index| self.cells[index])
    }

    /// Fill the whole grid with a single color
    pub fn fill(&mut self, color: Rgb) {
        self.cells.fill(color);
    }

    /// Turn every cell off
    pub fn clear(&mut self) {
        self.fill(BLACK);
    }

    /// Iterate over rows as slices
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.cells.chunks(self.size.cols.max(1))
    }

    /// Flat row-major view of the cells
    pub fn as_slice(&self) -> &[Rgb] {
        &self.cells
    }

    /// Visit every cell with its position, replacing it with the returned color
    pub fn paint<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, usize) -> Rgb,
    {
        let cols = self.size.cols;
        for (index, cell) in self.cells.iter_mut().enumerate() {
            *cell = f(index / cols, index % cols);
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        self.size
            .contains(row, col)
            .then(|| row * self.size.cols + col)
    }
}
