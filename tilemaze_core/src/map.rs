use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// Represents errors that can occur within the grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Coordinates ({x}, {y}) are out of bounds for grid size ({width}, {height})")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("Expected {expected} cells, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// An immutable 2D grid of decoded maze cells.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// A grid never changes after construction; all mutable game state lives in
/// the engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Builds a grid from cells already laid out in row-major order.
    ///
    /// Returns `Err(GridError::DimensionMismatch)` if the number of cells does
    /// not equal `width * height`.
    pub fn from_cells(width: usize, height: usize, cells: Vec<T>) -> Result<Self, GridError> {
        let expected = width.saturating_mul(height);
        if cells.len() != expected {
            return Err(GridError::DimensionMismatch {
                expected,
                found: cells.len(),
            });
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    /// Creates a new grid with the specified dimensions, filled by a generator function.
    ///
    /// The generator function `f` takes `(x, y)` coordinates and returns the value for that cell.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn from_generator<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let size = width.checked_mul(height).expect("Grid size overflow");
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Converts (x, y) coordinates to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, x: usize, y: usize) -> Option<usize> {
        if self.is_valid(x, y) {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Gets a reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        let index = self.coords_to_index(x, y)?;
        self.cells.get(index)
    }

    /// Bounds-checked lookup by position.
    pub fn cell(&self, position: Position) -> Result<&T, GridError> {
        self.get(position.x, position.y)
            .ok_or(GridError::OutOfBounds {
                x: position.x,
                y: position.y,
                width: self.width,
                height: self.height,
            })
    }

    /// Applies a signed offset to `position`.
    ///
    /// Returns `None` if the result would leave the grid.
    pub fn offset(&self, position: Position, dx: isize, dy: isize) -> Option<Position> {
        let x = position.x.checked_add_signed(dx)?;
        let y = position.y.checked_add_signed(dy)?;
        self.is_valid(x, y).then_some(Position { x, y })
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let position = Position {
                x: index % width,
                y: index / width,
            };
            (position, cell)
        })
    }

    /// Returns a slice containing all cells in the grid.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        let (x, y) = (index.x, index.y);
        match self.coords_to_index(x, y) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                x, y, self.width, self.height
            ),
        }
    }
}
