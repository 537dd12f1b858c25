//! Dense escape-value grids.

use crate::GridAllocationError;
use serde::{Deserialize, Serialize};

/// Escape value for points that never escaped (inside the set).
///
/// The color stage renders these without a gradient.
pub const INTERIOR: f64 = -1.0;

/// True for values a render may legitimately contain: an escape value `>= 0`
/// or the [`INTERIOR`] sentinel.
pub fn is_escape_value(value: f64) -> bool {
    value == INTERIOR || value >= 0.0
}

/// Escape values of one tile, row-major.
///
/// Read-only after construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl TileGrid {
    /// Build a grid by evaluating `f(x, y)` for every cell, row by row.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            values,
        }
    }

    /// Wrap existing row-major values. Returns `None` if the length does not
    /// match the dimensions.
    pub fn from_values(width: u32, height: u32, values: Vec<f64>) -> Option<Self> {
        let grid = Self {
            width,
            height,
            values,
        };
        grid.is_consistent().then_some(grid)
    }

    /// Dimensions agree with the stored value count. Deserialized grids from an
    /// external store are only trusted when this holds.
    pub fn is_consistent(&self) -> bool {
        self.values.len() == self.width as usize * self.height as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.values[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn row(&self, y: u32) -> &[f64] {
        let start = (y * self.width) as usize;
        &self.values[start..start + self.width as usize]
    }
}

/// Escape values for a whole requested image, `height` rows of `width` cells.
///
/// Zero-initialized; regions of tiles that failed stay zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssembledGrid {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl AssembledGrid {
    /// Allocate a zeroed grid, reporting failure instead of aborting.
    pub fn try_new(width: u32, height: u32) -> Result<Self, GridAllocationError> {
        let err = GridAllocationError { width, height };
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| err.clone())?;

        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|_| err)?;
        values.resize(len, 0.0);

        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable row-major storage, for writers that split it into disjoint chunks.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.values[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    pub fn row(&self, y: u32) -> &[f64] {
        let start = y as usize * self.width as usize;
        &self.values[start..start + self.width as usize]
    }

    /// Copy out as nested rows (`grid[y][x]`).
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height as usize];
        }
        self.values
            .chunks(self.width as usize)
            .map(|row| row.to_vec())
            .collect()
    }
}
