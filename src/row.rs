//! One row at a time.  Rows are the unit every strategy hands out, so
//! this is the only place pixels meet the evaluator.

use crate::evaluator::MandelbrotSet;
use crate::planes::{Pixel, PlaneMapper};

/// Evaluates whole rows of the plane.
#[derive(Copy, Clone, Debug)]
pub struct RowComputer {
    plane: PlaneMapper,
    set: MandelbrotSet,
    smooth: bool,
    clamp: bool,
}

impl RowComputer {
    /// Pairs a plane with an evaluator.  `smooth` and `clamp` are passed
    /// through to [`MandelbrotSet::convergence`] for every pixel.
    pub fn new(plane: PlaneMapper, set: MandelbrotSet, smooth: bool, clamp: bool) -> Self {
        RowComputer {
            plane,
            set,
            smooth,
            clamp,
        }
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.plane.width()
    }

    /// Rows in the plane.
    pub fn height(&self) -> usize {
        self.plane.height()
    }

    /// Writes the convergence of every pixel in row `y` into `out`,
    /// which must be exactly one row wide.
    pub fn compute_into(&self, y: usize, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.width());
        for (x, value) in out.iter_mut().enumerate() {
            let c = self.plane.pixel_to_point(&Pixel(x, y));
            *value = self.set.convergence(c, self.smooth, self.clamp);
        }
    }

    /// The convergence of every pixel in row `y`.
    pub fn compute(&self, y: usize) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];
        self.compute_into(y, &mut row);
        row
    }

    /// Computes `rows` in the order given and lays them end to end.
    pub fn compute_block<I>(&self, rows: I) -> Vec<f64>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut block = vec![];
        for y in rows {
            let start = block.len();
            block.resize(start + self.width(), 0.0);
            self.compute_into(y, &mut block[start..]);
        }
        block
    }
}
