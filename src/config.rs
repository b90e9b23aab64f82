//! Run parameters.  Only rank 0 is handed a `RenderParams`; the other
//! ranks learn it from the broadcast that opens every run.

use std::time::Duration;

use num::Complex;

use crate::error::{Error, Result};
use crate::evaluator::MandelbrotSet;
use crate::partition::Strategy;
use crate::planes::PlaneMapper;
use crate::row::RowComputer;

/// Everything a run needs to know, from the size of the grid to the
/// way its rows are farmed out.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParams {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// The complex number pixel 0,0 maps onto.
    pub origin: Complex<f64>,
    /// Per-pixel step along the real and imaginary axis.
    pub scale: (f64, f64),
    /// Iteration budget per point.
    pub max_iterations: usize,
    /// Escape threshold on `|z|`.  Must exceed 1 so the smoothing
    /// logarithm stays defined.
    pub escape_radius: f64,
    /// Fractional escape times instead of integer ones.
    pub smooth: bool,
    /// Confine stored values to `[0, 1]`.
    pub clamp: bool,
    /// Size of the world, coordinator included.
    pub workers: usize,
    /// How rows are assigned to ranks.
    pub strategy: Strategy,
    /// Give up on a silent peer after this long.  `None` waits forever.
    pub recv_timeout: Option<Duration>,
}

impl Default for RenderParams {
    fn default() -> Self {
        let (width, height) = (1024, 1024);
        RenderParams {
            width,
            height,
            origin: Complex::new(-2.0, -1.125),
            scale: (3.0 / width as f64, 2.25 / height as f64),
            max_iterations: 50,
            escape_radius: 10.0,
            smooth: true,
            clamp: true,
            workers: num_cpus::get(),
            strategy: Strategy::Dynamic,
            recv_timeout: None,
        }
    }
}

impl RenderParams {
    /// Parameters covering the rectangle between two corners of the
    /// complex plane at the given resolution.  Everything else keeps
    /// its default.
    pub fn from_corners(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<Self> {
        let plane = PlaneMapper::from_corners(width, height, leftlower, rightupper)?;
        Ok(RenderParams {
            width,
            height,
            origin: plane.origin,
            scale: plane.scale,
            ..RenderParams::default()
        })
    }

    /// Rejects parameters no run can satisfy.  Called by the runner
    /// before any rank starts.
    pub fn validate(&self) -> Result<()> {
        self.plane()?;
        if self.max_iterations == 0 {
            return Err(Error::Config("the iteration budget must be positive".into()));
        }
        if !(self.escape_radius.is_finite() && self.escape_radius > 1.0) {
            return Err(Error::Config(format!(
                "the escape radius {} must be a finite number above 1",
                self.escape_radius
            )));
        }
        if self.workers == 0 {
            return Err(Error::Config("at least one worker is needed".into()));
        }
        Ok(())
    }

    /// The pixel-to-point mapping these parameters describe.
    pub fn plane(&self) -> Result<PlaneMapper> {
        PlaneMapper::new(self.width, self.height, self.origin, self.scale)
    }

    /// The evaluator these parameters describe.
    pub fn set(&self) -> MandelbrotSet {
        MandelbrotSet::new(self.max_iterations, self.escape_radius)
    }

    /// A row computer for these parameters.
    pub fn row_computer(&self) -> Result<RowComputer> {
        Ok(RowComputer::new(self.plane()?, self.set(), self.smooth, self.clamp))
    }
}
