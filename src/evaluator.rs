//! The escape-time evaluator.  Every partitioning strategy ends up
//! here: a row is nothing but a run of calls to
//! [`MandelbrotSet::convergence`].
//!
//! Points deep inside the set never escape, and iterating them costs
//! the full budget.  Three closed-form tests catch most of them before
//! the loop starts: a disk inside the main cardioid, the period-2 bulb
//! centered on -1, and the cardioid boundary itself.

use num::{clamp, Complex};

const D16: f64 = 1.0 / 16.0;
const D4: f64 = 1.0 / 4.0;
const EPSILON: f64 = 1.0e-14;

/// Parameters of one escape-time evaluation.  Holds no state between
/// calls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MandelbrotSet {
    /// The iteration budget; also the value returned for points that
    /// never escape.
    pub max_iterations: usize,
    /// Magnitude past which an orbit counts as escaped.
    pub escape_radius: f64,
}

impl Default for MandelbrotSet {
    fn default() -> Self {
        MandelbrotSet {
            max_iterations: 50,
            escape_radius: 2.0,
        }
    }
}

/// True if `c` is guaranteed never to escape, without iterating.  A
/// `false` says nothing: plenty of interior points fail all three
/// tests and still have to be iterated.
pub fn never_escapes(c: Complex<f64>) -> bool {
    if c.norm_sqr() < D16 {
        return true;
    }
    if (c + 1.0).norm_sqr() < D16 {
        return true;
    }
    if c.re > -0.75 && c.re < 0.5 {
        let ct = Complex::new(c.re - D4, c.im);
        let ctnrm = ct.norm();
        if ctnrm < 0.5 * (1.0 - ct.re / ctnrm.max(EPSILON)) {
            return true;
        }
    }
    false
}

impl MandelbrotSet {
    /// A set with the given budget and escape radius.
    pub fn new(max_iterations: usize, escape_radius: f64) -> Self {
        MandelbrotSet {
            max_iterations,
            escape_radius,
        }
    }

    /// Runs the escape-time loop on `c`.  Returns the zero-based step
    /// at which `|z|` passed the escape radius, or, when `smooth` is
    /// set, the fractional `i + 1 - log2(ln |z|)`.  Points that never
    /// escape return `max_iterations`.
    pub fn count_iterations(&self, c: Complex<f64>, smooth: bool) -> f64 {
        if never_escapes(c) {
            return self.max_iterations as f64;
        }
        let radius_sqr = self.escape_radius * self.escape_radius;
        let mut z = Complex::new(0.0_f64, 0.0_f64);
        for i in 0..self.max_iterations {
            z = z * z + c;
            if z.norm_sqr() > radius_sqr {
                if smooth {
                    return (i + 1) as f64 - z.norm().ln().ln() / std::f64::consts::LN_2;
                }
                return i as f64;
            }
        }
        self.max_iterations as f64
    }

    /// The escape time divided by the budget.  With `clamped` the result
    /// is confined to `[0, 1]`, which is what the grid stores; without
    /// it, smoothed values may land slightly outside.
    pub fn convergence(&self, c: Complex<f64>, smooth: bool, clamped: bool) -> f64 {
        let value = self.count_iterations(c, smooth) / (self.max_iterations as f64);
        if clamped {
            clamp(value, 0.0, 1.0)
        } else {
            value
        }
    }

    /// True if `c` does not escape within the budget.
    pub fn contains(&self, c: Complex<f64>) -> bool {
        self.count_iterations(c, false) >= self.max_iterations as f64
    }
}

/// Free-standing form of [`MandelbrotSet::count_iterations`].
pub fn evaluate(c: Complex<f64>, max_iterations: usize, escape_radius: f64, smooth: bool) -> f64 {
    MandelbrotSet::new(max_iterations, escape_radius).count_iterations(c, smooth)
}
