#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot farm
//!
//! The Mandelbrot set takes a point on the complex plane and
//! repeatedly squares it and adds the original point back, measuring
//! how quickly the result runs off to infinity.  That "velocity",
//! divided by the iteration budget, is the value stored for each pixel
//! of the grid.
//!
//! Every pixel is independent, so the interesting part is not the
//! arithmetic but who does it.  A fixed world of ranks, each running
//! on its own thread and talking only through messages, splits the
//! rows of the grid between them.  Rank 0 coordinates: it owns the
//! grid and assembles it from the rows the others send back.  How
//! rows are assigned is up to the [`Strategy`]: contiguous blocks,
//! interleaved rows, or a master handing rows out one at a time to
//! whichever worker is free.  Whatever the strategy, the assembled
//! grid is the same.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod grid;
pub mod partition;
pub mod planes;
pub mod role;
pub mod row;
pub mod run;
pub mod topology;

pub use crate::config::RenderParams;
pub use crate::error::{Error, Result};
pub use crate::evaluator::{evaluate, MandelbrotSet};
pub use crate::grid::{Grid, GridBuffer};
pub use crate::partition::{Partitioner, Strategy};
pub use crate::role::{Render, RunReport};
pub use crate::run::render;
