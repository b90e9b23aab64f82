//! Contiguous blocks.  With `q = height / size` and `r = height % size`,
//! the first `r` ranks take `q + 1` rows and the rest take `q`, so the
//! blocks tile the grid top to bottom in rank order.

use std::ops::Range;

use super::{coordinate_static, work_static, Partitioner, Strategy, Tally};
use crate::error::Result;
use crate::grid::GridBuffer;
use crate::row::RowComputer;
use crate::topology::Communicator;

/// Contiguous block partitioning.
#[derive(Copy, Clone, Debug, Default)]
pub struct Block;

/// The rows `rank` owns.  Ranks past the height get an empty range.
pub fn block_rows(rank: usize, size: usize, height: usize) -> Range<usize> {
    let (q, r) = (height / size, height % size);
    if rank < r {
        let start = rank * (q + 1);
        start..start + q + 1
    } else {
        let start = rank * q + r;
        start..start + q
    }
}

impl Partitioner for Block {
    fn strategy(&self) -> Strategy {
        Strategy::Block
    }

    fn rows_for(&self, rank: usize, size: usize, height: usize) -> Option<Vec<usize>> {
        Some(block_rows(rank, size, height).collect())
    }

    fn coordinate(
        &self,
        comm: &mut Communicator,
        rows: &RowComputer,
        grid: &mut GridBuffer,
        tally: &mut Tally,
    ) -> Result<Vec<usize>> {
        let (size, height) = (comm.size(), grid.height());
        coordinate_static(
            |rank| block_rows(rank, size, height).collect(),
            comm,
            rows,
            grid,
            tally,
        )
    }

    fn work(&self, comm: &mut Communicator, rows: &RowComputer) -> Result<Vec<usize>> {
        let owned = block_rows(comm.rank(), comm.size(), rows.height()).collect();
        work_static(owned, comm, rows)
    }
}
