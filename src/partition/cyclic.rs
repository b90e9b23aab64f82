//! Interleaved rows.  Escape time is most expensive near the boundary
//! of the set, and those rows cluster; dealing rows out like cards
//! spreads the expensive ones across every rank.

use super::{coordinate_static, work_static, Partitioner, Strategy, Tally};
use crate::error::Result;
use crate::grid::GridBuffer;
use crate::row::RowComputer;
use crate::topology::Communicator;

/// Cyclic partitioning: row `y` belongs to rank `y mod size`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Cyclic;

/// The rows `rank` owns, in increasing order.
pub fn cyclic_rows(rank: usize, size: usize, height: usize) -> Vec<usize> {
    (rank..height).step_by(size).collect()
}

impl Partitioner for Cyclic {
    fn strategy(&self) -> Strategy {
        Strategy::Cyclic
    }

    fn rows_for(&self, rank: usize, size: usize, height: usize) -> Option<Vec<usize>> {
        Some(cyclic_rows(rank, size, height))
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
            |rank| cyclic_rows(rank, size, height),
            comm,
            rows,
            grid,
            tally,
        )
    }

    fn work(&self, comm: &mut Communicator, rows: &RowComputer) -> Result<Vec<usize>> {
        let owned = cyclic_rows(comm.rank(), comm.size(), rows.height());
        work_static(owned, comm, rows)
    }
}
