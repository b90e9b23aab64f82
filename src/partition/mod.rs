//! Row distribution.  A [`Partitioner`] decides which rank computes
//! which row, and drives both sides of the exchange: the loop a worker
//! runs, and the gather the coordinator runs into its grid.
//!
//! Three strategies are provided.  [`Block`] and [`Cyclic`] fix row
//! ownership as a pure function of rank, so nobody has to ask; every
//! rank, coordinator included, computes its rows and ships them in one
//! message.  [`Dynamic`] hands rows out one at a time to whichever
//! worker is free, which balances uneven rows at the cost of one round
//! trip per row.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::grid::GridBuffer;
use crate::row::RowComputer;
use crate::topology::{Communicator, Message, Source, Tag};

mod block;
mod cyclic;
mod dynamic;

pub use self::block::{block_rows, Block};
pub use self::cyclic::{cyclic_rows, Cyclic};
pub use self::dynamic::{Dynamic, WorkerState};

/// The rank that owns the grid.
pub const COORDINATOR: usize = 0;

/// Names the three strategies, for configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Contiguous runs of rows, remainder to the lowest ranks.
    Block,
    /// Row `y` belongs to rank `y mod size`.
    Cyclic,
    /// Rows handed out on demand by the coordinator.
    Dynamic,
}

impl Strategy {
    /// Every strategy, in a fixed order.
    pub const ALL: [Strategy; 3] = [Strategy::Block, Strategy::Cyclic, Strategy::Dynamic];

    /// The partitioner implementing this strategy.
    pub fn partitioner(self) -> Box<dyn Partitioner> {
        match self {
            Strategy::Block => Box::new(Block),
            Strategy::Cyclic => Box::new(Cyclic),
            Strategy::Dynamic => Box::new(Dynamic),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Strategy::Block => "block",
            Strategy::Cyclic => "cyclic",
            Strategy::Dynamic => "dynamic",
        })
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Strategy::Block),
            "cyclic" => Ok(Strategy::Cyclic),
            "dynamic" => Ok(Strategy::Dynamic),
            _ => Err(Error::Config(format!(
                "unknown strategy '{}', expected block, cyclic or dynamic",
                s
            ))),
        }
    }
}

/// Messages the coordinator exchanged while gathering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// `WorkRequest`s sent.
    pub requests_sent: usize,
    /// `WorkResult`s received.
    pub results_received: usize,
    /// `StopSignal`s sent.
    pub stops_sent: usize,
    /// Static blocks received.
    pub blocks_received: usize,
}

/// The scheduling capability shared by both roles.  Every rank of a
/// run holds the same partitioner.
pub trait Partitioner: fmt::Debug + Send + Sync {
    /// Which strategy this is.
    fn strategy(&self) -> Strategy;

    /// The rows `rank` computes in a world of `size`, when that is
    /// known before the run starts.
    fn rows_for(&self, rank: usize, size: usize, height: usize) -> Option<Vec<usize>>;

    /// Coordinator side.  Fills `grid`, counting messages in `tally`,
    /// and returns the rows the coordinator computed itself.
    fn coordinate(
        &self,
        comm: &mut Communicator,
        rows: &RowComputer,
        grid: &mut GridBuffer,
        tally: &mut Tally,
    ) -> Result<Vec<usize>>;

    /// Worker side.  Returns the rows this rank computed.
    fn work(&self, comm: &mut Communicator, rows: &RowComputer) -> Result<Vec<usize>>;
}

/// The coordinator half of a static strategy: compute rank 0's own
/// rows, then take one block from each worker, in rank order, and
/// scatter it by the rows that worker owns.
fn coordinate_static<F>(
    owned_by: F,
    comm: &mut Communicator,
    rows: &RowComputer,
    grid: &mut GridBuffer,
    tally: &mut Tally,
) -> Result<Vec<usize>>
where
    F: Fn(usize) -> Vec<usize>,
{
    let me = comm.rank();
    let mine = owned_by(me);
    let block = rows.compute_block(mine.iter().cloned());
    grid.write_rows(mine.iter().cloned(), &block)?;

    for source in (0..comm.size()).filter(|&r| r != me) {
        let envelope = comm.recv(Source::Rank(source), Some(Tag::Block))?;
        match envelope.message {
            Message::Block(values) => grid.write_rows(owned_by(source), &values)?,
            other => {
                return Err(Error::UnexpectedMessage {
                    rank: me,
                    source,
                    expected: "BLOCK",
                    got: other.tag(),
                })
            }
        }
        tally.blocks_received += 1;
    }
    Ok(mine)
}

/// The worker half of a static strategy.
fn work_static(
    owned: Vec<usize>,
    comm: &mut Communicator,
    rows: &RowComputer,
) -> Result<Vec<usize>> {
    let block = rows.compute_block(owned.iter().cloned());
    comm.send(COORDINATOR, Message::Block(block))?;
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn strategies_parse_and_print() {
        for s in Strategy::ALL.iter() {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), *s);
        }
        assert_eq!("Cyclic".parse::<Strategy>().unwrap(), Strategy::Cyclic);
        assert!("round-robin".parse::<Strategy>().is_err());
    }

    #[test]
    fn static_ownership_covers_every_row_once() {
        for size in [1, 2, 3, 5, 8].iter().cloned() {
            for height in [1, 4, 10, 17, 64].iter().cloned() {
                for strategy in &[Strategy::Block, Strategy::Cyclic] {
                    let p = strategy.partitioner();
                    let all: Vec<usize> = (0..size)
                        .flat_map(|rank| p.rows_for(rank, size, height).unwrap())
                        .sorted()
                        .collect();
                    assert_eq!(all, (0..height).collect::<Vec<_>>(), "{} p={}", strategy, size);
                }
            }
        }
    }

    #[test]
    fn dynamic_ownership_is_decided_at_run_time() {
        assert_eq!(Strategy::Dynamic.partitioner().rows_for(0, 2, 4), None);
    }
}
