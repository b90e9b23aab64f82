//! The two parts a rank can play.  A rank's role is picked once, from
//! its rank, when the run starts: rank 0 becomes the [`Coordinator`]
//! and owns the grid, everyone else becomes a [`Worker`].  Both drive
//! the same [`Partitioner`](crate::partition::Partitioner), from
//! opposite ends.

use log::{debug, info};

use crate::config::RenderParams;
use crate::error::{Error, Result};
use crate::grid::{Grid, GridBuffer};
use crate::partition::{Strategy, Tally, COORDINATOR};
use crate::topology::{Communicator, Message, Tag};

/// Something a rank runs to completion.
pub trait Process {
    /// Plays the role through the whole run.
    fn run(self) -> Result<Outcome>;
}

/// What a rank has to show for its run.
#[derive(Debug)]
pub enum Outcome {
    /// The coordinator's finished grid.
    Assembled(Render),
    /// A worker's rows.
    Finished {
        /// The worker's rank.
        rank: usize,
        /// Rows it computed.
        rows: Vec<usize>,
    },
}

/// A finished render.
#[derive(Debug)]
pub struct Render {
    /// The assembled grid.
    pub grid: Grid,
    /// How the rows were distributed.
    pub report: RunReport,
}

/// Who computed what, as gathered by the coordinator at the end of a
/// run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// The strategy that distributed the rows.
    pub strategy: Strategy,
    /// The rows each rank computed, indexed by rank.
    pub rows_by_rank: Vec<Vec<usize>>,
    /// The coordinator's message counts.
    pub tally: Tally,
}

impl RunReport {
    /// Every row computed by any rank, in increasing order.  A correct
    /// run yields each row of the grid exactly once.
    pub fn rows_computed(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.rows_by_rank.iter().flatten().cloned().collect();
        rows.sort();
        rows
    }
}

/// Rank 0: broadcasts the parameters, gathers every row into the grid
/// it alone owns, and collects the report.
#[derive(Debug)]
pub struct Coordinator {
    comm: Communicator,
    params: RenderParams,
}

/// Any other rank: learns the parameters from the broadcast and
/// computes whatever rows the strategy gives it.
#[derive(Debug)]
pub struct Worker {
    comm: Communicator,
}

/// The role of one rank.
#[derive(Debug)]
pub enum Role {
    /// Rank 0.
    Coordinator(Coordinator),
    /// Everybody else.
    Worker(Worker),
}

impl Role {
    /// Picks the role for `comm`'s rank.  Only the coordinator is
    /// handed the parameters.
    pub fn for_rank(comm: Communicator, params: Option<RenderParams>) -> Result<Role> {
        if comm.rank() != COORDINATOR {
            return Ok(Role::Worker(Worker { comm }));
        }
        match params {
            Some(params) => Ok(Role::Coordinator(Coordinator { comm, params })),
            None => Err(Error::Config(
                "the coordinator was started without parameters".to_string(),
            )),
        }
    }
}

impl Process for Role {
    fn run(self) -> Result<Outcome> {
        match self {
            Role::Coordinator(c) => c.run(),
            Role::Worker(w) => w.run(),
        }
    }
}

impl Process for Coordinator {
    fn run(self) -> Result<Outcome> {
        let Coordinator { mut comm, params } = self;
        comm.broadcast(COORDINATOR, Tag::Params, Some(Message::Params(params.clone())))?;

        let rows = params.row_computer()?;
        let partitioner = params.strategy.partitioner();
        let mut grid = GridBuffer::new(params.width, params.height);
        let mut tally = Tally::default();
        let own = partitioner.coordinate(&mut comm, &rows, &mut grid, &mut tally)?;

        let mut rows_by_rank = Vec::with_capacity(comm.size());
        for (rank, message) in comm
            .gather(COORDINATOR, Message::Rows(own))?
            .unwrap_or_default()
            .into_iter()
            .enumerate()
        {
            match message {
                Message::Rows(r) => rows_by_rank.push(r),
                other => {
                    return Err(Error::UnexpectedMessage {
                        rank: COORDINATOR,
                        source: rank,
                        expected: "ROWS",
                        got: other.tag(),
                    })
                }
            }
        }

        let grid = grid.finish()?;
        info!(
            "assembled {}x{} grid: {} requests, {} results, {} stops, {} blocks",
            grid.width(),
            grid.height(),
            tally.requests_sent,
            tally.results_received,
            tally.stops_sent,
            tally.blocks_received
        );
        Ok(Outcome::Assembled(Render {
            grid,
            report: RunReport {
                strategy: partitioner.strategy(),
                rows_by_rank,
                tally,
            },
        }))
    }
}

impl Process for Worker {
    fn run(self) -> Result<Outcome> {
        let Worker { mut comm } = self;
        let rank = comm.rank();
        let params = match comm.broadcast(COORDINATOR, Tag::Params, None)? {
            Message::Params(params) => params,
            other => {
                return Err(Error::UnexpectedMessage {
                    rank,
                    source: COORDINATOR,
                    expected: "PARAMS",
                    got: other.tag(),
                })
            }
        };

        let rows = params.row_computer()?;
        let computed = params.strategy.partitioner().work(&mut comm, &rows)?;
        debug!("rank {} computed {} rows", rank, computed.len());
        comm.gather(COORDINATOR, Message::Rows(computed.clone()))?;
        Ok(Outcome::Finished {
            rank,
            rows: computed,
        })
    }
}
