//! Master/worker scheduling.  The coordinator keeps every worker busy
//! with exactly one row at a time: a worker that hands back a result
//! immediately gets the next unassigned row, or its stop signal once
//! the rows run out.  A slow row only ever holds up the worker that
//! drew it.
//!
//! Results come back in whatever order workers finish, so every result
//! carries its row index and the grid is written by index.

use log::{debug, trace};

use super::{Partitioner, Strategy, Tally, COORDINATOR};
use crate::error::{Error, Result};
use crate::grid::GridBuffer;
use crate::row::RowComputer;
use crate::topology::{Communicator, Message, Source, Tag};

/// Master/worker partitioning.
#[derive(Copy, Clone, Debug, Default)]
pub struct Dynamic;

/// Where a worker stands, as far as the protocol is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Holds a row and is computing it.
    Active,
    /// Waiting for its next assignment.
    Idle,
    /// Received its stop signal; gets nothing further.
    Done,
}

/// Coordinator-side bookkeeping for one run.
#[derive(Debug)]
struct Dispatcher {
    next_row: usize,
    height: usize,
    finished_workers: usize,
    states: Vec<WorkerState>,
}

impl Dispatcher {
    fn new(size: usize, height: usize) -> Self {
        Dispatcher {
            next_row: 0,
            height,
            finished_workers: 0,
            states: vec![WorkerState::Idle; size],
        }
    }

    fn workers(&self) -> usize {
        self.states.len() - 1
    }

    /// Gives `worker` the next row, or stops it if none are left.
    fn dispatch(&mut self, comm: &Communicator, worker: usize, tally: &mut Tally) -> Result<()> {
        if self.next_row < self.height {
            comm.send(worker, Message::WorkRequest { row: self.next_row })?;
            trace!("row {} -> rank {}", self.next_row, worker);
            self.states[worker] = WorkerState::Active;
            self.next_row += 1;
            tally.requests_sent += 1;
        } else {
            comm.send(worker, Message::StopSignal)?;
            debug!("rank {} stopped", worker);
            self.states[worker] = WorkerState::Done;
            self.finished_workers += 1;
            tally.stops_sent += 1;
        }
        Ok(())
    }
}

impl Partitioner for Dynamic {
    fn strategy(&self) -> Strategy {
        Strategy::Dynamic
    }

    fn rows_for(&self, _rank: usize, _size: usize, _height: usize) -> Option<Vec<usize>> {
        None
    }

    fn coordinate(
        &self,
        comm: &mut Communicator,
        rows: &RowComputer,
        grid: &mut GridBuffer,
        tally: &mut Tally,
    ) -> Result<Vec<usize>> {
        let height = grid.height();

        // Nobody to farm out to.
        if comm.size() == 1 {
            for y in 0..height {
                grid.write_row(y, &rows.compute(y))?;
            }
            return Ok((0..height).collect());
        }

        let mut dispatcher = Dispatcher::new(comm.size(), height);
        for worker in 1..comm.size() {
            dispatcher.dispatch(comm, worker, tally)?;
        }

        while dispatcher.finished_workers < dispatcher.workers() {
            let envelope = comm.recv(Source::Any, Some(Tag::Result))?;
            let source = envelope.source;
            if dispatcher.states[source] != WorkerState::Active {
                return Err(Error::UnexpectedMessage {
                    rank: comm.rank(),
                    source,
                    expected: "nothing",
                    got: envelope.message.tag(),
                });
            }
            match envelope.message {
                Message::WorkResult { row, values } => {
                    grid.write_row(row, &values)?;
                    tally.results_received += 1;
                }
                other => {
                    return Err(Error::UnexpectedMessage {
                        rank: comm.rank(),
                        source,
                        expected: "RESULT",
                        got: other.tag(),
                    })
                }
            }
            dispatcher.states[source] = WorkerState::Idle;
            dispatcher.dispatch(comm, source, tally)?;
        }
        Ok(vec![])
    }

    fn work(&self, comm: &mut Communicator, rows: &RowComputer) -> Result<Vec<usize>> {
        let mut computed = vec![];
        let mut state = WorkerState::Idle;
        while state != WorkerState::Done {
            let envelope = comm.recv(Source::Rank(COORDINATOR), None)?;
            state = match envelope.message {
                Message::StopSignal => WorkerState::Done,
                Message::WorkRequest { row } => {
                    let values = rows.compute(row);
                    comm.send(COORDINATOR, Message::WorkResult { row, values })?;
                    computed.push(row);
                    WorkerState::Idle
                }
                other => {
                    return Err(Error::UnexpectedMessage {
                        rank: comm.rank(),
                        source: COORDINATOR,
                        expected: "WORK or STOP",
                        got: other.tag(),
                    })
                }
            };
        }
        debug!("rank {} done after {} rows", comm.rank(), computed.len());
        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::MandelbrotSet;
    use crate::planes::PlaneMapper;
    use crate::topology::world;
    use crossbeam::thread;
    use num::Complex;

    fn computer(width: usize, height: usize) -> RowComputer {
        let plane = PlaneMapper::from_corners(
            width,
            height,
            Complex::new(-2.0, -1.0),
            Complex::new(1.0, 1.0),
        )
        .unwrap();
        RowComputer::new(plane, MandelbrotSet::new(30, 2.0), false, true)
    }

    #[test]
    fn one_worker_gets_every_row_in_turn_then_one_stop() {
        let rows = computer(5, 4);
        let mut ranks = world(2, None);
        let mut worker = ranks.pop().unwrap();
        let mut coordinator = ranks.pop().unwrap();

        thread::scope(|s| {
            let handle = s.spawn(|_| {
                let mut grid = GridBuffer::new(5, 4);
                let mut tally = Tally::default();
                Dynamic
                    .coordinate(&mut coordinator, &rows, &mut grid, &mut tally)
                    .unwrap();
                (grid, tally)
            });

            // Play the worker by hand to watch the exchange.
            for expected in 0..4 {
                let got = worker.recv(Source::Rank(0), None).unwrap();
                assert_eq!(got.message, Message::WorkRequest { row: expected });
                let values = rows.compute(expected);
                worker
                    .send(0, Message::WorkResult { row: expected, values })
                    .unwrap();
            }
            let got = worker.recv(Source::Rank(0), None).unwrap();
            assert_eq!(got.message, Message::StopSignal);

            let (grid, tally) = handle.join().unwrap();
            assert!(grid.is_complete());
            assert_eq!(tally.requests_sent, 4);
            assert_eq!(tally.results_received, 4);
            assert_eq!(tally.stops_sent, 1);
        })
        .unwrap();
    }

    #[test]
    fn surplus_workers_are_stopped_up_front() {
        let rows = computer(3, 2);
        let mut ranks = world(4, None);
        thread::scope(|s| {
            let mut coordinator = ranks.remove(0);
            let workers: Vec<_> = ranks
                .into_iter()
                .map(|mut comm| s.spawn(move |_| Dynamic.work(&mut comm, &rows).unwrap()))
                .collect();
            let mut grid = GridBuffer::new(3, 2);
            let mut tally = Tally::default();
            Dynamic
                .coordinate(&mut coordinator, &rows, &mut grid, &mut tally)
                .unwrap();
            let computed: usize = workers.into_iter().map(|h| h.join().unwrap().len()).sum();
            assert_eq!(computed, 2);
            assert_eq!(tally.stops_sent, 3);
            assert!(grid.finish().is_ok());
        })
        .unwrap();
    }

    #[test]
    fn lone_coordinator_computes_everything() {
        let rows = computer(4, 3);
        let mut comm = world(1, None).pop().unwrap();
        let mut grid = GridBuffer::new(4, 3);
        let mut tally = Tally::default();
        let own = Dynamic
            .coordinate(&mut comm, &rows, &mut grid, &mut tally)
            .unwrap();
        assert_eq!(own, vec![0, 1, 2]);
        assert_eq!(tally, Tally::default());
        assert!(grid.is_complete());
    }

    #[test]
    fn worker_rejects_stray_messages() {
        let rows = computer(2, 2);
        let mut ranks = world(2, None);
        let mut worker = ranks.pop().unwrap();
        let coordinator = ranks.pop().unwrap();
        thread::scope(|s| {
            s.spawn(move |_| coordinator.send(1, Message::Block(vec![])).unwrap());
            match Dynamic.work(&mut worker, &rows) {
                Err(Error::UnexpectedMessage { got: Tag::Block, .. }) => {}
                other => panic!("unexpected {:?}", other),
            }
        })
        .unwrap();
    }
}
