//! The world the ranks live in.  Every rank is a thread with a
//! [`Communicator`]: its rank, the size of the world, and blocking
//! point-to-point and collective message passing.  Ranks share no
//! memory; all they know about each other arrives through here.
//!
//! Each rank owns one inbound rendezvous channel fed by every peer, so
//! a send blocks until the receiver takes it.  Messages from different
//! peers arrive in no particular order, but messages from any one peer
//! arrive in the order they were sent.  A receive filtered by source or
//! tag parks whatever it passes over in a pending queue, which keeps
//! that per-peer order intact for later receives.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::trace;

use crate::config::RenderParams;
use crate::error::{Error, Result};

/// The kind of a message, used to filter receives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    /// Run parameters, broadcast from rank 0.
    Params,
    /// A row assignment.
    Work,
    /// A finished row.
    Result,
    /// The end of a worker's loop.
    Stop,
    /// A static strategy's rows, shipped in one piece.
    Block,
    /// The rows a rank computed, gathered at the end of a run.
    Rows,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Tag::Params => "PARAMS",
            Tag::Work => "WORK",
            Tag::Result => "RESULT",
            Tag::Stop => "STOP",
            Tag::Block => "BLOCK",
            Tag::Rows => "ROWS",
        };
        f.write_str(name)
    }
}

/// Everything ranks say to each other.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// The run parameters.
    Params(RenderParams),
    /// Compute this row and send it back.
    WorkRequest {
        /// Row index.
        row: usize,
    },
    /// A computed row.
    WorkResult {
        /// Row index.
        row: usize,
        /// One convergence value per pixel.
        values: Vec<f64>,
    },
    /// No more work.  Sent exactly once to each worker.
    StopSignal,
    /// The owned rows of a static strategy, in increasing row order,
    /// laid end to end.
    Block(Vec<f64>),
    /// The rows a rank computed.
    Rows(Vec<usize>),
}

impl Message {
    /// The tag this message travels under.
    pub fn tag(&self) -> Tag {
        match self {
            Message::Params(_) => Tag::Params,
            Message::WorkRequest { .. } => Tag::Work,
            Message::WorkResult { .. } => Tag::Result,
            Message::StopSignal => Tag::Stop,
            Message::Block(_) => Tag::Block,
            Message::Rows(_) => Tag::Rows,
        }
    }
}

/// A message and the rank that sent it.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// The sender.
    pub source: usize,
    /// The message.
    pub message: Message,
}

/// Which senders a receive accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Whoever sends first.
    Any,
    /// Only this rank.
    Rank(usize),
}

impl Source {
    fn admits(self, rank: usize) -> bool {
        match self {
            Source::Any => true,
            Source::Rank(r) => r == rank,
        }
    }
}

/// One rank's view of the world.
#[derive(Debug)]
pub struct Communicator {
    rank: usize,
    size: usize,
    inbox: Receiver<Envelope>,
    peers: Vec<Option<Sender<Envelope>>>,
    pending: VecDeque<Envelope>,
    timeout: Option<Duration>,
}

/// Builds a world of `size` ranks and returns their communicators,
/// indexed by rank.  With a `timeout`, a send or receive that waits
/// longer fails instead of blocking forever.
pub fn world(size: usize, timeout: Option<Duration>) -> Vec<Communicator> {
    let (senders, inboxes): (Vec<_>, Vec<_>) =
        (0..size).map(|_| channel::bounded::<Envelope>(0)).unzip();
    inboxes
        .into_iter()
        .enumerate()
        .map(|(rank, inbox)| Communicator {
            rank,
            size,
            inbox,
            peers: senders
                .iter()
                .enumerate()
                .map(|(peer, s)| if peer == rank { None } else { Some(s.clone()) })
                .collect(),
            pending: VecDeque::new(),
            timeout,
        })
        .collect()
}

impl Communicator {
    /// This rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of ranks in the world.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sends `message` to `dest`, blocking until `dest` receives it.
    pub fn send(&self, dest: usize, message: Message) -> Result<()> {
        let peer = match self.peers.get(dest) {
            None => {
                return Err(Error::NoSuchRank {
                    rank: dest,
                    size: self.size,
                })
            }
            Some(None) => return Err(Error::SelfAddressed(self.rank)),
            Some(Some(peer)) => peer,
        };
        trace!("rank {} -> {}: {}", self.rank, dest, message.tag());
        let envelope = Envelope {
            source: self.rank,
            message,
        };
        match self.timeout {
            None => peer
                .send(envelope)
                .map_err(|_| Error::Disconnected { rank: self.rank }),
            Some(waited) => peer.send_timeout(envelope, waited).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => Error::Timeout {
                    rank: self.rank,
                    waited,
                },
                SendTimeoutError::Disconnected(_) => Error::Disconnected { rank: self.rank },
            }),
        }
    }

    /// Receives the oldest message from `source` carrying `tag`, or any
    /// tag when `tag` is `None`.  Blocks until one arrives.
    pub fn recv(&mut self, source: Source, tag: Option<Tag>) -> Result<Envelope> {
        let wanted =
            |e: &Envelope| source.admits(e.source) && tag.map_or(true, |t| e.message.tag() == t);
        if let Some(i) = self.pending.iter().position(|e| wanted(e)) {
            if let Some(envelope) = self.pending.remove(i) {
                return Ok(envelope);
            }
        }
        loop {
            let envelope = self.pull()?;
            if wanted(&envelope) {
                trace!(
                    "rank {} <- {}: {}",
                    self.rank,
                    envelope.source,
                    envelope.message.tag()
                );
                return Ok(envelope);
            }
            self.pending.push_back(envelope);
        }
    }

    fn pull(&self) -> Result<Envelope> {
        match self.timeout {
            None => self
                .inbox
                .recv()
                .map_err(|_| Error::Disconnected { rank: self.rank }),
            Some(waited) => self.inbox.recv_timeout(waited).map_err(|e| match e {
                RecvTimeoutError::Timeout => Error::Timeout {
                    rank: self.rank,
                    waited,
                },
                RecvTimeoutError::Disconnected => Error::Disconnected { rank: self.rank },
            }),
        }
    }

    /// Collective: `root` passes `Some(message)` and every other rank
    /// passes `None`; every rank returns the root's message.  Non-root
    /// ranks only accept a message carrying `tag`.
    pub fn broadcast(&mut self, root: usize, tag: Tag, message: Option<Message>) -> Result<Message> {
        if self.rank == root {
            let message = message.ok_or_else(|| {
                Error::Config(format!("broadcast root {} has nothing to send", root))
            })?;
            for dest in (0..self.size).filter(|&d| d != root) {
                self.send(dest, message.clone())?;
            }
            Ok(message)
        } else {
            Ok(self.recv(Source::Rank(root), Some(tag))?.message)
        }
    }

    /// Collective: every rank contributes `message`.  The root gets
    /// every contribution ordered by rank; everyone else gets `None`.
    pub fn gather(&mut self, root: usize, message: Message) -> Result<Option<Vec<Message>>> {
        if self.rank != root {
            self.send(root, message)?;
            return Ok(None);
        }
        let tag = message.tag();
        let mut own = Some(message);
        let mut gathered = Vec::with_capacity(self.size);
        for source in 0..self.size {
            if source == root {
                if let Some(m) = own.take() {
                    gathered.push(m);
                }
            } else {
                gathered.push(self.recv(Source::Rank(source), Some(tag))?.message);
            }
        }
        Ok(Some(gathered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::thread;

    #[test]
    fn point_to_point_round_trip() {
        let mut ranks = world(2, None);
        let mut one = ranks.pop().unwrap();
        let zero = ranks.pop().unwrap();
        thread::scope(|s| {
            s.spawn(move |_| zero.send(1, Message::WorkRequest { row: 7 }).unwrap());
            let got = one.recv(Source::Rank(0), Some(Tag::Work)).unwrap();
            assert_eq!(got.source, 0);
            assert_eq!(got.message, Message::WorkRequest { row: 7 });
        })
        .unwrap();
    }

    #[test]
    fn filtered_receives_keep_per_sender_order() {
        let mut ranks = world(2, None);
        let mut one = ranks.pop().unwrap();
        let zero = ranks.pop().unwrap();
        thread::scope(|s| {
            s.spawn(move |_| {
                zero.send(1, Message::WorkRequest { row: 1 }).unwrap();
                zero.send(1, Message::WorkRequest { row: 2 }).unwrap();
                zero.send(1, Message::StopSignal).unwrap();
            });
            // Skipping ahead to the stop parks both requests.
            let stop = one.recv(Source::Rank(0), Some(Tag::Stop)).unwrap();
            assert_eq!(stop.message, Message::StopSignal);
            let first = one.recv(Source::Any, None).unwrap();
            let second = one.recv(Source::Any, None).unwrap();
            assert_eq!(first.message, Message::WorkRequest { row: 1 });
            assert_eq!(second.message, Message::WorkRequest { row: 2 });
        })
        .unwrap();
    }

    #[test]
    fn messaging_yourself_or_strangers_fails() {
        let ranks = world(2, None);
        match ranks[0].send(0, Message::StopSignal) {
            Err(Error::SelfAddressed(0)) => {}
            other => panic!("unexpected {:?}", other),
        }
        match ranks[0].send(5, Message::StopSignal) {
            Err(Error::NoSuchRank { rank: 5, size: 2 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn silent_peer_times_out() {
        let mut ranks = world(2, Some(Duration::from_millis(20)));
        match ranks[0].recv(Source::Any, None) {
            Err(Error::Timeout { rank: 0, .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn abandoned_rank_sees_disconnect() {
        let mut ranks = world(3, None);
        let mut zero = ranks.remove(0);
        drop(ranks);
        match zero.recv(Source::Any, None) {
            Err(Error::Disconnected { rank: 0 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn broadcast_and_gather() {
        let ranks = world(4, None);
        let params = RenderParams {
            width: 3,
            height: 5,
            ..RenderParams::default()
        };
        thread::scope(|s| {
            let handles: Vec<_> = ranks
                .into_iter()
                .map(|mut comm| {
                    let params = params.clone();
                    s.spawn(move |_| {
                        let mine = if comm.rank() == 0 {
                            Some(Message::Params(params))
                        } else {
                            None
                        };
                        let got = comm.broadcast(0, Tag::Params, mine).unwrap();
                        let rows = Message::Rows(vec![comm.rank()]);
                        (got, comm.gather(0, rows).unwrap())
                    })
                })
                .collect();
            for (rank, handle) in handles.into_iter().enumerate() {
                let (got, gathered) = handle.join().unwrap();
                assert_eq!(got, Message::Params(params.clone()));
                if rank == 0 {
                    let expected: Vec<_> = (0..4).map(|r| Message::Rows(vec![r])).collect();
                    assert_eq!(gathered, Some(expected));
                } else {
                    assert_eq!(gathered, None);
                }
            }
        })
        .unwrap();
    }
}
