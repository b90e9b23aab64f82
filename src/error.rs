// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type shared by every rank.  Configuration problems are
//! raised before any rank starts; everything else is a broken message
//! exchange or a defect in the distribution logic, and ends the run.

use std::time::Duration;

use failure::Fail;

use crate::topology::Tag;

/// Everything that can end a render early.
#[derive(Debug, Fail)]
pub enum Error {
    /// The run parameters cannot describe a render.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(String),

    /// A message was addressed to a rank outside the world.
    #[fail(display = "rank {} does not exist in a world of {}", rank, size)]
    NoSuchRank {
        /// The rank that was addressed.
        rank: usize,
        /// The size of the world.
        size: usize,
    },

    /// A rank tried to message itself, which would block it forever.
    #[fail(display = "rank {} tried to message itself", _0)]
    SelfAddressed(usize),

    /// The channel to or from a peer was closed while `rank` was using it.
    #[fail(display = "rank {}: peer hung up", rank)]
    Disconnected {
        /// The rank that noticed.
        rank: usize,
    },

    /// A receive waited longer than the configured timeout.
    #[fail(display = "rank {}: nothing received after {:?}", rank, waited)]
    Timeout {
        /// The rank that was waiting.
        rank: usize,
        /// How long it waited.
        waited: Duration,
    },

    /// A rank received a message the protocol does not allow at that point.
    #[fail(
        display = "rank {}: expected {} from rank {}, got {}",
        rank, expected, source, got
    )]
    UnexpectedMessage {
        /// The receiving rank.
        rank: usize,
        /// The sender.
        source: usize,
        /// What the protocol allows here.
        expected: &'static str,
        /// What actually arrived.
        got: Tag,
    },

    /// A row was delivered to the grid a second time.
    #[fail(display = "row {} was written twice", _0)]
    RowRewritten(usize),

    /// A row index past the bottom of the grid.
    #[fail(display = "row {} is outside a grid of height {}", row, height)]
    RowOutOfRange {
        /// The offending row.
        row: usize,
        /// The grid height.
        height: usize,
    },

    /// A row of the wrong length was delivered to the grid.
    #[fail(display = "row {} has {} values, expected {}", row, got, width)]
    RowWidth {
        /// The offending row.
        row: usize,
        /// The number of values received.
        got: usize,
        /// The grid width.
        width: usize,
    },

    /// The grid was frozen before every row arrived.
    #[fail(display = "grid is missing {} of {} rows", missing, height)]
    IncompleteGrid {
        /// Rows never written.
        missing: usize,
        /// The grid height.
        height: usize,
    },

    /// A rank's thread panicked.
    #[fail(display = "rank {} panicked", _0)]
    RankPanicked(usize),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
