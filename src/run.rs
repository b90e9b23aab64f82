//! Starting a run.  [`render`] builds the world, starts one thread per
//! rank, lets each play its role to the end, and hands back what the
//! coordinator assembled.

use crossbeam::thread;
use log::info;

use crate::config::RenderParams;
use crate::error::{Error, Result};
use crate::partition::COORDINATOR;
use crate::role::{Outcome, Process, Render, Role};
use crate::topology::world;

/// Renders the grid `params` describes.
///
/// Parameters are checked before any rank starts.  The first error any
/// rank reports, in rank order, ends the render; a rank that panics is
/// reported as [`Error::RankPanicked`].
pub fn render(params: &RenderParams) -> Result<Render> {
    params.validate()?;
    info!(
        "rendering {}x{} on {} ranks with the {} strategy",
        params.width, params.height, params.workers, params.strategy
    );

    let ranks = world(params.workers, params.recv_timeout);
    let outcomes = thread::scope(|s| {
        let handles: Vec<_> = ranks
            .into_iter()
            .map(|comm| {
                let mine = if comm.rank() == COORDINATOR {
                    Some(params.clone())
                } else {
                    None
                };
                s.spawn(move |_| Role::for_rank(comm, mine)?.run())
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| handle.join().unwrap_or(Err(Error::RankPanicked(rank))))
            .collect::<Vec<_>>()
    })
    .map_err(|_| Error::RankPanicked(COORDINATOR))?;

    let mut assembled = None;
    for outcome in outcomes {
        if let Outcome::Assembled(render) = outcome? {
            assembled = Some(render);
        }
    }
    assembled.ok_or_else(|| Error::Config("no rank coordinated the run".to_string()))
}
