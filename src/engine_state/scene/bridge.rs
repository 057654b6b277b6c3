//! # Main-Thread Bridge
//!
//! Worker threads cannot read the world, so a job that needs the current set
//! of attached geometry sends a [`GeometryRequest`] and blocks on the reply.
//! The main thread answers every pending request once per frame, which means
//! a requesting worker waits at most one frame.

use std::sync::mpsc::{channel, Receiver, Sender};

use log::trace;

use crate::{
    engine_state::{scene::GeometrySet, voxels::chunk::ChunkCoord, voxels::world::World},
    error::{EngineError, EngineResult},
};

/// A worker's request for the visible geometry of one chunk.
pub struct GeometryRequest {
    chunk: ChunkCoord,
    reply: Sender<EngineResult<GeometrySet>>,
}

/// Worker-side handle used to issue geometry requests.
#[derive(Clone)]
pub struct GeometryRequester {
    sender: Sender<GeometryRequest>,
}

impl GeometryRequester {
    /// Asks the main thread for the visible geometry of `chunk` and blocks
    /// until it answers.
    ///
    /// # Errors
    /// Returns [`EngineError::BridgeClosed`] if the main thread went away, or
    /// whatever error the main thread answered with.
    pub fn request(&self, chunk: ChunkCoord) -> EngineResult<GeometrySet> {
        let (reply, response) = channel();
        self.sender
            .send(GeometryRequest { chunk, reply })
            .map_err(|_| EngineError::BridgeClosed)?;
        response.recv().map_err(|_| EngineError::BridgeClosed)?
    }
}

/// Main-thread end of the bridge.
pub struct MainThreadBridge {
    sender: Sender<GeometryRequest>,
    receiver: Receiver<GeometryRequest>,
    answered: u64,
}

impl MainThreadBridge {
    /// Creates a bridge with no pending requests.
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        MainThreadBridge {
            sender,
            receiver,
            answered: 0,
        }
    }

    /// A handle that workers can use to reach this bridge.
    pub fn requester(&self) -> GeometryRequester {
        GeometryRequester {
            sender: self.sender.clone(),
        }
    }

    /// Answers every request that arrived since the last call.
    ///
    /// # Returns
    /// The number of requests answered.
    pub fn answer_pending(&mut self, world: &World) -> usize {
        let mut count = 0;
        while let Ok(request) = self.receiver.try_recv() {
            let answer = world
                .visible_geometry(request.chunk)
                .ok_or(EngineError::ChunkNotLoaded(request.chunk));
            if request.reply.send(answer).is_err() {
                trace!("Geometry requester for {} went away", request.chunk);
            }
            count += 1;
        }
        self.answered += count as u64;
        count
    }

    /// Total number of requests answered.
    pub fn answered_count(&self) -> u64 {
        self.answered
    }
}

impl Default for MainThreadBridge {
    fn default() -> Self {
        Self::new()
    }
}
