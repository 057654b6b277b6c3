//! # Task System Core Types
//!
//! This module defines the unit of background work and the single-slot handle
//! the main thread uses to observe its outcome.
//!
//! ## Task Lifecycle
//! 1. A concrete task is created together with a `JobHandle` via [`job_channel`]
//! 2. The task is scheduled with `TaskManager::publish_task()`
//! 3. The task's `process()` method runs on a worker thread and completes its `JobSender`
//! 4. The main thread polls the `JobHandle` once per frame and never blocks on it
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - A task owns everything it reads; workers never see the live world
//! - The handle's completion flag is the one-shot channel itself, so observing
//!   it is atomic

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::error::EngineResult;

/// A unit of work executed on a background worker.
///
/// Implementations should own all the data they need, including the
/// [`JobSender`] their result is delivered through.
pub trait Task: Send {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Performs the work and completes the task's job handle.
    fn process(self: Box<Self>);
}

/// Worker side of a background job.
pub struct JobSender<T> {
    sender: Sender<EngineResult<T>>,
}

impl<T> JobSender<T> {
    /// Delivers the job's outcome to its handle.
    ///
    /// A handle that was dropped in the meantime (for example because its
    /// chunk was unloaded) simply discards the result.
    pub fn complete(self, result: EngineResult<T>) {
        if self.sender.send(result).is_err() {
            log::trace!("Job finished after its handle was dropped");
        }
    }
}

/// Observable state of a background job.
#[derive(Debug)]
pub enum JobPoll<T> {
    /// The job has not produced a result yet.
    Running,
    /// The job ran to completion, successfully or not.
    Finished(EngineResult<T>),
    /// The worker went away without producing a result.
    Cancelled,
}

/// Main-thread side of a background job.
///
/// Dropping the handle abandons the result.
#[derive(Debug)]
pub struct JobHandle<T> {
    receiver: Receiver<EngineResult<T>>,
}

impl<T> JobHandle<T> {
    /// Checks whether the job has finished without blocking.
    ///
    /// A handle must be discarded once it reports `Finished` or `Cancelled`.
    pub fn poll(&self) -> JobPoll<T> {
        match self.receiver.try_recv() {
            Ok(result) => JobPoll::Finished(result),
            Err(TryRecvError::Empty) => JobPoll::Running,
            Err(TryRecvError::Disconnected) => JobPoll::Cancelled,
        }
    }
}

/// Creates the two ends of a background job.
pub fn job_channel<T>() -> (JobSender<T>, JobHandle<T>) {
    let (sender, receiver) = channel();
    (JobSender { sender }, JobHandle { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_handle_reports_each_state() {
        let (sender, handle) = job_channel::<u32>();
        assert!(matches!(handle.poll(), JobPoll::Running));
        sender.complete(Ok(7));
        assert!(matches!(handle.poll(), JobPoll::Finished(Ok(7))));

        let (sender, handle) = job_channel::<u32>();
        sender.complete(Err(EngineError::BridgeClosed));
        assert!(matches!(
            handle.poll(),
            JobPoll::Finished(Err(EngineError::BridgeClosed))
        ));

        let (sender, handle) = job_channel::<u32>();
        drop(sender);
        assert!(matches!(handle.poll(), JobPoll::Cancelled));
    }
}
