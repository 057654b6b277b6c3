//! # Task Management System
//!
//! A fixed pool of worker threads for long-running, read-mostly work such as
//! terrain generation, lighting passes and collision-shape construction.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work that can be executed asynchronously
//! - `JobHandle`: The pollable single-slot result of a task
//! - `TaskChannel`: Communication channel between the main thread and one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and complete the job handle the task carries
//! 4. The worker reports back on its channel so the manager knows it is free
//! 5. `process_completed_tasks()` and `process_queued_tasks()` run once per frame
//!
//! ## Blocking
//! A task may block its worker while it waits for the main thread to answer a
//! scene request. The main thread answers those requests every frame, so a
//! blocked worker is released after at most one frame.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(4);
//!
//! let (task, handle) = ChunkGenerationTask::new(generator, coords);
//! task_manager.publish_task(Box::new(task));
//!
//! // In the game loop:
//! task_manager.process_completed_tasks();
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info, trace};
use task::Task;

/// What a worker reports after running a task.
#[derive(Debug)]
struct TaskReport {
    name: &'static str,
    panicked: bool,
}

/// A communication channel between the main thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from main thread to worker
/// - `report_receiver`: Receives completion reports from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread (kept alive by this struct)
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task>>,
    report_receiver: Receiver<TaskReport>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
/// - `published`: Number of tasks accepted since creation
/// - `completed`: Number of tasks workers reported back
///
/// # Implementation Notes
/// - Main thread only: publishing and polling happen in the frame loop
/// - Drop-safe: dropping the manager closes every task channel, which ends
///   the worker loops
/// - Panic-safe: a panicking task is logged and its job handle reports
///   `Cancelled`; the worker keeps running
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task>>,
    current_channel: usize,
    published: u64,
    completed: u64,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Kept at 1 so a task blocked on a main-thread request never delays a
/// second task behind it on the same worker.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. With zero workers
    ///   every task stays queued.
    pub fn new(num_workers: usize) -> Self {
        info!(
            "Starting {} workers, available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        let channels = (0..num_workers)
            .filter_map(|index| match Self::spawn_worker(index) {
                Ok(channel) => Some(channel),
                Err(err) => {
                    error!("Failed to spawn worker {}: {}", index, err);
                    None
                }
            })
            .collect();

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            published: 0,
            completed: 0,
        }
    }

    fn spawn_worker(index: usize) -> std::io::Result<TaskChannel> {
        let (task_tx, task_rx) = channel::<Box<dyn Task>>();
        let (report_tx, report_rx) = channel::<TaskReport>();

        let task_closure = move || {
            while let Ok(task) = task_rx.recv() {
                let name = task.name();
                let panicked = panic::catch_unwind(AssertUnwindSafe(|| task.process())).is_err();
                if panicked {
                    error!("Task {} panicked on worker {}", name, index);
                }
                if report_tx.send(TaskReport { name, panicked }).is_err() {
                    break;
                }
            }
        };

        let worker = thread::Builder::new()
            .name(format!("voxel-worker-{}", index))
            .spawn(task_closure)?;

        Ok(TaskChannel {
            task_sender: task_tx,
            report_receiver: report_rx,
            num_tasks_in_flight: 0,
            _worker: worker,
        })
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was successfully sent to the worker
    /// - `Err(task)` if the send failed (e.g., worker disconnected)
    fn try_send_task(
        &mut self,
        task: Box<dyn Task>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel that can accept a new task.
    ///
    /// Round-robin starting from the last used channel, skipping channels that
    /// have reached `MAX_TASKS_IN_FLIGHT`.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel % self.channels.len();
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// The task will be executed as soon as a worker becomes available, or
    /// queued if all workers are busy.
    ///
    /// # Returns
    /// - `true` if the task was immediately scheduled on an available worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task>) -> bool {
        self.published += 1;
        trace!("Publishing task {}", task.name());

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to workers that have become available.
    ///
    /// Processes tasks in FIFO order and stops at the first task that can't
    /// be scheduled.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Channel is disconnected, put task back and stop processing
                    self.queued_tasks.push_front(task);
                    break;
                }
            }
        }
    }

    /// Collects completion reports from the workers.
    ///
    /// Must be called on the main thread, typically once per frame.
    ///
    /// # Returns
    /// The number of tasks that finished since the last call.
    pub fn process_completed_tasks(&mut self) -> usize {
        let mut finished = 0;
        for channel in &mut self.channels {
            while let Ok(report) = channel.report_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                finished += 1;
                if !report.panicked {
                    trace!("Task {} completed", report.name);
                }
            }
        }
        self.completed += finished as u64;
        finished
    }

    /// Number of tasks accepted since creation.
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Number of tasks workers reported as finished.
    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    /// Number of tasks waiting for a worker.
    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }
}
