//! # Task Management System
//!
//! A small thread pool for executing work off the control thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: Central coordinator for task distribution and worker management
//! - `Task`: A unit of work executed on a worker, producing one output
//! - `TaskChannel`: Communication channel between the owning thread and one worker
//!
//! Each worker owns a dedicated channel pair. Tasks are distributed round-robin
//! to workers that hold fewer than `queue_depth` tasks; the rest wait in a FIFO
//! queue on the owning thread until [`TaskManager::process_queued_tasks`] finds
//! room. Outputs are collected with [`TaskManager::process_completed_tasks`],
//! which never blocks.
//!
//! A panicking task does not take its worker down: the panic is caught at the
//! task boundary and turned into an output through [`Task::fail`].
//!
//! ## Example Usage
//! ```rust
//! use voxel_chunks::task_management::{task::Task, TaskManager};
//!
//! struct Square(u32);
//!
//! impl Task for Square {
//!     type Output = u32;
//!     fn process(&self) -> u32 {
//!         self.0 * self.0
//!     }
//!     fn fail(&self, _reason: String) -> u32 {
//!         0
//!     }
//! }
//!
//! let mut task_manager = TaskManager::new("square", 2, 1);
//! task_manager.publish_task(Box::new(Square(3)));
//!
//! let mut outputs = Vec::new();
//! while outputs.is_empty() {
//!     task_manager.process_queued_tasks();
//!     outputs.extend(task_manager.process_completed_tasks());
//! }
//! assert_eq!(outputs, vec![9]);
//! task_manager.shutdown();
//! ```

pub mod task;

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use task::Task;

/// A boxed task producing `O`.
pub type BoxedTask<O> = Box<dyn Task<Output = O>>;

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks to the worker
/// - `result_receiver`: Receives outputs from the worker
/// - `num_tasks_in_flight`: Tasks sent but not yet answered
/// - `worker`: Handle to the worker thread, taken on shutdown
pub struct TaskChannel<O> {
    task_sender: Sender<BoxedTask<O>>,
    result_receiver: Receiver<O>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Not thread-safe itself: one owning thread publishes tasks and drains
/// results. Dropping the manager shuts the workers down and waits for the
/// tasks they are currently running.
pub struct TaskManager<O: Send + 'static> {
    name: String,
    channels: Vec<TaskChannel<O>>,
    /// Set on shutdown; workers skip the tasks still buffered in their channel.
    stopping: Arc<AtomicBool>,
    queued_tasks: VecDeque<BoxedTask<O>>,
    current_channel: usize,
    queue_depth: usize,
}

impl<O: Send + 'static> TaskManager<O> {
    /// Creates a pool of `num_workers` threads.
    ///
    /// # Arguments
    /// * `name` - Prefix of the worker thread names, also used in log output
    /// * `num_workers` - Number of worker threads to create
    /// * `queue_depth` - Maximum number of tasks a single worker holds at once
    ///
    /// A worker whose thread cannot be spawned is logged and left out.
    pub fn new(name: &str, num_workers: usize, queue_depth: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);
        let stopping = Arc::new(AtomicBool::new(false));

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<BoxedTask<O>>();
            let (result_tx, result_rx) = channel::<O>();

            let stopping = stopping.clone();
            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    if stopping.load(Ordering::Acquire) {
                        break;
                    }
                    let result = panic::catch_unwind(AssertUnwindSafe(|| task.process()))
                        .unwrap_or_else(|payload| {
                            let reason = panic_message(payload.as_ref());
                            error!("Task panicked: {}", reason);
                            task.fail(reason)
                        });
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = match thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(task_closure)
            {
                Ok(worker) => worker,
                Err(e) => {
                    error!("Failed to spawn {} worker {}: {}", name, index, e);
                    continue;
                }
            };

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }

        info!(
            "Started {} pool with {} workers (queue depth {})",
            name,
            channels.len(),
            queue_depth.max(1)
        );

        TaskManager {
            name: name.to_string(),
            channels,
            stopping,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            queue_depth: queue_depth.max(1),
        }
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// Returns the task back when the worker is gone so it can be requeued.
    fn try_send_task(&mut self, task: BoxedTask<O>, channel_idx: usize) -> Result<(), BoxedTask<O>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds a worker that can accept another task, round-robin from the
    /// last used one.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < self.queue_depth)
    }

    /// Publishes a task for execution.
    ///
    /// Returns `true` if the task went straight to a worker, `false` if it was
    /// queued because every worker is at its queue depth.
    pub fn publish_task(&mut self, task: BoxedTask<O>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    warn!("{} worker {} is disconnected", self.name, channel_idx);
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

    /// Moves queued tasks to workers while any has room. FIFO order.
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

    /// Collects every output that is ready. Never blocks.
    pub fn process_completed_tasks(&mut self) -> Vec<O> {
        let mut results = Vec::new();
        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
                results.push(result);
            }
        }
        results
    }

    /// Tasks waiting for a free worker.
    pub fn queued_len(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks sent to workers whose outputs have not been collected yet.
    pub fn in_flight(&self) -> usize {
        self.channels.iter().map(|channel| channel.num_tasks_in_flight).sum()
    }

    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Stops every worker after its current task and waits for it.
    ///
    /// Tasks buffered in a worker's channel (up to `queue_depth - 1`) are
    /// skipped, as are tasks in the pool queue. Uncollected outputs are
    /// dropped. Publishing afterwards only queues.
    pub fn shutdown(&mut self) {
        if self.channels.is_empty() {
            return;
        }
        let dropped = self.queued_tasks.len();
        self.queued_tasks.clear();
        self.stopping.store(true, Ordering::Release);

        let workers: Vec<_> = self
            .channels
            .drain(..)
            .filter_map(|mut channel| channel.worker.take())
            .collect();
        // All senders are gone now, so each worker leaves its receive loop.
        for worker in workers {
            if worker.join().is_err() {
                warn!("{} worker exited with a panic", self.name);
            }
        }
        self.current_channel = 0;
        debug!("Stopped {} pool, dropped {} queued tasks", self.name, dropped);
    }
}

impl<O: Send + 'static> Drop for TaskManager<O> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
