//! # Task System Core Trait
//!
//! A [`Task`] is a unit of work executed on a worker thread of a
//! [`TaskManager`](super::TaskManager). Its output travels back to the thread
//! that owns the manager and is handed out by
//! [`process_completed_tasks`](super::TaskManager::process_completed_tasks).
//!
//! ## Task Lifecycle
//! 1. A task is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. If `process()` panics, the worker calls `fail()` instead
//! 4. The output is collected on the owning thread
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `Output` must be `Send` to be transferred back
//! - Tasks own or share (through `MtResource`) everything they touch

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should own all the data they need. Anything shared with the control
/// thread goes through a lock, and the task must not hold a write lock on a
/// value the control thread might wait for.
pub trait Task: Send {
    /// What the task hands back to the owning thread.
    type Output: Send;

    /// Performs the work. Runs on a worker thread.
    fn process(&self) -> Self::Output;

    /// Output reported when `process` panicked with the given message.
    ///
    /// Every published task yields exactly one output, so the manager can
    /// keep its in-flight bookkeeping straight even for failed work.
    fn fail(&self, reason: String) -> Self::Output;
}
