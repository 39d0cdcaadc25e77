//! Execution contexts for change callbacks.
//!
//! The watcher's own thread never decides where a callback runs; it hands the
//! callback to a [`DeliveryContext`]. [`Immediate`] runs it on the watcher
//! thread. [`CallbackQueue`] parks it until the owning thread drains the
//! queue, the way an interactive front end would run it on its main loop.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// A unit of work handed to a delivery context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where change callbacks run.
pub trait DeliveryContext: Send + Sync {
    fn deliver(&self, job: Job);
}

/// Runs jobs synchronously on the delivering thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl DeliveryContext for Immediate {
    fn deliver(&self, job: Job) {
        job();
    }
}

/// Jobs wait here until the owner calls [`run_pending`](Self::run_pending)
/// or [`run_next`](Self::run_next).
#[derive(Clone)]
pub struct CallbackQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

impl CallbackQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Run every job queued so far on the calling thread.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one job and run it. Returns whether a job ran.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => {
                job();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for CallbackQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryContext for CallbackQueue {
    fn deliver(&self, job: Job) {
        // Cannot fail: the queue owns a receiver.
        let _ = self.tx.send(job);
    }
}
