//! Bounded-concurrency executor for independent fallible tasks.
//!
//! A fixed number of worker threads pull tasks from a shared queue until it
//! is drained. Each task's outcome is captured (errors and panics alike), so
//! one failing task never stops its siblings; the caller judges the result.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex};
use std::thread;

/// A named zero-argument operation submitted to the pool.
pub struct Task<'a, T, E> {
    label: String,
    run: Box<dyn FnOnce() -> Result<T, E> + Send + 'a>,
}

impl<'a, T, E> Task<'a, T, E> {
    pub fn new<F>(label: impl Into<String>, run: F) -> Self
    where
        F: FnOnce() -> Result<T, E> + Send + 'a,
    {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }
}

/// Why a task did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum TaskError<E> {
    #[error("{0}")]
    Failed(E),
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Outcome of one task, tagged with its submission index and label.
#[derive(Debug)]
pub struct TaskResult<T, E> {
    pub index: usize,
    pub label: String,
    pub outcome: Result<T, TaskError<E>>,
}

impl<T, E> TaskResult<T, E> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Fixed-size worker pool. Holds no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct TaskPool {
    concurrency: usize,
}

impl TaskPool {
    /// Create a pool with `concurrency` workers (values below 1 are raised to 1).
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every task exactly once and blocks until all have finished.
    ///
    /// Results come back in submission order regardless of completion order.
    /// At most `concurrency` tasks run at the same time; an empty task list
    /// returns immediately without spawning workers.
    pub fn run<'a, T, E>(&self, tasks: Vec<Task<'a, T, E>>) -> Vec<TaskResult<T, E>>
    where
        T: Send,
        E: Send,
    {
        let count = tasks.len();
        if count == 0 {
            return Vec::new();
        }

        let queue: Mutex<VecDeque<(usize, Task<'a, T, E>)>> =
            Mutex::new(tasks.into_iter().enumerate().collect());
        let (tx, rx) = mpsc::channel::<TaskResult<T, E>>();
        let num_workers = self.concurrency.min(count);
        tracing::debug!("task pool: {} task(s) on {} worker(s)", count, num_workers);

        thread::scope(|scope| {
            for _ in 0..num_workers {
                let tx = tx.clone();
                let queue = &queue;
                scope.spawn(move || loop {
                    let next = match queue.lock() {
                        Ok(mut q) => q.pop_front(),
                        // A poisoned lock still holds a consistent queue.
                        Err(poisoned) => poisoned.into_inner().pop_front(),
                    };
                    let Some((index, task)) = next else {
                        break;
                    };
                    let Task { label, run } = task;
                    let outcome = match panic::catch_unwind(AssertUnwindSafe(run)) {
                        Ok(Ok(v)) => Ok(v),
                        Ok(Err(e)) => Err(TaskError::Failed(e)),
                        Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
                    };
                    if tx.send(TaskResult { index, label, outcome }).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut results: Vec<TaskResult<T, E>> = rx.into_iter().collect();
        results.sort_by_key(|r| r.index);
        results
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
