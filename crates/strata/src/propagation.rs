// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded background propagation of cache writes.
//!
//! A [`Propagator`] owns one bounded FIFO queue and exactly one consumer task.
//! Producers suspend while the queue is full; nothing is ever dropped. The
//! consumer applies jobs in submission order and logs failed jobs instead of
//! reporting them, since the producer has already returned by then.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_store::{Error, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default number of jobs a propagation queue holds before producers wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// A bounded job queue drained by a single background task.
pub struct Propagator<J> {
    name: Arc<str>,
    sender: Mutex<Option<mpsc::Sender<J>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<J> fmt::Debug for Propagator<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagator")
            .field("name", &self.name)
            .field("open", &self.sender.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<J: Send + 'static> Propagator<J> {
    /// Creates the queue and spawns its consumer on the current tokio runtime.
    ///
    /// `handler` is applied to every job in order. A capacity of zero is treated
    /// as one.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start<H, F>(name: impl Into<Arc<str>>, capacity: usize, handler: H) -> Self
    where
        H: Fn(J) -> F + Send + Sync + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let (sender, mut receiver) = mpsc::channel(capacity.max(1));

        let worker_name = Arc::clone(&name);
        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                if let Err(error) = handler(job).await {
                    tracing::warn!(cache.name = %worker_name, error = %error, "background cache write failed");
                }
            }
            tracing::debug!(cache.name = %worker_name, "propagation queue drained");
        });

        tracing::debug!(cache.name = %name, capacity, "propagation queue started");

        Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Submits a job, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] once the propagator has been stopped.
    pub async fn enqueue(&self, job: J) -> Result<()> {
        let sender = self.sender.lock().clone().ok_or(Error::Closed)?;
        if sender.send(job).await.is_err() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Submits a job without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] once the propagator has been stopped, and a
    /// store error when the queue is full. The job is discarded in both cases.
    pub fn try_enqueue(&self, job: J) -> Result<()> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(Error::Closed)?;
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(Error::from_message(format!("{} queue is full", self.name))),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Error::Closed),
        }
    }

    /// Stops accepting jobs.
    ///
    /// With `drain` set, waits until every accepted job has been applied;
    /// otherwise the consumer is aborted and pending jobs are discarded.
    /// Stopping an already stopped propagator does nothing.
    pub async fn stop(&self, drain: bool) {
        drop(self.sender.lock().take());
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        if drain {
            if let Err(error) = worker.await {
                tracing::warn!(cache.name = %self.name, error = %error, "propagation worker terminated abnormally");
            }
        } else {
            worker.abort();
        }
        tracing::debug!(cache.name = %self.name, drain, "propagation queue stopped");
    }

    /// Returns `true` while jobs are accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.sender.lock().as_ref().is_some_and(|sender| !sender.is_closed())
    }

    /// Returns the name used in log events.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
