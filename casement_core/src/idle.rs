// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Idle jobs: resumable background work run between cycles.
//!
//! A job is a closure called with an [`IdleContext`] describing its time
//! budget. It returns `Ok(true)` to be called again later, `Ok(false)` when
//! finished, or an error. Jobs run strictly in FIFO order; a job asking to be
//! resumed keeps its place at the head of the queue.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;

use crate::error::JobError;
use crate::id::{IdAllocator, JobId};

/// A boxed idle job.
pub type JobFn = Box<dyn FnMut(&mut IdleContext) -> Result<bool, JobError>>;

/// What a job sees while it runs.
pub struct IdleContext {
    remaining: Duration,
    queued: Vec<JobFn>,
}

impl fmt::Debug for IdleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleContext")
            .field("remaining", &self.remaining)
            .field("queued", &self.queued.len())
            .finish()
    }
}

impl IdleContext {
    pub(crate) fn new(remaining: Duration) -> Self {
        Self {
            remaining,
            queued: Vec::new(),
        }
    }

    /// Time left in the idle pass when the job was called.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Queues a follow-up job behind everything already queued.
    pub fn queue(
        &mut self,
        job: impl FnMut(&mut Self) -> Result<bool, JobError> + 'static,
    ) {
        self.queued.push(Box::new(job));
    }
}

struct Job {
    id: JobId,
    run: JobFn,
}

/// The outcome of running the job at the head of the queue.
#[derive(Debug)]
pub(crate) enum Step {
    /// The job asked to be called again and stays at the head.
    Resume,
    /// The job finished and was dequeued.
    Done,
    /// The job failed and was dequeued.
    Failed(JobId, JobError),
}

/// A FIFO of idle jobs.
#[derive(Default)]
pub struct IdleQueue {
    jobs: VecDeque<Job>,
    ids: IdAllocator,
}

impl fmt::Debug for IdleQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleQueue")
            .field("len", &self.jobs.len())
            .field("ids", &self.ids)
            .finish()
    }
}

impl IdleQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a job and returns its id.
    pub fn push(
        &mut self,
        run: impl FnMut(&mut IdleContext) -> Result<bool, JobError> + 'static,
    ) -> JobId {
        self.push_boxed(Box::new(run))
    }

    /// Appends an already boxed job and returns its id.
    pub fn push_boxed(&mut self, run: JobFn) -> JobId {
        let id = JobId(self.ids.allocate());
        self.jobs.push_back(Job { id, run });
        id
    }

    /// Number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns whether no jobs are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Returns the id of the job that will run next.
    #[must_use]
    pub fn front(&self) -> Option<JobId> {
        self.jobs.front().map(|job| job.id)
    }

    /// Runs one step of the head job with `remaining` time.
    ///
    /// Jobs queued from inside the step are appended after it returns; the
    /// second value counts them.
    pub(crate) fn step(&mut self, remaining: Duration) -> Option<(Step, usize)> {
        let job = self.jobs.front_mut()?;
        let mut cx = IdleContext::new(remaining);
        let result = (job.run)(&mut cx);
        let step = match result {
            Ok(true) => Step::Resume,
            Ok(false) => {
                self.jobs.pop_front();
                Step::Done
            }
            Err(e) => {
                let id = job.id;
                self.jobs.pop_front();
                Step::Failed(id, e)
            }
        };
        let queued = cx.queued.len();
        for run in cx.queued {
            self.push_boxed(run);
        }
        Some((step, queued))
    }
}
