//! Bounded-parallel batch writes
//!
//! Independent records are written concurrently, never more than the
//! pool's limit at once. Results come back in input order.

use crate::diagnostic::{DiagnosticParser, InvalidPropertyParser};
use crate::payload::WritePayload;
use crate::writer::{AdaptiveWriter, WriteOutcome};
use futures::stream::{self, StreamExt};
use recon_client::{CancelSignal, StoreClient};
use std::sync::Arc;

/// Default number of writes in flight
pub const DEFAULT_CONCURRENCY: usize = 5;

/// One record to create
#[derive(Debug, Clone, PartialEq)]
pub struct WriteJob {
    /// Target collection identifier
    pub collection: String,
    /// Record payload
    pub payload: WritePayload,
}

impl WriteJob {
    /// Create job
    pub fn new(collection: impl Into<String>, payload: WritePayload) -> Self {
        Self {
            collection: collection.into(),
            payload,
        }
    }
}

/// Pool statistics for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records written
    pub succeeded: usize,
    /// Records that failed, cancelled ones included
    pub failed: usize,
    /// Network writes issued in total
    pub attempts: u64,
}

impl BatchStats {
    /// Tally outcomes
    #[must_use]
    pub fn of(outcomes: &[WriteOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut stats, outcome| {
            match outcome {
                Ok(ok) => {
                    stats.succeeded += 1;
                    stats.attempts += u64::from(ok.attempts);
                }
                Err(failure) => {
                    stats.failed += 1;
                    stats.attempts += u64::from(failure.attempts);
                }
            }
            stats
        })
    }
}

/// Runs adaptive writes with bounded parallelism
#[derive(Debug, Clone)]
pub struct WritePool<C, P = InvalidPropertyParser> {
    writer: Arc<AdaptiveWriter<C, P>>,
    concurrency: usize,
}

impl<C: StoreClient, P: DiagnosticParser> WritePool<C, P> {
    /// Create pool over a shared writer
    #[inline]
    #[must_use]
    pub fn new(writer: Arc<AdaptiveWriter<C, P>>) -> Self {
        Self {
            writer,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// With writes-in-flight limit; at least one
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Writes-in-flight limit
    #[inline]
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Create every job, returning one outcome per job in input order
    ///
    /// Once `cancel` fires, jobs not yet started fail as cancelled and
    /// in-flight ones stop retrying. Records already created stay created.
    pub async fn create_all(
        &self,
        jobs: Vec<WriteJob>,
        cancel: &CancelSignal,
    ) -> Vec<WriteOutcome> {
        let total = jobs.len();
        tracing::debug!(jobs = total, concurrency = self.concurrency, "starting batch write");

        let mut indexed: Vec<(usize, WriteOutcome)> = stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                let outcome = self
                    .writer
                    .create_with_cancel(&job.collection, job.payload, cancel)
                    .await;
                (index, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let outcomes: Vec<WriteOutcome> = indexed.into_iter().map(|(_, outcome)| outcome).collect();
        let stats = BatchStats::of(&outcomes);
        tracing::info!(
            jobs = total,
            succeeded = stats.succeeded,
            failed = stats.failed,
            attempts = stats.attempts,
            "batch write finished"
        );
        outcomes
    }
}
