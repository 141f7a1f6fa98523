use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

pub mod article;
pub mod dedup;
pub mod embedding;
pub mod fetch;
pub mod normalize;
pub mod sync;
pub mod topics;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ZMQMessage {
    Fetch(FetchSelector),
    Process(ProcessOptions),
    SyncConfig,
    Stats,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum FetchSelector {
    All,
    /// Feed URL or source name.
    Source(String),
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Include articles that already went through the pipeline.
    #[serde(default)]
    pub reprocess: bool,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Process-wide flag preventing overlapping pipeline runs.
#[derive(Debug, Default)]
pub struct ProcessingGuard {
    active: AtomicBool,
}

/// Held while a run is active; dropping it releases the guard.
#[derive(Debug)]
pub struct ProcessingClaim<'a> {
    guard: &'a ProcessingGuard,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_claim(&self) -> Option<ProcessingClaim<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingClaim { guard: self })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for ProcessingClaim<'_> {
    fn drop(&mut self) {
        self.guard.active.store(false, Ordering::Release);
    }
}

/// Run `job` unless another run holds `guard`.
///
/// Returns `Ok(None)` when the job was skipped. The guard is released after
/// the job whether it succeeded or not.
pub fn run_with_processing_guard<F, T>(
    guard: &ProcessingGuard,
    stage: &str,
    job: F,
) -> Result<Option<T>, ()>
where
    F: FnOnce() -> Result<T, ()>,
{
    let Some(_claim) = guard.try_claim() else {
        log::warn!("Skipping {stage}: processing already active (skipped_because_processing_active=1)");
        return Ok(None);
    };

    job().map(Some)
}
