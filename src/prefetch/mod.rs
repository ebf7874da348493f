//! Prefetch Module
//!
//! Speculative background population of the cache for predicted keys.

mod ledger;
mod scheduler;

pub use ledger::{PredictionLedger, MAX_PENDING_PER_USER};
pub use scheduler::{
    PrefetchContext, PrefetchError, PrefetchJob, PrefetchReport, PrefetchScheduler, PREFETCHED_TAG,
};
