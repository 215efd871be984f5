use crate::error::Result;
use crate::pool::{CandidateStore, GenePool};
use crate::types::{CandidateRecord, PoolKey};

/// Result of asking a policy for the next candidate to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A candidate was written to the store and is ready for a worker.
    Ready(PoolKey),
    /// Nothing is eligible yet (e.g. too few evaluated parents); retry later.
    NotReady { reason: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Ready(_))
    }

    pub fn key(&self) -> Option<&PoolKey> {
        match self {
            FetchOutcome::Ready(key) => Some(key),
            FetchOutcome::NotReady { .. } => None,
        }
    }
}

/// Shared state a policy works on while the caller holds the pool lock.
pub struct PolicyContext<'a> {
    pub pool: &'a mut GenePool,
    pub store: &'a CandidateStore,
    /// Global iteration counter at the time of the call.
    pub iteration: u64,
}

/// Decision rule for producing, choosing and evicting candidates.
pub trait SelectionPolicy: Send {
    fn name(&self) -> &str;

    /// Registers the views the policy reads from on a freshly loaded pool.
    fn register_views(&mut self, pool: &mut GenePool);

    fn fetch_next(&mut self, ctx: &mut PolicyContext<'_>) -> Result<FetchOutcome>;

    /// Writes a new candidate into store and pool, evicting if at capacity.
    fn admit(&mut self, ctx: &mut PolicyContext<'_>, record: CandidateRecord) -> Result<PoolKey>;
}
