pub mod layout;
pub mod hasher;
pub mod store;
pub mod lock;
pub mod gene_pool;
pub mod subset;
pub mod run_log;

pub use hasher::pool_key;
pub use layout::RunLayout;
pub use store::CandidateStore;
pub use lock::{PoolLock, PoolLockGuard};
pub use gene_pool::{GenePool, Members, SubsetId};
pub use subset::{Predicate, SubsetPool};
pub use run_log::{LogEntry, RunLog};
