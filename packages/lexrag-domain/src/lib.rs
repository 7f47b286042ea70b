pub mod fault;
pub mod fusion;
pub mod payload;
pub mod status;

pub use fault::{Disposition, Fault, MAX_ATTEMPTS, dispose};
pub use fusion::{ScoredCandidate, reciprocal_rank_fusion};
pub use payload::{PayloadError, TaskPayload};
pub use status::TaskStatus;
