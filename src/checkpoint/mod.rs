//! Oracle persistence: versioned checkpoint directories with metadata,
//! a `latest` link, and pruning.

mod manager;
mod metadata;

pub use manager::{CheckpointData, CheckpointManager, CheckpointManagerConfig};
pub use metadata::{BoardParameters, CheckpointMetadata, CheckpointMetrics};
