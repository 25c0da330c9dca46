//! Training-run orchestration
//!
//! Composes the config, optimizer, schedule, accumulation, and checkpoint
//! components into the epoch / micro-batch loop. The model forward+backward
//! pass and checkpoint persistence stay behind the [`Backend`] and
//! [`CheckpointSink`] collaborator traits.

mod accumulate;
mod batch;
mod checkpoint;
mod orchestrator;

#[cfg(test)]
mod tests;

pub use accumulate::AccumulationController;
pub use batch::MicroBatch;
pub use checkpoint::{
    CheckpointError, CheckpointPolicy, CheckpointSink, CheckpointSnapshot, JsonCheckpointSink,
};
pub use orchestrator::{
    Backend, BackwardPass, RunPhase, RunSummary, TrainError, TrainingOrchestrator,
};
