//! Checkpoint cadence and persistence seam
//!
//! The policy only decides *when* to save; serialization goes through the
//! [`CheckpointSink`] collaborator. A JSON file sink is provided for runs
//! that don't bring their own persistence layer.

use crate::param::Parameter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Decides, per epoch, whether state should be persisted.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointPolicy {
    interval: usize,
}

impl CheckpointPolicy {
    /// Create a policy saving every `interval` epochs. The interval comes
    /// from a validated config, so it is at least 1.
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn should_save(&self, epoch: usize) -> bool {
        epoch % self.interval == 0
    }
}

/// Serializable model/optimizer state captured at an epoch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSnapshot {
    pub run_name: String,
    pub epoch: usize,
    pub global_step: u64,
    pub lr: f32,
    pub params: Vec<Vec<f32>>,
}

impl CheckpointSnapshot {
    pub fn capture(
        run_name: &str,
        epoch: usize,
        global_step: u64,
        lr: f32,
        params: &[Parameter],
    ) -> Self {
        Self {
            run_name: run_name.to_string(),
            epoch,
            global_step,
            lr,
            params: params.iter().map(|p| p.data().to_vec()).collect(),
        }
    }
}

/// Checkpoint persistence errors.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// External persistence collaborator.
pub trait CheckpointSink {
    fn save(&mut self, snapshot: &CheckpointSnapshot) -> Result<(), CheckpointError>;
}

/// Sink writing one JSON file per saved epoch.
#[derive(Debug, Clone)]
pub struct JsonCheckpointSink {
    dir: PathBuf,
}

impl JsonCheckpointSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("checkpoint_epoch_{epoch}.json"))
    }
}

impl CheckpointSink for JsonCheckpointSink {
    fn save(&mut self, snapshot: &CheckpointSnapshot) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|e| CheckpointError::Write {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.checkpoint_path(snapshot.epoch);
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json).map_err(|e| CheckpointError::Write { path, source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_one_saves_every_epoch() {
        let policy = CheckpointPolicy::new(1);
        for epoch in 0..10 {
            assert!(policy.should_save(epoch));
        }
    }

    #[test]
    fn interval_five_saves_every_fifth_epoch() {
        let policy = CheckpointPolicy::new(5);
        for epoch in 0..20 {
            assert_eq!(policy.should_save(epoch), epoch % 5 == 0);
        }
    }

    #[test]
    fn json_sink_round_trips_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonCheckpointSink::new(dir.path());

        let params = vec![Parameter::from_vec(vec![1.0, 2.0])];
        let snapshot = CheckpointSnapshot::capture("test-run", 3, 42, 1e-4, &params);
        sink.save(&snapshot).unwrap();

        let text = fs::read_to_string(sink.checkpoint_path(3)).unwrap();
        let restored: CheckpointSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.run_name, "test-run");
        assert_eq!(restored.epoch, 3);
        assert_eq!(restored.global_step, 42);
        assert_eq!(restored.params, vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn json_sink_write_failure_is_reported() {
        let mut sink = JsonCheckpointSink::new("/proc/grafo-not-writable");
        let snapshot = CheckpointSnapshot::capture("run", 0, 0, 1e-4, &[]);
        assert!(matches!(
            sink.save(&snapshot),
            Err(CheckpointError::Write { .. })
        ));
    }
}
