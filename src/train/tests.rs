//! End-to-end tests for the training loop

use super::*;
use crate::config::tests::SAMPLE;
use crate::config::RunConfig;
use crate::param::Parameter;
use crate::schedule::{build_schedule, StepBudget};
use ndarray::arr1;
use std::sync::atomic::Ordering;

/// Backend minimizing f(θ) = Σ θ², so grads are 2θ regardless of the batch.
struct QuadraticBackend;

impl Backend for QuadraticBackend {
    fn forward_backward(
        &mut self,
        params: &[Parameter],
        _batch: &MicroBatch,
    ) -> Result<BackwardPass, TrainError> {
        let loss = params
            .iter()
            .map(|p| p.data().iter().map(|&x| x * x).sum::<f32>())
            .sum();
        let grads = params.iter().map(|p| p.data().mapv(|x| 2.0 * x)).collect();
        Ok(BackwardPass { loss, grads })
    }
}

/// Backend failing on a chosen micro-batch.
struct FailingBackend {
    fail_at: usize,
    calls: usize,
    non_finite: bool,
}

impl Backend for FailingBackend {
    fn forward_backward(
        &mut self,
        params: &[Parameter],
        batch: &MicroBatch,
    ) -> Result<BackwardPass, TrainError> {
        if self.calls == self.fail_at {
            if self.non_finite {
                return Ok(BackwardPass {
                    loss: f32::NAN,
                    grads: params.iter().map(|p| p.data().clone()).collect(),
                });
            }
            return Err(TrainError::Step("device unavailable".to_string()));
        }
        self.calls += 1;
        QuadraticBackend.forward_backward(params, batch)
    }
}

/// Sink that only counts saves.
#[derive(Default)]
struct CountingSink {
    epochs: Vec<usize>,
}

impl CheckpointSink for CountingSink {
    fn save(&mut self, snapshot: &CheckpointSnapshot) -> Result<(), CheckpointError> {
        self.epochs.push(snapshot.epoch);
        Ok(())
    }
}

fn config_with(edits: &[(&str, &str)]) -> RunConfig {
    let mut doc = SAMPLE.to_string();
    for (from, to) in edits {
        doc = doc.replace(from, to);
    }
    RunConfig::from_toml_str(&doc).unwrap()
}

fn batches(count: usize) -> Vec<MicroBatch> {
    (0..count)
        .map(|_| MicroBatch::new(arr1(&[0.0]), arr1(&[0.0])))
        .collect()
}

fn params() -> Vec<Parameter> {
    vec![
        Parameter::from_vec(vec![1.0, -2.0]),
        Parameter::from_vec(vec![0.5]),
    ]
}

#[test]
fn two_epochs_with_partial_groups_take_six_optimizer_steps() {
    // 5 micro-batches with accumulation_steps = 2: two full groups plus one
    // partial flush per epoch.
    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 2"),
        ("checkpt_save_interval = 5", "checkpt_save_interval = 1"),
    ]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 5).unwrap();
    assert_eq!(orchestrator.phase(), RunPhase::Idle);

    let mut sink = CountingSink::default();
    let summary = orchestrator
        .run(&mut QuadraticBackend, &mut sink, |_| batches(5))
        .unwrap();

    assert_eq!(summary.optimizer_steps, 6);
    assert_eq!(summary.epochs_completed, 2);
    assert_eq!(summary.checkpoints_saved, 2);
    assert_eq!(sink.epochs, vec![0, 1]);
    assert_eq!(orchestrator.phase(), RunPhase::Completed);
    assert_eq!(orchestrator.global_step(), 6);
}

#[test]
fn final_lr_comes_from_the_last_schedule_step() {
    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 2"),
    ]);

    let budget = StepBudget {
        epochs: 2,
        batches_per_epoch: 5,
        accumulation_steps: 2,
    };
    let schedule = build_schedule(&config.scheduler, budget.total_steps(), budget).unwrap();

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 5).unwrap();
    let mut sink = CountingSink::default();
    orchestrator
        .run(&mut QuadraticBackend, &mut sink, |_| batches(5))
        .unwrap();

    // The sixth (last) update was applied with the schedule value at step 5
    assert!((orchestrator.current_lr() - schedule.at(5).lr).abs() < 1e-9);
}

#[test]
fn checkpoint_interval_five_saves_epochs_zero_and_five() {
    let config = config_with(&[("accumulation_steps = 4", "accumulation_steps = 1")]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 2).unwrap();
    let mut sink = CountingSink::default();
    orchestrator
        .run(&mut QuadraticBackend, &mut sink, |_| batches(2))
        .unwrap();

    assert_eq!(sink.epochs, vec![0, 5]);
}

#[test]
fn training_moves_parameters_toward_the_minimum() {
    let config = config_with(&[("accumulation_steps = 4", "accumulation_steps = 1")]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 4).unwrap();
    let before: f32 = orchestrator
        .params()
        .iter()
        .map(|p| p.data().iter().map(|&x| x.abs()).sum::<f32>())
        .sum();

    let mut sink = CountingSink::default();
    let summary = orchestrator
        .run(&mut QuadraticBackend, &mut sink, |_| batches(4))
        .unwrap();

    let after: f32 = orchestrator
        .params()
        .iter()
        .map(|p| p.data().iter().map(|&x| x.abs()).sum::<f32>())
        .sum();

    assert!(summary.final_avg_loss.is_finite());
    assert!(after < before, "|θ| did not shrink: {before} -> {after}");
}

#[test]
fn non_finite_loss_fails_the_run() {
    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 1"),
    ]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 3).unwrap();
    let mut backend = FailingBackend {
        fail_at: 2,
        calls: 0,
        non_finite: true,
    };
    let mut sink = CountingSink::default();

    let err = orchestrator
        .run(&mut backend, &mut sink, |_| batches(3))
        .unwrap_err();

    assert!(matches!(err, TrainError::NonFiniteLoss { epoch: 0, batch: 2, .. }));
    assert_eq!(orchestrator.phase(), RunPhase::Failed);
}

#[test]
fn backend_error_fails_the_run() {
    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 1"),
    ]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 3).unwrap();
    let mut backend = FailingBackend {
        fail_at: 0,
        calls: 0,
        non_finite: false,
    };
    let mut sink = CountingSink::default();

    let err = orchestrator
        .run(&mut backend, &mut sink, |_| batches(3))
        .unwrap_err();

    assert!(matches!(err, TrainError::Step(_)));
    assert_eq!(orchestrator.phase(), RunPhase::Failed);
    // Fail fast: nothing was persisted
    assert!(sink.epochs.is_empty());
}

#[test]
fn gradient_arity_mismatch_fails_the_run() {
    struct ShortBackend;
    impl Backend for ShortBackend {
        fn forward_backward(
            &mut self,
            _params: &[Parameter],
            _batch: &MicroBatch,
        ) -> Result<BackwardPass, TrainError> {
            Ok(BackwardPass {
                loss: 1.0,
                grads: vec![arr1(&[0.0, 0.0])],
            })
        }
    }

    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 1"),
    ]);
    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 3).unwrap();
    let mut sink = CountingSink::default();

    let err = orchestrator
        .run(&mut ShortBackend, &mut sink, |_| batches(3))
        .unwrap_err();

    assert!(matches!(
        err,
        TrainError::GradientArity { got: 1, expected: 2 }
    ));
    assert_eq!(orchestrator.phase(), RunPhase::Failed);
}

#[test]
fn stop_signal_cancels_without_an_optimizer_step() {
    let config = config_with(&[
        ("epochs = 10", "epochs = 2"),
        ("accumulation_steps = 4", "accumulation_steps = 1"),
    ]);

    let mut orchestrator = TrainingOrchestrator::new(&config, params(), 3).unwrap();
    orchestrator.stop_handle().store(true, Ordering::Relaxed);

    let mut sink = CountingSink::default();
    let err = orchestrator
        .run(&mut QuadraticBackend, &mut sink, |_| batches(3))
        .unwrap_err();

    assert!(matches!(err, TrainError::Cancelled));
    assert_eq!(orchestrator.phase(), RunPhase::Cancelled);
    assert_eq!(orchestrator.global_step(), 0);
}

#[test]
fn empty_step_budget_is_caught_at_construction() {
    // A budget with zero batches per epoch derives a 0-step schedule
    let config = config_with(&[]);
    let err = TrainingOrchestrator::new(&config, params(), 0).err().unwrap();
    assert!(matches!(err, TrainError::Schedule(_)));
}

#[test]
fn unsupported_optimizer_is_caught_at_construction() {
    let config = config_with(&[("type = \"adam\"", "type = \"lamb\"")]);
    let err = TrainingOrchestrator::new(&config, params(), 4).err().unwrap();
    assert!(matches!(err, TrainError::Optimizer(_)));
}
