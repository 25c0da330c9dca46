//! The training-run state machine
//!
//! Single logical thread of control: epochs iterate micro-batches, each
//! micro-batch is a blocking forward+backward call into the backend, and
//! optimizer/scheduler steps are strictly sequential. Any collaborator
//! error halts the run in `Failed`; there is no automatic retry, since a
//! training step cannot be retried without state rollback.

use crate::config::RunConfig;
use crate::optim::{build_optimizer, Optimizer, OptimizerError};
use crate::param::Parameter;
use crate::schedule::{build_schedule, OneCycle, ScheduleError, StepBudget};
use crate::train::accumulate::AccumulationController;
use crate::train::batch::MicroBatch;
use crate::train::checkpoint::{
    CheckpointError, CheckpointPolicy, CheckpointSink, CheckpointSnapshot,
};
use ndarray::Array1;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Where the run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Training,
    Checkpointing,
    Completed,
    Failed,
    Cancelled,
}

/// Result of one forward+backward pass in the backend.
pub struct BackwardPass {
    pub loss: f32,

    /// One gradient buffer per parameter, in parameter order.
    pub grads: Vec<Array1<f32>>,
}

/// The numerical-computation collaborator.
///
/// A call is synchronous from the orchestrator's point of view; whatever
/// parallelism the device uses stays behind this trait.
pub trait Backend {
    fn forward_backward(
        &mut self,
        params: &[Parameter],
        batch: &MicroBatch,
    ) -> Result<BackwardPass, TrainError>;
}

/// Training-run errors.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Optimizer(#[from] OptimizerError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("non-finite loss {loss} at epoch {epoch}, micro-batch {batch}")]
    NonFiniteLoss {
        loss: f32,
        epoch: usize,
        batch: usize,
    },

    #[error("backend produced {got} gradient buffers for {expected} parameters")]
    GradientArity { got: usize, expected: usize },

    #[error("training step failed: {0}")]
    Step(String),

    #[error("run cancelled by stop signal")]
    Cancelled,
}

/// What a completed run looked like.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub epochs_completed: usize,
    pub optimizer_steps: u64,
    pub final_avg_loss: f32,
    pub checkpoints_saved: usize,
}

/// Drives the epoch / micro-batch loop for one run.
///
/// Owns the parameters and every stateful runtime object built from the
/// config: optimizer state, schedule cursor, accumulation buffers. All of
/// it is dropped with the orchestrator at the end of the run.
pub struct TrainingOrchestrator {
    run_name: String,
    epochs: usize,
    params: Vec<Parameter>,
    optimizer: Box<dyn Optimizer>,
    schedule: OneCycle,
    controller: AccumulationController,
    policy: CheckpointPolicy,
    phase: RunPhase,
    global_step: u64,
    stop: Arc<AtomicBool>,
}

impl TrainingOrchestrator {
    /// Build every runtime object from a validated config.
    ///
    /// `batches_per_epoch` comes from the external data loader and fixes
    /// the schedule's step budget; all factory errors surface here, before
    /// any training step runs.
    pub fn new(
        config: &RunConfig,
        params: Vec<Parameter>,
        batches_per_epoch: usize,
    ) -> Result<Self, TrainError> {
        let optimizer = build_optimizer(&config.optimizer)?;

        let budget = StepBudget {
            epochs: config.training.epochs,
            batches_per_epoch,
            accumulation_steps: config.data.accumulation_steps,
        };
        let schedule = build_schedule(&config.scheduler, budget.total_steps(), budget)?;

        let param_lens: Vec<usize> = params.iter().map(Parameter::len).collect();
        let controller = AccumulationController::new(
            config.data.accumulation_steps,
            config.optimizer.clip_grad_norm as f32,
            &param_lens,
        );

        Ok(Self {
            run_name: config.global.name.clone(),
            epochs: config.training.epochs,
            params,
            optimizer,
            schedule,
            controller,
            policy: CheckpointPolicy::new(config.training.checkpt_save_interval),
            phase: RunPhase::Idle,
            global_step: 0,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Learning rate most recently applied by the schedule.
    pub fn current_lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Handle for requesting cooperative cancellation. Checked at
    /// micro-batch granularity.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run the full training loop.
    ///
    /// `batch_fn` yields the micro-batches of each epoch. The run ends in
    /// `Completed`, or in `Failed`/`Cancelled` with the corresponding
    /// error; a failed run is not resumable through this orchestrator.
    pub fn run<B, S, F, I>(
        &mut self,
        backend: &mut B,
        sink: &mut S,
        batch_fn: F,
    ) -> Result<RunSummary, TrainError>
    where
        B: Backend + ?Sized,
        S: CheckpointSink + ?Sized,
        F: Fn(usize) -> I,
        I: IntoIterator<Item = MicroBatch>,
    {
        self.phase = RunPhase::Training;
        let mut checkpoints_saved = 0;
        let mut final_avg_loss = 0.0;

        for epoch in 0..self.epochs {
            let mut total_loss = 0.0;
            let mut seen = 0usize;

            for (batch_idx, batch) in batch_fn(epoch).into_iter().enumerate() {
                if self.stop.load(Ordering::Relaxed) {
                    // In-flight accumulation must not leak into a later run
                    self.controller.discard();
                    self.phase = RunPhase::Cancelled;
                    return Err(TrainError::Cancelled);
                }

                let pass = match backend.forward_backward(&self.params, &batch) {
                    Ok(pass) => pass,
                    Err(e) => return self.fail(e),
                };

                if !pass.loss.is_finite() {
                    return self.fail(TrainError::NonFiniteLoss {
                        loss: pass.loss,
                        epoch,
                        batch: batch_idx,
                    });
                }
                if pass.grads.len() != self.params.len() {
                    return self.fail(TrainError::GradientArity {
                        got: pass.grads.len(),
                        expected: self.params.len(),
                    });
                }

                total_loss += pass.loss;
                seen += 1;

                if self.controller.observe_microbatch(&pass.grads) {
                    self.apply_update();
                }
            }

            // Flush a partial final group so its gradient signal is kept
            self.apply_update();

            final_avg_loss = if seen > 0 {
                total_loss / seen as f32
            } else {
                0.0
            };

            if self.policy.should_save(epoch) {
                self.phase = RunPhase::Checkpointing;
                let snapshot = CheckpointSnapshot::capture(
                    &self.run_name,
                    epoch,
                    self.global_step,
                    self.optimizer.lr(),
                    &self.params,
                );
                if let Err(e) = sink.save(&snapshot) {
                    return self.fail(e.into());
                }
                checkpoints_saved += 1;
                self.phase = RunPhase::Training;
            }
        }

        self.phase = RunPhase::Completed;
        Ok(RunSummary {
            epochs_completed: self.epochs,
            optimizer_steps: self.global_step,
            final_avg_loss,
            checkpoints_saved,
        })
    }

    /// Clip, apply the scheduled lr/momentum, and take one optimizer step.
    /// No-op when nothing is accumulated.
    fn apply_update(&mut self) {
        if self.controller.flush(&mut self.params).is_none() {
            return;
        }

        let point = self.schedule.at(self.global_step as usize);
        self.optimizer.set_lr(point.lr);
        if let Some(momentum) = point.momentum {
            self.optimizer.set_momentum(momentum);
        }

        self.optimizer.step(&mut self.params);
        self.optimizer.zero_grad(&mut self.params);
        self.global_step += 1;
    }

    fn fail<T>(&mut self, err: TrainError) -> Result<T, TrainError> {
        self.phase = RunPhase::Failed;
        Err(err)
    }
}
