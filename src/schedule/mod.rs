//! Learning-rate / momentum schedules
//!
//! The scheduler factory turns the `[scheduler]` config section plus the
//! run's step budget into a [`OneCycle`] schedule. The schedule is pure:
//! `at(step)` depends only on `step`, and the orchestrator queries it in
//! strictly increasing step order.

mod one_cycle;

pub use one_cycle::{OneCycle, SchedulePoint};

use crate::config::SchedulerSettings;
use thiserror::Error;

/// How the optimizer-step budget of a run is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    pub epochs: usize,
    pub batches_per_epoch: usize,
    pub accumulation_steps: usize,
}

impl StepBudget {
    /// Total optimizer steps: `epochs * ceil(batches / accumulation_steps)`.
    ///
    /// The ceiling accounts for the flush of a partial final group at each
    /// epoch end.
    pub fn total_steps(&self) -> usize {
        self.epochs * self.batches_per_epoch.div_ceil(self.accumulation_steps)
    }
}

/// Annealing shape of the one-cycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnealStrategy {
    Cos,
    Linear,
}

/// Scheduler factory errors.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("unsupported scheduler type '{0}' (known types: one-cycle)")]
    UnsupportedScheduler(String),

    #[error("unsupported anneal strategy '{0}' (known strategies: cos, linear)")]
    UnsupportedAnneal(String),

    #[error(
        "total_steps {given} does not match epochs * ceil(batches / accumulation_steps) = {expected}"
    )]
    InconsistentTotalSteps { given: usize, expected: usize },

    #[error("one-cycle schedule needs at least 3 steps to hold its endpoints, got {0}")]
    TooFewSteps(usize),
}

/// Build a one-cycle schedule from validated settings.
///
/// `total_steps` is checked against the budget it must have been derived
/// from; an inconsistent value is a configuration error, caught before any
/// training step runs.
pub fn build_schedule(
    settings: &SchedulerSettings,
    total_steps: usize,
    budget: StepBudget,
) -> Result<OneCycle, ScheduleError> {
    if settings.kind != "one-cycle" {
        return Err(ScheduleError::UnsupportedScheduler(settings.kind.clone()));
    }

    let expected = budget.total_steps();
    if total_steps != expected {
        return Err(ScheduleError::InconsistentTotalSteps {
            given: total_steps,
            expected,
        });
    }
    // With fewer than 3 steps the warm-up start, the peak, and the final
    // floor cannot all be distinct steps
    if total_steps < 3 {
        return Err(ScheduleError::TooFewSteps(total_steps));
    }

    let anneal = match settings.anneal_strategy.as_str() {
        "cos" => AnnealStrategy::Cos,
        "linear" => AnnealStrategy::Linear,
        other => return Err(ScheduleError::UnsupportedAnneal(other.to_string())),
    };

    Ok(OneCycle::new(settings, anneal, total_steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn settings() -> SchedulerSettings {
        SchedulerSettings {
            kind: "one-cycle".to_string(),
            lr_max: 1e-3,
            pct_start: 0.3,
            anneal_strategy: "cos".to_string(),
            cycle_momentum: true,
            base_momentum: 0.85,
            max_momentum: 0.95,
            div_factor: 25.0,
            final_div_factor: 1e4,
            three_phase: false,
        }
    }

    fn budget(total: usize) -> StepBudget {
        StepBudget {
            epochs: total,
            batches_per_epoch: 1,
            accumulation_steps: 1,
        }
    }

    #[test]
    fn step_budget_uses_ceiling_division() {
        let budget = StepBudget {
            epochs: 2,
            batches_per_epoch: 5,
            accumulation_steps: 2,
        };
        // 2 full groups + 1 partial flush per epoch
        assert_eq!(budget.total_steps(), 6);
    }

    #[test]
    fn unknown_scheduler_type_is_rejected() {
        let mut s = settings();
        s.kind = "plateau".to_string();
        assert!(matches!(
            build_schedule(&s, 10, budget(10)),
            Err(ScheduleError::UnsupportedScheduler(name)) if name == "plateau"
        ));
    }

    #[test]
    fn unknown_anneal_strategy_is_rejected() {
        let mut s = settings();
        s.anneal_strategy = "exp".to_string();
        assert!(matches!(
            build_schedule(&s, 10, budget(10)),
            Err(ScheduleError::UnsupportedAnneal(name)) if name == "exp"
        ));
    }

    #[test]
    fn inconsistent_total_steps_is_rejected() {
        let err = build_schedule(&settings(), 11, budget(10)).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::InconsistentTotalSteps {
                given: 11,
                expected: 10
            }
        ));
    }

    #[test]
    fn consistent_total_steps_builds() {
        let schedule = build_schedule(&settings(), 10, budget(10)).unwrap();
        assert_eq!(schedule.total_steps(), 10);
    }

    #[test]
    fn budgets_too_small_for_both_endpoints_are_rejected() {
        // 2 steps cannot hold the initial rate, the peak, and the floor
        for total in [0, 1, 2] {
            assert!(matches!(
                build_schedule(&settings(), total, budget(total)),
                Err(ScheduleError::TooFewSteps(n)) if n == total
            ));
        }
        assert!(build_schedule(&settings(), 3, budget(3)).is_ok());
    }
}
