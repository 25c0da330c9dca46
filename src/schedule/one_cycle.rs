//! One-cycle learning-rate / momentum policy
//!
//! Learning rate rises from `lr_max / div_factor` to `lr_max` over the
//! warm-up phase, then anneals down to `lr_max / final_div_factor`. With
//! `three_phase`, the anneal first returns to the initial rate over a
//! window symmetric to the warm-up, then decays to the floor. Momentum,
//! when cycled, moves inversely to the learning rate between
//! `base_momentum` and `max_momentum`.

use super::AnnealStrategy;
use crate::config::SchedulerSettings;
use std::f32::consts::PI;

/// Schedule output for one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePoint {
    pub lr: f32,

    /// Momentum override; `None` when momentum cycling is disabled.
    pub momentum: Option<f32>,
}

/// A fixed-budget one-cycle schedule.
///
/// Stateless: `at(step)` is a pure function of `step`. Steps past the end
/// of the budget are clamped to the final value.
#[derive(Debug, Clone)]
pub struct OneCycle {
    lr_max: f32,
    initial_lr: f32,
    final_lr: f32,
    warmup_end: usize,
    mid_end: Option<usize>,
    last_step: usize,
    anneal: AnnealStrategy,
    momentum: Option<(f32, f32)>, // (base, max)
}

impl OneCycle {
    /// Build from validated settings. Callers go through
    /// [`super::build_schedule`], which checks the step budget first.
    pub(super) fn new(
        settings: &SchedulerSettings,
        anneal: AnnealStrategy,
        total_steps: usize,
    ) -> Self {
        let last_step = total_steps - 1;
        let lr_max = settings.lr_max as f32;
        let initial_lr = lr_max / settings.div_factor as f32;
        let final_lr = lr_max / settings.final_div_factor as f32;

        // Strictly inside (0, last_step) so the initial rate, the peak,
        // and the floor all get their own step
        let warmup_end = ((settings.pct_start * last_step as f64).round() as usize)
            .clamp(1, last_step - 1);

        let mid_end = if settings.three_phase && last_step >= 2 {
            let mid = (2 * warmup_end).min(last_step - 1);
            (mid > warmup_end).then_some(mid)
        } else {
            None
        };

        let momentum = settings
            .cycle_momentum
            .then_some((settings.base_momentum as f32, settings.max_momentum as f32));

        Self {
            lr_max,
            initial_lr,
            final_lr,
            warmup_end,
            mid_end,
            last_step,
            anneal,
            momentum,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.last_step + 1
    }

    /// Step index at which warm-up ends and `lr == lr_max`.
    pub fn warmup_end(&self) -> usize {
        self.warmup_end
    }

    /// Learning rate and momentum for the given optimizer step.
    pub fn at(&self, step: usize) -> SchedulePoint {
        let step = step.min(self.last_step);

        let (lr, momentum) = if step <= self.warmup_end {
            let t = fraction(step, 0, self.warmup_end);
            (
                self.interp(self.initial_lr, self.lr_max, t),
                self.momentum.map(|(base, max)| self.interp(max, base, t)),
            )
        } else if let Some(mid) = self.mid_end.filter(|&mid| step <= mid) {
            // Three-phase down-leg: back to the initial rate
            let t = fraction(step, self.warmup_end, mid);
            (
                self.interp(self.lr_max, self.initial_lr, t),
                self.momentum.map(|(base, max)| self.interp(base, max, t)),
            )
        } else {
            let (start, from_lr) = match self.mid_end {
                Some(mid) => (mid, self.initial_lr),
                None => (self.warmup_end, self.lr_max),
            };
            let t = fraction(step, start, self.last_step);
            let momentum = self.momentum.map(|(base, max)| match self.mid_end {
                // Momentum already returned to max in the down-leg
                Some(_) => max,
                None => self.interp(base, max, t),
            });
            (self.interp(from_lr, self.final_lr, t), momentum)
        };

        SchedulePoint { lr, momentum }
    }

    fn interp(&self, from: f32, to: f32, t: f32) -> f32 {
        match self.anneal {
            AnnealStrategy::Cos => to + (from - to) * 0.5 * (1.0 + (PI * t).cos()),
            AnnealStrategy::Linear => from + (to - from) * t,
        }
    }
}

fn fraction(step: usize, start: usize, end: usize) -> f32 {
    if end <= start {
        return 1.0;
    }
    (step - start) as f32 / (end - start) as f32
}
