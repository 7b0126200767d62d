//! Per-lineage growth state and the single stochastic step

use crate::random::SimRng;

use super::event::BranchEvent;
use super::tree::GrowthParams;

/// What one stochastic step decided for the growing lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The clock advanced (by an increment or through a regime shift);
    /// keep stepping.
    Continue,
    /// Speciation fired at the current clock time.
    Speciation,
    /// Extinction fired at the current clock time.
    Extinction,
    /// The lineage survived to the global horizon.
    HorizonReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Speciation,
    Extinction,
    RateShift,
}

/// Mutable regime state for one growing lineage.
///
/// Initialized from the regime of the node the lineage grows from and
/// mutated in place by [`LineageState::advance`]. A rate shift rewrites the
/// regime fields here and raises `pending_shift`; the shift only becomes a
/// stored [`BranchEvent`] when the next speciation or extinction creates a
/// node to anchor it to.
#[derive(Debug, Clone)]
pub struct LineageState {
    /// Lineage clock, in absolute tree time.
    pub cur_time: f64,
    /// Absolute time the current regime took effect.
    pub event_time: f64,
    pub lambda_init: f64,
    pub lambda_shift: f64,
    pub mu: f64,
    pub pending_shift: bool,
}

impl LineageState {
    /// State for a lineage growing from a node at `time` under `regime`.
    pub fn from_regime(time: f64, regime: &BranchEvent) -> Self {
        Self {
            cur_time: time,
            event_time: regime.time(),
            lambda_init: regime.lambda_init(),
            lambda_shift: regime.lambda_shift(),
            mu: regime.mu_init(),
            pending_shift: false,
        }
    }

    /// Instantaneous speciation rate at the current clock.
    pub fn speciation_rate(&self) -> f64 {
        let elapsed = self.cur_time - self.event_time;
        self.lambda_init * (self.lambda_shift * elapsed).exp()
    }

    /// Advances the lineage by one stochastic step.
    ///
    /// Draws a waiting time against the combined speciation + extinction +
    /// shift hazard, treating all three rates as constant over the next
    /// `inc` of clock time. A waiting time inside the increment resolves to
    /// an event; otherwise the clock advances by `inc`, clamped so the
    /// final step lands exactly on the horizon.
    pub fn advance(&mut self, params: &GrowthParams, rng: &mut SimRng) -> StepOutcome {
        let lambda = self.speciation_rate();
        // Shifts stop firing past the cutoff age; with the -1 default the
        // cutoff is already behind the clock and shifts never fire.
        let shift_rate = if self.cur_time >= params.max_time_for_event {
            0.0
        } else {
            params.event_rate
        };
        let total = lambda + self.mu + shift_rate;
        let dt = rng.exponential(total);
        if dt < params.inc {
            self.cur_time += dt;
            match draw_event_kind(lambda, self.mu, total, rng) {
                EventKind::Speciation => StepOutcome::Speciation,
                EventKind::Extinction => StepOutcome::Extinction,
                EventKind::RateShift => {
                    self.apply_shift(params, rng);
                    StepOutcome::Continue
                }
            }
        } else if self.cur_time + params.inc < params.max_time {
            self.cur_time += params.inc;
            StepOutcome::Continue
        } else {
            self.cur_time = params.max_time;
            StepOutcome::HorizonReached
        }
    }

    /// Replaces the regime with freshly drawn parameters taking effect now.
    /// A shift already pending is overwritten; only the most recent shift
    /// before the next speciation or extinction survives.
    fn apply_shift(&mut self, params: &GrowthParams, rng: &mut SimRng) {
        // Shift draws are always linear uniforms, r before eps; the
        // log-scale option applies to the root draw only.
        let r = rng.uniform_range(params.rmin, params.rmax);
        let eps = rng.uniform_range(params.epsmin, params.epsmax);
        self.event_time = self.cur_time;
        self.lambda_init = r / (1.0 - eps);
        self.mu = eps * self.lambda_init;
        self.pending_shift = true;
    }
}

/// Resolves which hazard fired, by a single uniform draw against the
/// cumulative thresholds: speciation, then extinction, then shift.
fn draw_event_kind(lambda: f64, mu: f64, total: f64, rng: &mut SimRng) -> EventKind {
    let u = rng.uniform();
    if u <= lambda / total {
        EventKind::Speciation
    } else if u <= (lambda + mu) / total {
        EventKind::Extinction
    } else {
        EventKind::RateShift
    }
}
