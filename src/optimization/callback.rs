use super::solvers::traits::OptimizationCallback;
use crate::core::{decode, Candidate, ObjectiveDirection, ParameterSpace, TuneResult};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Iteration result for tracking optimization progress
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    pub iteration: u32,
    pub cost: f64,
}

/// Callback for tracking and logging tuning progress
pub struct TuningCallback<'a> {
    label: String,
    space: &'a ParameterSpace,
    direction: ObjectiveDirection,
    time_budget: Option<Duration>,
    started: Instant,
    history: Vec<IterationResult>,
    best_cost: f64,
}

impl<'a> TuningCallback<'a> {
    pub fn new(label: impl Into<String>, space: &'a ParameterSpace, direction: ObjectiveDirection) -> Self {
        Self {
            label: label.into(),
            space,
            direction,
            time_budget: None,
            started: Instant::now(),
            history: Vec::new(),
            best_cost: f64::INFINITY,
        }
    }

    /// Ask the solver to stop once this much wall-clock time has passed
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        self.time_budget = budget;
        self
    }

    /// Get iteration history
    pub fn history(&self) -> &[IterationResult] {
        &self.history
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl OptimizationCallback for TuningCallback<'_> {
    fn on_iteration(&mut self, iteration: u32, candidate: &Candidate, cost: f64) -> TuneResult<()> {
        self.history.push(IterationResult { iteration, cost });

        if cost < self.best_cost {
            self.best_cost = cost;
            let args = decode(self.space, candidate)?;
            info!(
                solver = %self.label,
                iteration,
                score = %self.direction.score(cost),
                ?args,
                "new best"
            );
        } else {
            debug!(
                solver = %self.label,
                iteration,
                best = %self.direction.score(self.best_cost),
                "no improvement"
            );
        }

        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.time_budget
            .is_some_and(|budget| self.started.elapsed() >= budget)
    }
}
