use crate::core::{Candidate, ParameterSpace, Score, TuneResult};

#[derive(Clone, Debug)]
pub struct SolverResult {
    pub success: bool,
    pub cost: f64,
    pub iterations: u32,
    pub message: String,
    pub candidate: Candidate,
    pub cost_evals: usize,
}

/// Callback interface for optimization progress
pub trait OptimizationCallback {
    /// Called once per sweep / generation / iteration with the best-so-far
    fn on_iteration(&mut self, iteration: u32, candidate: &Candidate, cost: f64)
        -> TuneResult<()>;

    /// Check if optimization should stop early
    fn should_stop(&self) -> bool {
        false
    }
}

/// Core problem definition - just the essentials
pub trait Problem: Sync {
    /// The space candidates live in
    fn space(&self) -> &ParameterSpace;

    /// Evaluate cost for a candidate (runs the executable). Lower is better.
    ///
    /// Unusable evaluations cost `f64::INFINITY`; the only error is a
    /// candidate whose length does not match the space.
    fn cost(&self, candidate: &Candidate) -> TuneResult<f64>;

    /// Starting point for local search
    fn initial_candidate(&self) -> Candidate;

    /// Convert a cost back into the externally reported score
    fn score_of(&self, cost: f64) -> Score;

    fn num_params(&self) -> usize {
        self.space().len()
    }
}

/// Solver interface - takes problem and callback
pub trait Solver: Send {
    fn name(&self) -> &str;

    /// Run the search to termination, reporting progress through `callback`
    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> TuneResult<SolverResult>;
}

/// Index of the lowest cost, first one on ties. `None` for an empty slice.
pub(crate) fn argmin(costs: &[f64]) -> Option<usize> {
    (0..costs.len()).reduce(|best, i| if costs[i] < costs[best] { i } else { best })
}
