use super::solvers::traits::Problem;
use crate::core::{decode, Candidate, ObjectiveDirection, ParameterSpace, Score, TuneResult};
use crate::evaluation::Evaluator;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Tuning problem: a parameter space scored by running the executable
pub struct TuningProblem<'a> {
    space: &'a ParameterSpace,
    evaluator: &'a dyn Evaluator,
    direction: ObjectiveDirection,
    initial: Candidate,
    evaluations: AtomicUsize,
    unusable: AtomicUsize,
}

impl<'a> TuningProblem<'a> {
    pub fn new(
        space: &'a ParameterSpace,
        evaluator: &'a dyn Evaluator,
        direction: ObjectiveDirection,
    ) -> Self {
        Self {
            space,
            evaluator,
            direction,
            initial: space.default_candidate(),
            evaluations: 0.into(),
            unusable: 0.into(),
        }
    }

    /// Override the starting point used by local search
    pub fn with_initial(mut self, initial: Candidate) -> TuneResult<Self> {
        self.space.check_dimensions(&initial)?;
        self.initial = initial;
        Ok(self)
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    /// Evaluations issued so far
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Evaluations that came back as the sentinel
    pub fn unusable_evaluations(&self) -> usize {
        self.unusable.load(Ordering::Relaxed)
    }

    /// Decode, run and score one candidate
    pub fn evaluate(&self, candidate: &Candidate) -> TuneResult<Score> {
        let args = decode(self.space, candidate)?;
        let score = self.evaluator.evaluate(&args);
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        if !score.is_usable() {
            self.unusable.fetch_add(1, Ordering::Relaxed);
        }
        trace!(?args, %score, "evaluated candidate");
        Ok(score)
    }
}

impl Problem for TuningProblem<'_> {
    fn space(&self) -> &ParameterSpace {
        self.space
    }

    fn cost(&self, candidate: &Candidate) -> TuneResult<f64> {
        let score = self.evaluate(candidate)?;
        Ok(self.direction.cost(score))
    }

    fn initial_candidate(&self) -> Candidate {
        self.initial.clone()
    }

    fn score_of(&self, cost: f64) -> Score {
        self.direction.score(cost)
    }
}
