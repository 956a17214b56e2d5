use super::traits::{OptimizationCallback, Problem, Solver, SolverResult};
use crate::core::{discretize, Candidate, ParameterKind, TuneResult};
use tracing::debug;

/// Coordinate pattern search with a halving step size.
///
/// Each sweep tries every categorical value and `current ± step * spec.step`
/// for every integer dimension, keeping any strictly better trial at once.
/// A sweep without improvement halves the step; the search ends when the
/// step drops below 1.
///
/// Integer moves are multiples of `spec.step`, so only values on that grid
/// around the starting point are reachable. With `min: 1, max: 100, step: 10`
/// and a start at 50, the value 37 is never tried; use `step: 1` for a search
/// that can end on any integer.
pub struct PatternSearch {
    max_iter: u32,
    initial_step: i64,
}

struct Incumbent {
    candidate: Candidate,
    cost: f64,
    cost_evals: usize,
}

impl Incumbent {
    /// Evaluate `trial` and adopt it on strict improvement.
    fn try_move(&mut self, problem: &dyn Problem, trial: Candidate) -> TuneResult<bool> {
        let cost = problem.cost(&trial)?;
        self.cost_evals += 1;
        if cost < self.cost {
            self.candidate = trial;
            self.cost = cost;
            return Ok(true);
        }
        Ok(false)
    }
}

impl PatternSearch {
    pub fn new(max_iter: u32) -> Self {
        Self {
            max_iter,
            initial_step: 10,
        }
    }

    /// Configure the starting step size (default: 10)
    pub fn with_initial_step(mut self, step: i64) -> Self {
        self.initial_step = step.max(1);
        self
    }

    fn sweep(
        &self,
        problem: &dyn Problem,
        incumbent: &mut Incumbent,
        step: i64,
    ) -> TuneResult<bool> {
        let mut improved = false;

        for (i, spec) in problem.space().iter().enumerate() {
            match &spec.kind {
                ParameterKind::Categorical { values } => {
                    for idx in 0..values.len() {
                        let trial = incumbent.candidate.with_component(i, idx as f64);
                        improved |= incumbent.try_move(problem, trial)?;
                    }
                }
                ParameterKind::Integer {
                    min,
                    max,
                    step: resolution,
                } => {
                    let delta = step.saturating_mul(*resolution);
                    for offset in [-delta, delta] {
                        // Recomputed per move: the first move may already have been taken.
                        let current = discretize(spec, incumbent.candidate.as_slice()[i]);
                        let moved = current.saturating_add(offset).clamp(*min, *max);
                        let trial = incumbent.candidate.with_component(i, moved as f64);
                        improved |= incumbent.try_move(problem, trial)?;
                    }
                }
            }
        }

        Ok(improved)
    }
}

impl Solver for PatternSearch {
    fn name(&self) -> &str {
        "PatternSearch"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> TuneResult<SolverResult> {
        let start = problem.initial_candidate();
        let cost = problem.cost(&start)?;
        let mut incumbent = Incumbent {
            candidate: start,
            cost,
            cost_evals: 1,
        };
        callback.on_iteration(0, &incumbent.candidate, incumbent.cost)?;

        let mut step = self.initial_step.max(1);
        let mut iterations = 0;

        while step >= 1 {
            if iterations >= self.max_iter {
                return Ok(SolverResult {
                    success: false,
                    cost: incumbent.cost,
                    iterations,
                    message: "Max iterations reached".into(),
                    candidate: incumbent.candidate,
                    cost_evals: incumbent.cost_evals,
                });
            }

            if callback.should_stop() {
                return Ok(SolverResult {
                    success: true,
                    cost: incumbent.cost,
                    iterations,
                    message: "Stopped by callback".into(),
                    candidate: incumbent.candidate,
                    cost_evals: incumbent.cost_evals,
                });
            }

            iterations += 1;
            let improved = self.sweep(problem, &mut incumbent, step)?;
            callback.on_iteration(iterations, &incumbent.candidate, incumbent.cost)?;

            if !improved {
                step /= 2;
                debug!(step, "sweep without improvement, reducing step");
            }
        }

        Ok(SolverResult {
            success: true,
            cost: incumbent.cost,
            iterations,
            message: "Step size exhausted".into(),
            candidate: incumbent.candidate,
            cost_evals: incumbent.cost_evals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode, ObjectiveDirection, ParameterSpace, ParameterSpec, Score};
    use crate::optimization::problem::TuningProblem;
    use crate::optimization::TuningCallback;

    fn scenario_space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterSpec::categorical("x1", ["low", "medium", "high"]),
            ParameterSpec::integer("x2", 1, 100, 10),
        ])
        .unwrap()
    }

    fn scenario_cost(args: &[String]) -> Score {
        let base = if args[0] == "high" { 10.0 } else { 50.0 };
        let x2: f64 = args[1].parse().unwrap();
        Score::Seconds(base - x2 / 10.0)
    }

    #[test]
    fn converges_on_mixed_scenario() {
        let space = scenario_space();
        let evaluator = scenario_cost;
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize)
            .with_initial(Candidate::new(vec![1.0, 50.0]))
            .unwrap();
        let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);

        let result = PatternSearch::new(100).solve(&problem, &mut callback).unwrap();

        assert!(result.success);
        assert_eq!(
            decode(&space, &result.candidate).unwrap(),
            vec!["high".to_string(), "100".to_string()]
        );
        assert_eq!(result.cost, 0.0);

        // The categorical switch happens during the first sweep.
        let first_sweep = callback.history().iter().find(|h| h.iteration == 1).unwrap();
        assert!(first_sweep.cost <= 5.0);
        assert_eq!(result.cost_evals, problem.evaluations());
    }

    #[test]
    fn best_cost_never_increases() {
        let space = scenario_space();
        let evaluator = |args: &[String]| {
            let x2: f64 = args[1].parse().unwrap();
            Score::Seconds((x2 - 37.0).abs() + if args[0] == "low" { 0.0 } else { 3.0 })
        };
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);
        let result = PatternSearch::new(100)
            .with_initial_step(8)
            .solve(&problem, &mut callback)
            .unwrap();

        let costs: Vec<f64> = callback.history().iter().map(|h| h.cost).collect();
        assert!(costs.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(decode(&space, &result.candidate).unwrap()[0], "low");
    }

    #[test]
    fn terminates_when_every_run_is_unusable() {
        let space = scenario_space();
        let evaluator = |_: &[String]| Score::Unusable;
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);

        let result = PatternSearch::new(100).solve(&problem, &mut callback).unwrap();

        // 10 -> 5 -> 2 -> 1 -> 0: four sweeps of 3 + 2 trials, plus the start.
        assert_eq!(result.iterations, 4);
        assert_eq!(result.cost_evals, 1 + 4 * 5);
        assert_eq!(result.cost, f64::INFINITY);
        assert_eq!(result.candidate, space.default_candidate());
    }

    #[test]
    fn degenerate_range_reports_only_value() {
        let space = ParameterSpace::new(vec![ParameterSpec::integer("n", 1, 1, 1)]).unwrap();
        let evaluator = |_: &[String]| Score::Seconds(1.0);
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);
        let result = PatternSearch::new(100).solve(&problem, &mut callback).unwrap();
        assert_eq!(decode(&space, &result.candidate).unwrap(), vec!["1".to_string()]);
    }

    #[test]
    fn iteration_cap_bounds_noisy_improvements() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let space = ParameterSpace::new(vec![ParameterSpec::integer("n", 0, 10, 1)]).unwrap();
        // Every run is faster than the last, so every sweep "improves".
        let calls = AtomicUsize::new(0);
        let evaluator = move |_: &[String]| {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            Score::Seconds(1.0 / (n as f64 + 1.0))
        };
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);
        let result = PatternSearch::new(7).solve(&problem, &mut callback).unwrap();
        assert!(!result.success);
        assert_eq!(result.iterations, 7);
    }

    #[test]
    fn integer_moves_stay_on_step_grid() {
        let target = |args: &[String]| {
            let n: f64 = args[0].parse().unwrap();
            Score::Seconds((n - 37.0).abs())
        };
        let solve = |resolution: i64| {
            let space =
                ParameterSpace::new(vec![ParameterSpec::integer("n", 1, 100, resolution)]).unwrap();
            let problem = TuningProblem::new(&space, &target, ObjectiveDirection::Minimize);
            let mut callback = TuningCallback::new("pattern", &space, ObjectiveDirection::Minimize);
            let result = PatternSearch::new(100).solve(&problem, &mut callback).unwrap();
            decode(&space, &result.candidate).unwrap().remove(0)
        };

        // From the midpoint 50, a step of 10 only ever lands on 10-multiples.
        assert_eq!(solve(10), "40");
        assert_eq!(solve(1), "37");
    }
}
