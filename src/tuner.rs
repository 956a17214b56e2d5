//! Front door: wires a parameter space, an evaluator and search settings into
//! complete tuning runs.

use crate::config::{Method, SearchConfig, TunerConfig};
use crate::core::{
    decode, decode_assignments, Candidate, ObjectiveDirection, ParameterSpace, Score, TuneError,
    TuneResult, TuningResult,
};
use crate::evaluation::Evaluator;
use crate::optimization::{build_solver, Problem, TuningCallback, TuningProblem};
use std::time::Instant;
use tracing::{info, warn};

pub struct Tuner {
    space: ParameterSpace,
    evaluator: Box<dyn Evaluator>,
    direction: ObjectiveDirection,
    search: SearchConfig,
    initial: Option<Candidate>,
}

impl Tuner {
    pub fn new(space: ParameterSpace, evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            space,
            evaluator,
            direction: ObjectiveDirection::default(),
            search: SearchConfig::default(),
            initial: None,
        }
    }

    /// Tuner driving the configured executable as a child process.
    pub fn from_config(config: &TunerConfig) -> TuneResult<Self> {
        config.validate()?;
        let space = config.parameter_space()?;
        let initial = config.initial_candidate(&space)?;
        let evaluator = config.evaluator()?;

        let mut tuner = Self::new(space, Box::new(evaluator))
            .with_direction(config.direction)
            .with_search(config.search.clone());
        tuner.initial = initial;
        Ok(tuner)
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Starting point for pattern search and the pre-flight launch
    pub fn with_initial(mut self, initial: Candidate) -> TuneResult<Self> {
        self.space.check_dimensions(&initial)?;
        self.initial = Some(initial);
        Ok(self)
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn search(&self) -> &SearchConfig {
        &self.search
    }

    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    pub fn initial_candidate(&self) -> Candidate {
        self.initial
            .clone()
            .unwrap_or_else(|| self.space.default_candidate())
    }

    /// Launch the executable once with the starting candidate.
    ///
    /// Fails when the executable cannot be started at all, so a broken setup
    /// is reported before any search begins.
    pub fn preflight(&self) -> TuneResult<()> {
        let args = decode(&self.space, &self.initial_candidate())?;
        info!(?args, "pre-flight launch");
        self.evaluator.preflight(&args)
    }

    /// Run one search strategy to completion.
    pub fn run(&self, method: Method) -> TuneResult<TuningResult> {
        self.search.validate()?;
        let started = Instant::now();
        let problem = TuningProblem::new(&self.space, self.evaluator.as_ref(), self.direction)
            .with_initial(self.initial_candidate())?;

        let (mut solver, method, reason) = build_solver(method, &self.space, &self.search);
        info!(
            %method,
            solver = solver.name(),
            params = self.space.len(),
            %reason,
            "starting search"
        );

        let mut callback = TuningCallback::new(method.as_str(), &self.space, self.direction)
            .with_time_budget(self.search.time_budget());

        let outcome = if self.search.parallel {
            let workers = self.search.workers.unwrap_or_else(num_cpus::get);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| TuneError::Internal(format!("failed to start worker pool: {e}")))?;
            pool.install(|| solver.solve(&problem, &mut callback))?
        } else {
            solver.solve(&problem, &mut callback)?
        };

        let score = problem.score_of(outcome.cost);
        let arguments = decode(&self.space, &outcome.candidate)?;
        let assignments = decode_assignments(&self.space, &outcome.candidate)?;
        let elapsed_secs = started.elapsed().as_secs_f64();

        if score == Score::Unusable {
            warn!(%method, "no evaluation produced a usable time");
        }
        info!(
            %method,
            %score,
            iterations = outcome.iterations,
            evaluations = outcome.cost_evals,
            unusable = problem.unusable_evaluations(),
            elapsed_secs,
            message = %outcome.message,
            "search finished"
        );

        Ok(TuningResult {
            method: method.to_string(),
            success: outcome.success,
            score,
            iterations: outcome.iterations,
            evaluations: outcome.cost_evals,
            message: outcome.message,
            elapsed_secs,
            arguments,
            assignments,
        })
    }

    /// Run the configured method, resolving `auto` from the space.
    pub fn run_configured(&self) -> TuneResult<TuningResult> {
        self.run(self.search.method)
    }

    /// Run every strategy on the same space and rank the results best-first.
    ///
    /// Ties keep the run order: pattern search, GA, PSO.
    pub fn compare(&self) -> TuneResult<Vec<TuningResult>> {
        let mut results = Method::ALL
            .iter()
            .map(|&method| self.run(method))
            .collect::<TuneResult<Vec<_>>>()?;
        results.sort_by(|a, b| self.direction.compare(a.score, b.score));

        if let Some(best) = results.first() {
            info!(method = %best.method, score = %best.score, "comparison winner");
        }
        Ok(results)
    }
}
