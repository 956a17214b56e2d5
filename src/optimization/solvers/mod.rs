mod genetic;
mod particle;
mod pattern;
pub mod traits;

pub use genetic::GeneticOptimizer;
pub use particle::ParticleOptimizer;
pub use pattern::PatternSearch;
pub use traits::{OptimizationCallback, Problem, Solver, SolverResult};

use crate::config::{Method, SearchConfig};
use crate::core::{Candidate, ParameterSpace, TuneResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Spaces with at most this many distinct configurations go to pattern search.
const SMALL_GRID: u64 = 64;

/// Run RNG for a stochastic solver: reproducible when seeded, entropy otherwise.
pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Cost of every candidate, in input order.
///
/// With `parallel` the batch is spread over the current rayon pool; callers
/// reduce the returned costs sequentially so the outcome does not depend on
/// scheduling.
pub(crate) fn evaluate_batch(
    problem: &dyn Problem,
    candidates: &[Candidate],
    parallel: bool,
) -> TuneResult<Vec<f64>> {
    if parallel {
        candidates.par_iter().map(|c| problem.cost(c)).collect()
    } else {
        candidates.iter().map(|c| problem.cost(c)).collect()
    }
}

fn pattern_search(search: &SearchConfig) -> Box<dyn Solver> {
    Box::new(
        PatternSearch::new(search.pattern.max_iterations)
            .with_initial_step(search.pattern.initial_step),
    )
}

fn genetic(search: &SearchConfig) -> Box<dyn Solver> {
    let ga = &search.genetic;
    Box::new(
        GeneticOptimizer::new(ga.generations)
            .with_population_size(ga.population_size)
            .with_rates(ga.crossover_rate, ga.mutation_rate)
            .with_tournament_size(ga.tournament_size)
            .with_seed(search.seed)
            .with_parallel(search.parallel),
    )
}

fn particle(search: &SearchConfig) -> Box<dyn Solver> {
    let pso = &search.particle;
    Box::new(
        ParticleOptimizer::new(pso.iterations)
            .with_population_size(pso.swarm_size)
            .with_pso_params(pso.inertia, pso.cognitive, pso.social)
            .with_seed(search.seed)
            .with_parallel(search.parallel),
    )
}

/// Pick a strategy from the shape of the space.
///
/// Small grids are cheap to sweep coordinate-wise, so they go to pattern
/// search. Mostly-categorical spaces have no useful continuous geometry and go
/// to the GA. Everything else goes to PSO.
pub fn select_solver(
    space: &ParameterSpace,
    search: &SearchConfig,
) -> (Box<dyn Solver>, Method, String) {
    let categorical = space.categorical_count();
    let n = space.len();

    match space.grid_size() {
        Some(size) if size <= SMALL_GRID => (
            pattern_search(search),
            Method::Pattern,
            format!("Auto: {size} configurations → pattern search"),
        ),
        _ if categorical * 2 > n => (
            genetic(search),
            Method::Genetic,
            format!("Auto: {categorical} of {n} params categorical → GA"),
        ),
        grid => (
            particle(search),
            Method::Particle,
            match grid {
                Some(size) => format!("Auto: {n} params, {size} configurations → PSO"),
                None => format!("Auto: {n} params, unbounded grid → PSO"),
            },
        ),
    }
}

/// Build the solver for an explicitly requested method, deferring to
/// [`select_solver`] for [`Method::Auto`].
pub fn build_solver(
    method: Method,
    space: &ParameterSpace,
    search: &SearchConfig,
) -> (Box<dyn Solver>, Method, String) {
    match method {
        Method::Pattern => (pattern_search(search), method, "Requested: pattern search".into()),
        Method::Genetic => (genetic(search), method, "Requested: GA".into()),
        Method::Particle => (particle(search), method, "Requested: PSO".into()),
        Method::Auto => select_solver(space, search),
    }
}
