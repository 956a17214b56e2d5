use super::traits::{argmin, OptimizationCallback, Problem, Solver, SolverResult};
use super::{evaluate_batch, seeded_rng};
use crate::core::{discretize, Candidate, ParameterKind, ParameterSpace, ParameterSpec, TuneResult};
use rand::Rng;
use tracing::debug;

/// Generational genetic algorithm with tournament selection, uniform
/// crossover, per-gene mutation and single-individual elitism.
pub struct GeneticOptimizer {
    generations: u32,
    population_size: usize,
    crossover_rate: f64,
    mutation_rate: f64,
    tournament_size: usize,
    seed: Option<u64>,
    parallel: bool,
}

impl GeneticOptimizer {
    pub fn new(generations: u32) -> Self {
        Self {
            generations,
            population_size: 20,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            tournament_size: 3,
            seed: None,
            parallel: false,
        }
    }

    /// Configure population size (default: 20)
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(1);
        self
    }

    /// Configure crossover and per-gene mutation probabilities (defaults: 0.8, 0.2)
    pub fn with_rates(mut self, crossover_rate: f64, mutation_rate: f64) -> Self {
        self.crossover_rate = crossover_rate.clamp(0.0, 1.0);
        self.mutation_rate = mutation_rate.clamp(0.0, 1.0);
        self
    }

    /// Configure tournament size (default: 3)
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size.max(1);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Evaluate each generation's offspring concurrently
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Best of `tournament_size` individuals drawn with replacement.
    fn tournament<'p, R: Rng + ?Sized>(
        &self,
        population: &'p [Candidate],
        costs: &[f64],
        rng: &mut R,
    ) -> &'p Candidate {
        let mut winner = rng.gen_range(0..population.len());
        for _ in 1..self.tournament_size {
            let challenger = rng.gen_range(0..population.len());
            if costs[challenger] < costs[winner] {
                winner = challenger;
            }
        }
        &population[winner]
    }

    /// Uniform crossover: each gene is swapped between the parents with probability 0.5.
    fn crossover<R: Rng + ?Sized>(
        a: &Candidate,
        b: &Candidate,
        rng: &mut R,
    ) -> (Candidate, Candidate) {
        let (genes_a, genes_b): (Vec<f64>, Vec<f64>) = a
            .as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(&x, &y)| if rng.gen_bool(0.5) { (y, x) } else { (x, y) })
            .unzip();
        (Candidate::new(genes_a), Candidate::new(genes_b))
    }

    fn mutate<R: Rng + ?Sized>(
        &self,
        space: &ParameterSpace,
        individual: &Candidate,
        rng: &mut R,
    ) -> Candidate {
        Candidate::new(
            space
                .iter()
                .zip(individual.as_slice())
                .map(|(spec, &gene)| {
                    if rng.gen_bool(self.mutation_rate) {
                        mutate_gene(spec, gene, &mut *rng)
                    } else {
                        gene
                    }
                })
                .collect(),
        )
    }
}

/// Fresh draw for categorical genes, bounded jump of up to a quarter of the
/// range for integer genes.
fn mutate_gene<R: Rng + ?Sized>(spec: &ParameterSpec, gene: f64, rng: &mut R) -> f64 {
    match &spec.kind {
        ParameterKind::Categorical { .. } => spec.random_value(rng),
        ParameterKind::Integer { min, max, .. } => {
            let span = i64::try_from(max.abs_diff(*min) / 4)
                .unwrap_or(i64::MAX)
                .max(1);
            let delta = rng.gen_range(-span..=span);
            discretize(spec, gene).saturating_add(delta).clamp(*min, *max) as f64
        }
    }
}

impl Solver for GeneticOptimizer {
    fn name(&self) -> &str {
        "GeneticAlgorithm"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> TuneResult<SolverResult> {
        let space = problem.space();
        let mut rng = seeded_rng(self.seed);
        let pop_size = self.population_size.max(1);

        let mut population: Vec<Candidate> = (0..pop_size)
            .map(|_| space.random_candidate(&mut rng))
            .collect();
        let mut costs = evaluate_batch(problem, &population, self.parallel)?;
        let mut cost_evals = population.len();

        let first = argmin(&costs).unwrap_or(0);
        let mut best = population[first].clone();
        let mut best_cost = costs[first];
        callback.on_iteration(0, &best, best_cost)?;

        for generation in 1..=self.generations {
            if callback.should_stop() {
                return Ok(SolverResult {
                    success: true,
                    cost: best_cost,
                    iterations: generation - 1,
                    message: "Stopped by callback".into(),
                    candidate: best,
                    cost_evals,
                });
            }

            // Elitism: the best individual so far survives with its recorded cost.
            let mut next = Vec::with_capacity(pop_size);
            next.push(best.clone());

            while next.len() < pop_size {
                let a = self.tournament(&population, &costs, &mut rng);
                let b = self.tournament(&population, &costs, &mut rng);
                let (c1, c2) = if rng.gen_bool(self.crossover_rate) {
                    Self::crossover(a, b, &mut rng)
                } else {
                    (a.clone(), b.clone())
                };
                next.push(self.mutate(space, &c1, &mut rng));
                if next.len() < pop_size {
                    next.push(self.mutate(space, &c2, &mut rng));
                }
            }

            let offspring_costs = evaluate_batch(problem, &next[1..], self.parallel)?;
            cost_evals += offspring_costs.len();

            costs = std::iter::once(best_cost).chain(offspring_costs).collect();
            population = next;

            if let Some(idx) = argmin(&costs) {
                if costs[idx] < best_cost {
                    best_cost = costs[idx];
                    best = population[idx].clone();
                }
            }
            debug!(generation, best_cost, "generation complete");
            callback.on_iteration(generation, &best, best_cost)?;
        }

        Ok(SolverResult {
            success: true,
            cost: best_cost,
            iterations: self.generations,
            message: "Generations completed".into(),
            candidate: best,
            cost_evals,
        })
    }
}
