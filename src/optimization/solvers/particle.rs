use super::traits::{argmin, OptimizationCallback, Problem, Solver, SolverResult};
use super::{evaluate_batch, seeded_rng};
use crate::core::{Candidate, ParameterKind, ParameterSpace, TuneResult};
use rand::Rng;

/// Particle Swarm Optimization over the continuous relaxation of the space.
///
/// Categorical dimensions move as real-valued indices and integer dimensions
/// as reals; positions are only clamped to their range; rounding is left to
/// decoding at evaluation time.
pub struct ParticleOptimizer {
    max_iter: u32,
    population_size: usize,
    inertia: f64,   // w - velocity inertia weight
    cognitive: f64, // c1 - personal best influence
    social: f64,    // c2 - global best influence
    seed: Option<u64>,
    parallel: bool,
}

impl ParticleOptimizer {
    pub fn new(max_iter: u32) -> Self {
        Self {
            max_iter,
            population_size: 30,
            inertia: 0.6,
            cognitive: 1.5,
            social: 1.5,
            seed: None,
            parallel: false,
        }
    }

    /// Configure swarm size (default: 30)
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(1);
        self
    }

    /// Configure PSO parameters (defaults: w=0.6, c1=1.5, c2=1.5)
    pub fn with_pso_params(mut self, inertia: f64, cognitive: f64, social: f64) -> Self {
        self.inertia = inertia;
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Evaluate the whole swarm concurrently each iteration
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Random integral index for categorical dimensions, uniform real for integer ones
    fn initialize_particles<R: Rng + ?Sized>(
        &self,
        space: &ParameterSpace,
        rng: &mut R,
    ) -> Vec<Vec<f64>> {
        (0..self.population_size)
            .map(|_| {
                space
                    .iter()
                    .map(|spec| match &spec.kind {
                        ParameterKind::Categorical { .. } => spec.random_value(&mut *rng),
                        ParameterKind::Integer { min, max, .. } => {
                            rng.gen_range(*min as f64..=*max as f64)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl Solver for ParticleOptimizer {
    fn name(&self) -> &str {
        "PSO"
    }

    fn solve(
        &mut self,
        problem: &dyn Problem,
        callback: &mut dyn OptimizationCallback,
    ) -> TuneResult<SolverResult> {
        let space = problem.space();
        let n = space.len();
        let mut rng = seeded_rng(self.seed);

        // Initialize swarm
        let mut particles = self.initialize_particles(space, &mut rng);
        let swarm = particles.len();
        let mut velocities = vec![vec![0.0; n]; swarm];

        let positions: Vec<Candidate> = particles.iter().cloned().map(Candidate::new).collect();
        let mut personal_best_costs = evaluate_batch(problem, &positions, self.parallel)?;
        let mut personal_best_positions = particles.clone();
        let mut cost_evals = swarm;

        let mut global_best_idx = argmin(&personal_best_costs).unwrap_or(0);
        let mut global_best_cost = personal_best_costs[global_best_idx];
        callback.on_iteration(
            0,
            &Candidate::new(personal_best_positions[global_best_idx].clone()),
            global_best_cost,
        )?;

        for iter in 1..=self.max_iter {
            if callback.should_stop() {
                return Ok(SolverResult {
                    success: true,
                    cost: global_best_cost,
                    iterations: iter - 1,
                    message: "Stopped by callback".into(),
                    candidate: Candidate::new(personal_best_positions[global_best_idx].clone()),
                    cost_evals,
                });
            }

            // Update velocities and positions for all particles
            let global_best = &personal_best_positions[global_best_idx];
            for p in 0..swarm {
                for (i, spec) in space.iter().enumerate() {
                    let r1: f64 = rng.gen_range(0.0..=1.0);
                    let r2: f64 = rng.gen_range(0.0..=1.0);

                    velocities[p][i] = self.inertia * velocities[p][i]
                        + self.cognitive * r1 * (personal_best_positions[p][i] - particles[p][i])
                        + self.social * r2 * (global_best[i] - particles[p][i]);

                    particles[p][i] = spec.clamp(particles[p][i] + velocities[p][i]);
                }
            }

            // Evaluate the moved swarm, then reduce bests in particle order
            let positions: Vec<Candidate> =
                particles.iter().cloned().map(Candidate::new).collect();
            let costs = evaluate_batch(problem, &positions, self.parallel)?;
            cost_evals += swarm;

            for (p, cost) in costs.into_iter().enumerate() {
                if cost < personal_best_costs[p] {
                    personal_best_costs[p] = cost;
                    personal_best_positions[p].copy_from_slice(&particles[p]);

                    if cost < global_best_cost {
                        global_best_cost = cost;
                        global_best_idx = p;
                    }
                }
            }

            callback.on_iteration(
                iter,
                &Candidate::new(personal_best_positions[global_best_idx].clone()),
                global_best_cost,
            )?;
        }

        Ok(SolverResult {
            success: true,
            cost: global_best_cost,
            iterations: self.max_iter,
            message: "Max iterations reached".into(),
            candidate: Candidate::new(personal_best_positions[global_best_idx].clone()),
            cost_evals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode, ObjectiveDirection, ParameterSpec, Score};
    use crate::optimization::problem::TuningProblem;
    use crate::optimization::TuningCallback;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterSpec::categorical("opt", ["O0", "O1", "O2", "O3"]),
            ParameterSpec::integer("block", 1, 512, 1),
        ])
        .unwrap()
    }

    fn cost(args: &[String]) -> Score {
        let block: f64 = args[1].parse().unwrap();
        let opt = match args[0].as_str() {
            "O2" => 0.0,
            "O3" => 1.0,
            _ => 10.0,
        };
        Score::Seconds(((block - 256.0) / 64.0).powi(2) + opt)
    }

    #[test]
    fn global_best_never_increases_and_is_reachable() {
        let space = space();
        let evaluator = cost;
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pso", &space, ObjectiveDirection::Minimize);

        let result = ParticleOptimizer::new(30)
            .with_population_size(15)
            .with_seed(Some(42))
            .solve(&problem, &mut callback)
            .unwrap();

        let costs: Vec<f64> = callback.history().iter().map(|h| h.cost).collect();
        assert_eq!(costs.len(), 31);
        assert!(costs.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(result.cost_evals, 15 * 31);

        // The reported position stays within the continuous bounds.
        let position = result.candidate.as_slice();
        assert!((0.0..=3.0).contains(&position[0]));
        assert!((1.0..=512.0).contains(&position[1]));
        let args = decode(&space, &result.candidate).unwrap();
        assert_eq!(cost(&args), Score::Seconds(result.cost));
    }

    #[test]
    fn same_seed_same_result_sequential_or_parallel() {
        let space = space();
        let evaluator = cost;
        let run = |parallel: bool| {
            let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
            let mut callback = TuningCallback::new("pso", &space, ObjectiveDirection::Minimize);
            ParticleOptimizer::new(10)
                .with_population_size(8)
                .with_seed(Some(7))
                .with_parallel(parallel)
                .solve(&problem, &mut callback)
                .unwrap()
        };
        let a = run(false);
        let b = run(true);
        assert_eq!(a.candidate, b.candidate);
        assert_eq!(a.cost, b.cost);
    }

    #[test]
    fn all_unusable_keeps_first_particle() {
        let space = space();
        let evaluator = |_: &[String]| Score::Unusable;
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pso", &space, ObjectiveDirection::Minimize);
        let pso = ParticleOptimizer::new(4).with_population_size(5).with_seed(Some(2));

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let first = pso.initialize_particles(&space, &mut rng).remove(0);

        let mut pso = pso;
        let result = pso.solve(&problem, &mut callback).unwrap();
        assert_eq!(result.cost, f64::INFINITY);
        assert_eq!(result.iterations, 4);
        assert_eq!(result.candidate.as_slice(), first.as_slice());
    }

    #[test]
    fn degenerate_range_reports_only_value() {
        let space = ParameterSpace::new(vec![ParameterSpec::integer("n", 1, 1, 1)]).unwrap();
        let evaluator = |_: &[String]| Score::Seconds(0.25);
        let problem = TuningProblem::new(&space, &evaluator, ObjectiveDirection::Minimize);
        let mut callback = TuningCallback::new("pso", &space, ObjectiveDirection::Minimize);
        let result = ParticleOptimizer::new(5)
            .with_population_size(3)
            .solve(&problem, &mut callback)
            .unwrap();
        assert_eq!(result.candidate.as_slice(), &[1.0]);
        assert_eq!(decode(&space, &result.candidate).unwrap(), vec!["1".to_string()]);
    }

    #[test]
    fn initial_positions_respect_representation() {
        let space = space();
        let pso = ParticleOptimizer::new(1).with_population_size(50);
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for particle in pso.initialize_particles(&space, &mut rng) {
            assert!(particle[0].fract() == 0.0 && (0.0..=3.0).contains(&particle[0]));
            assert!((1.0..=512.0).contains(&particle[1]));
        }
    }
}
