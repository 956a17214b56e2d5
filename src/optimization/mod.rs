pub mod callback;
pub mod problem;
pub mod solvers;

pub use callback::{IterationResult, TuningCallback};
pub use problem::TuningProblem;
pub use solvers::{build_solver, select_solver, GeneticOptimizer, ParticleOptimizer, PatternSearch};
pub use solvers::{OptimizationCallback, Problem, Solver, SolverResult};
