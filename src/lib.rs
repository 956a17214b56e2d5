//! Black-box tuning of an external executable's command-line parameters by
//! measured wall-clock time.
//!
//! A [`ParameterSpace`] of integer and categorical dimensions is searched by
//! pattern search, a genetic algorithm or particle swarm optimization. Each
//! candidate is decoded into positional arguments, the executable is run, and
//! the elapsed time becomes its score.

pub mod config;
pub mod core;
pub mod evaluation;
pub mod optimization;
pub mod tuner;

pub use config::{
    load_config, GeneticConfig, Method, ParticleConfig, PatternConfig, SearchConfig, TunerConfig,
};
pub use self::core::*;
pub use evaluation::{Evaluator, ProcessEvaluator};
pub use optimization::*;
pub use tuner::Tuner;
