use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use exetuner::{load_config, Method, Tuner, TunerConfig, TuningResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "exetuner",
    about = "Tune an executable's command-line parameters by measured wall-clock time"
)]
struct Cli {
    /// JSON configuration describing the executable and its parameters
    config: PathBuf,

    /// Search strategy (defaults to the configuration's `search.method`)
    #[arg(long, short, value_enum)]
    method: Option<MethodChoice>,

    /// Random seed for reproducible GA and PSO runs
    #[arg(long, short)]
    seed: Option<u64>,

    /// Population size for the GA and swarm size for PSO
    #[arg(long)]
    pop: Option<usize>,

    /// Generations for the GA
    #[arg(long)]
    gens: Option<u32>,

    /// Iterations for PSO
    #[arg(long)]
    iters: Option<u32>,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MethodChoice {
    Pattern,
    Ga,
    Pso,
    Auto,
    /// Run every strategy and rank the results
    Compare,
}

impl MethodChoice {
    /// `None` for a comparison run.
    fn method(self) -> Option<Method> {
        match self {
            Self::Pattern => Some(Method::Pattern),
            Self::Ga => Some(Method::Genetic),
            Self::Pso => Some(Method::Particle),
            Self::Auto => Some(Method::Auto),
            Self::Compare => None,
        }
    }
}

impl Cli {
    /// Command-line values take precedence over the configuration file.
    fn apply_overrides(&self, config: &mut TunerConfig) {
        if let Some(seed) = self.seed {
            config.search.seed = Some(seed);
        }
        if let Some(pop) = self.pop {
            config.search.genetic.population_size = pop;
            config.search.particle.swarm_size = pop;
        }
        if let Some(gens) = self.gens {
            config.search.genetic.generations = gens;
        }
        if let Some(iters) = self.iters {
            config.search.particle.iterations = iters;
        }
        if let Some(method) = self.method.and_then(MethodChoice::method) {
            config.search.method = method;
        }
    }

    fn compare(&self) -> bool {
        self.method == Some(MethodChoice::Compare)
    }
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_table(results: &[TuningResult]) {
    for (rank, result) in results.iter().enumerate() {
        if results.len() > 1 {
            println!("#{} {}", rank + 1, result.method);
        } else {
            println!("{}", result.method);
        }
        println!("  score:       {}", result.score);
        println!(
            "  iterations:  {} ({} evaluations, {:.2}s)",
            result.iterations, result.evaluations, result.elapsed_secs
        );
        println!("  stop reason: {}", result.message);

        let width = result
            .assignments
            .iter()
            .map(|a| a.name.len())
            .max()
            .unwrap_or(0);
        for assignment in &result.assignments {
            println!("  {:<width$}  {}", assignment.name, assignment.value);
        }
        println!("  arguments:   {}", result.arguments.join(" "));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    enable_tracing();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    let tuner = Tuner::from_config(&config).context("invalid configuration")?;
    tuner
        .preflight()
        .context("pre-flight launch of the executable failed")?;

    let results = if cli.compare() {
        tuner.compare()?
    } else {
        vec![tuner.run_configured()?]
    };

    if cli.json {
        let json = if results.len() == 1 {
            serde_json::to_string_pretty(&results[0])?
        } else {
            serde_json::to_string_pretty(&results)?
        };
        println!("{json}");
    } else {
        print_table(&results);
    }

    Ok(())
}
