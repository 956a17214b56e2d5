//! JSON run configuration: executable, parameter space and search settings.

use crate::config_error;
use crate::core::{
    encode_component, Candidate, ObjectiveDirection, ParameterSpace, ParameterSpec, TuneError,
    TuneResult,
};
use crate::evaluation::ProcessEvaluator;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ===== SEARCH METHOD =====

/// Search strategy requested for a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "pattern", alias = "pattern_search")]
    Pattern,
    #[serde(rename = "ga", alias = "genetic")]
    Genetic,
    #[serde(rename = "pso", alias = "particle")]
    Particle,
    #[default]
    #[serde(rename = "auto")]
    Auto,
}

impl Method {
    /// The concrete strategies, in the order a comparison runs them.
    pub const ALL: [Method; 3] = [Method::Pattern, Method::Genetic, Method::Particle];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Genetic => "ga",
            Self::Particle => "pso",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" | "pattern_search" => Ok(Self::Pattern),
            "ga" | "genetic" => Ok(Self::Genetic),
            "pso" | "particle" => Ok(Self::Particle),
            "auto" => Ok(Self::Auto),
            other => Err(config_error!(
                "unknown method '{other}' (expected pattern, ga, pso or auto)"
            )),
        }
    }
}

// ===== SEARCH SETTINGS =====

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub initial_step: i64,
    pub max_iterations: u32,
    /// Explicit starting assignment; unnamed parameters use their default.
    pub initial: IndexMap<String, Value>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            initial_step: 10,
            max_iterations: 100,
            initial: IndexMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: u32,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub tournament_size: usize,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            generations: 30,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            tournament_size: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub swarm_size: usize,
    pub iterations: u32,
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            swarm_size: 30,
            iterations: 50,
            inertia: 0.6,
            cognitive: 1.5,
            social: 1.5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub method: Method,
    pub seed: Option<u64>,
    /// Evaluate GA populations and PSO swarms concurrently.
    pub parallel: bool,
    /// Worker threads for parallel evaluation, `num_cpus` when unset.
    pub workers: Option<usize>,
    /// Wall-clock allowance per strategy run.
    pub time_budget_secs: Option<f64>,
    pub pattern: PatternConfig,
    pub genetic: GeneticConfig,
    pub particle: ParticleConfig,
}

impl SearchConfig {
    pub fn validate(&self) -> TuneResult<()> {
        if self.pattern.initial_step < 1 {
            return Err(config_error!(
                "pattern.initial_step must be at least 1, got {}",
                self.pattern.initial_step
            ));
        }

        let ga = &self.genetic;
        if ga.population_size == 0 || ga.generations == 0 {
            return Err(config_error!(
                "genetic.population_size and genetic.generations must be positive"
            ));
        }
        if ga.tournament_size == 0 {
            return Err(config_error!("genetic.tournament_size must be positive"));
        }
        for (name, rate) in [
            ("genetic.crossover_rate", ga.crossover_rate),
            ("genetic.mutation_rate", ga.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(config_error!("{name} must be within [0, 1], got {rate}"));
            }
        }

        let pso = &self.particle;
        if pso.swarm_size == 0 || pso.iterations == 0 {
            return Err(config_error!(
                "particle.swarm_size and particle.iterations must be positive"
            ));
        }
        if ![pso.inertia, pso.cognitive, pso.social]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(config_error!("particle coefficients must be finite"));
        }

        if self.workers == Some(0) {
            return Err(config_error!("workers must be positive"));
        }
        positive_seconds("time_budget_secs", self.time_budget_secs)?;

        Ok(())
    }

    pub fn time_budget(&self) -> Option<Duration> {
        seconds(self.time_budget_secs)
    }
}

// ===== PARAMETERS =====

/// One parameter as written in the document.
///
/// `type` may be omitted when `values` or `min`/`max` make the kind obvious.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

/// Either an ordered list of named records or a name-keyed mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterList {
    List(Vec<RawParameter>),
    Map(IndexMap<String, RawParameter>),
}

impl RawParameter {
    fn into_spec(self, name: String) -> TuneResult<ParameterSpec> {
        let kind = match self.kind.as_deref().map(str::to_ascii_lowercase) {
            Some(kind) => kind,
            None if self.values.is_some() => "categorical".into(),
            None if self.min.is_some() || self.max.is_some() => "int".into(),
            None => {
                return Err(TuneError::invalid_parameter(
                    name,
                    "missing 'type' and no 'values' or 'min'/'max' to infer it from",
                ))
            }
        };

        match kind.as_str() {
            "int" | "integer" => {
                let (Some(min), Some(max)) = (self.min, self.max) else {
                    return Err(TuneError::invalid_parameter(
                        name,
                        "integer parameter needs 'min' and 'max'",
                    ));
                };
                Ok(ParameterSpec::integer(name, min, max, self.step.unwrap_or(1)))
            }
            "categorical" | "choice" => {
                let values = self.values.unwrap_or_default();
                let tokens = values
                    .iter()
                    .map(|v| value_token(v).map_err(|msg| TuneError::invalid_parameter(&name, msg)))
                    .collect::<TuneResult<Vec<_>>>()?;
                Ok(ParameterSpec::categorical(name, tokens))
            }
            other => Err(TuneError::invalid_parameter(
                name,
                format!("unknown parameter type '{other}'"),
            )),
        }
    }
}

/// Argument token for a JSON scalar: strings verbatim, numbers and booleans
/// through their JSON text.
pub fn value_token(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("{other} is not a scalar argument value")),
    }
}

// ===== TOP-LEVEL CONFIG =====

/// Complete run description, usually loaded from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    #[serde(default, alias = "exe", alias = "program")]
    pub executable: Option<PathBuf>,
    /// Arguments placed before the tuned ones on every invocation.
    #[serde(default)]
    pub fixed_args: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Count a non-zero exit status as an unusable run.
    #[serde(default)]
    pub require_success: bool,
    #[serde(default)]
    pub direction: ObjectiveDirection,
    pub parameters: ParameterList,
    #[serde(default)]
    pub search: SearchConfig,
}

impl TunerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> TuneResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything that can be checked without launching anything.
    pub fn validate(&self) -> TuneResult<()> {
        match &self.executable {
            Some(path) if !path.as_os_str().is_empty() => {}
            _ => return Err(TuneError::MissingExecutable),
        }
        positive_seconds("timeout_secs", self.timeout_secs)?;
        self.search.validate()?;
        let space = self.parameter_space()?;
        self.initial_candidate(&space)?;
        Ok(())
    }

    /// Build the validated parameter space in document order.
    pub fn parameter_space(&self) -> TuneResult<ParameterSpace> {
        let specs = match &self.parameters {
            ParameterList::List(list) => list
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let name = raw
                        .name
                        .clone()
                        .ok_or_else(|| config_error!("parameter #{i} has no 'name'"))?;
                    raw.clone().into_spec(name)
                })
                .collect::<TuneResult<Vec<_>>>()?,
            ParameterList::Map(map) => map
                .iter()
                .map(|(name, raw)| raw.clone().into_spec(name.clone()))
                .collect::<TuneResult<Vec<_>>>()?,
        };
        ParameterSpace::new(specs)
    }

    /// Explicit pattern-search start, `None` when no assignment is given.
    pub fn initial_candidate(&self, space: &ParameterSpace) -> TuneResult<Option<Candidate>> {
        let initial = &self.search.pattern.initial;
        if initial.is_empty() {
            return Ok(None);
        }

        let mut candidate = space.default_candidate();
        for (name, value) in initial {
            let idx = space
                .position(name)
                .ok_or_else(|| config_error!("initial value for unknown parameter '{name}'"))?;
            let token =
                value_token(value).map_err(|msg| TuneError::invalid_parameter(name, msg))?;
            let spec = &space.specs()[idx];
            candidate = candidate.with_component(idx, encode_component(spec, &token)?);
        }
        Ok(Some(candidate))
    }

    pub fn timeout(&self) -> Option<Duration> {
        seconds(self.timeout_secs)
    }

    /// Process evaluator for the configured executable.
    pub fn evaluator(&self) -> TuneResult<ProcessEvaluator> {
        let executable = self
            .executable
            .clone()
            .ok_or(TuneError::MissingExecutable)?;
        Ok(ProcessEvaluator::new(executable)
            .with_fixed_args(self.fixed_args.iter().cloned())
            .with_timeout(self.timeout())
            .with_require_success(self.require_success))
    }
}

fn positive_seconds(field: &str, value: Option<f64>) -> TuneResult<()> {
    match value {
        Some(secs) if !(secs.is_finite() && secs > 0.0) => Err(config_error!(
            "{field} must be a positive number of seconds, got {secs}"
        )),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map(|_| ())
            .map_err(|e| config_error!("{field} of {secs} seconds is out of range: {e}")),
        None => Ok(()),
    }
}

/// Seconds as a `Duration`; values rejected by validation yield `None`.
fn seconds(value: Option<f64>) -> Option<Duration> {
    value.and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Read, parse and validate a configuration file.
pub fn load_config(path: impl AsRef<Path>) -> TuneResult<TunerConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    TunerConfig::from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ParameterKind;
    use serde_json::json;

    fn parse(value: Value) -> TuneResult<TunerConfig> {
        TunerConfig::from_json_str(&value.to_string())
    }

    #[test]
    fn list_form_with_defaults() {
        let config = parse(json!({
            "executable": "./model",
            "parameters": [
                {"name": "x1", "type": "categorical", "values": ["low", "medium", "high"]},
                {"name": "x2", "type": "int", "min": 1, "max": 100, "step": 10}
            ]
        }))
        .unwrap();

        assert_eq!(config.direction, ObjectiveDirection::Minimize);
        assert_eq!(config.search, SearchConfig::default());
        assert!(!config.require_success);

        let space = config.parameter_space().unwrap();
        assert_eq!(space.names(), vec!["x1", "x2"]);
        assert_eq!(
            space.specs()[1].kind,
            ParameterKind::Integer { min: 1, max: 100, step: 10 }
        );
        assert_eq!(config.initial_candidate(&space).unwrap(), None);
    }

    #[test]
    fn map_form_keeps_document_order_and_aliases() {
        // Raw text: a `json!` value would reorder the keys before parsing.
        let config = TunerConfig::from_json_str(
            r#"{
                "program": "/bin/true",
                "direction": "maximize",
                "parameters": {
                    "threads": {"min": 1, "max": 8},
                    "layout": {"values": ["aos", "soa"]},
                    "unroll": {"type": "choice", "values": [1, 2, 4, true]}
                },
                "search": {"method": "genetic", "seed": 9, "genetic": {"generations": 5}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.executable, Some(PathBuf::from("/bin/true")));
        assert_eq!(config.direction, ObjectiveDirection::Maximize);
        assert_eq!(config.search.method, Method::Genetic);
        assert_eq!(config.search.genetic.generations, 5);
        assert_eq!(config.search.genetic.population_size, 20);

        let space = config.parameter_space().unwrap();
        assert_eq!(space.names(), vec!["threads", "layout", "unroll"]);
        assert_eq!(
            space.specs()[2].kind,
            ParameterKind::Categorical {
                values: vec!["1".into(), "2".into(), "4".into(), "true".into()]
            }
        );
        assert_eq!(
            space.specs()[0].kind,
            ParameterKind::Integer { min: 1, max: 8, step: 1 }
        );
    }

    #[test]
    fn initial_assignment_is_encoded() {
        let config = parse(json!({
            "exe": "./model",
            "parameters": [
                {"name": "x1", "type": "categorical", "values": ["low", "medium", "high"]},
                {"name": "x2", "type": "integer", "min": 1, "max": 100}
            ],
            "search": {"pattern": {"initial": {"x1": "medium"}}}
        }))
        .unwrap();
        let space = config.parameter_space().unwrap();
        let initial = config.initial_candidate(&space).unwrap().unwrap();
        assert_eq!(initial.as_slice(), &[1.0, 50.0]);
    }

    #[test]
    fn rejects_invalid_documents() {
        let base = || {
            json!({
                "executable": "./model",
                "parameters": [{"name": "n", "type": "int", "min": 1, "max": 10}]
            })
        };

        let mut missing_exe = base();
        missing_exe.as_object_mut().unwrap().remove("executable");
        assert!(matches!(parse(missing_exe), Err(TuneError::MissingExecutable)));

        let mut empty = base();
        empty["parameters"] = json!([]);
        assert!(matches!(parse(empty), Err(TuneError::Config(_))));

        let mut reversed = base();
        reversed["parameters"][0]["min"] = json!(20);
        assert!(matches!(parse(reversed), Err(TuneError::InvalidParameter { .. })));

        let mut unknown_type = base();
        unknown_type["parameters"][0]["type"] = json!("float");
        assert!(parse(unknown_type).is_err());

        let mut duplicate = base();
        duplicate["parameters"] = json!([
            {"name": "n", "type": "int", "min": 1, "max": 10},
            {"name": "n", "type": "categorical", "values": ["a"]}
        ]);
        assert!(parse(duplicate).is_err());

        let mut bad_initial = base();
        bad_initial["search"] = json!({"pattern": {"initial": {"n": 11}}});
        assert!(parse(bad_initial).is_err());

        let mut unknown_initial = base();
        unknown_initial["search"] = json!({"pattern": {"initial": {"m": 1}}});
        assert!(parse(unknown_initial).is_err());

        let mut bad_rate = base();
        bad_rate["search"] = json!({"genetic": {"mutation_rate": 1.5}});
        assert!(parse(bad_rate).is_err());

        let mut zero_swarm = base();
        zero_swarm["search"] = json!({"particle": {"swarm_size": 0}});
        assert!(parse(zero_swarm).is_err());

        let mut bad_timeout = base();
        bad_timeout["timeout_secs"] = json!(0);
        assert!(parse(bad_timeout).is_err());

        let mut huge_timeout = base();
        huge_timeout["timeout_secs"] = json!(1e30);
        assert!(matches!(parse(huge_timeout), Err(TuneError::Config(_))));

        let mut huge_budget = base();
        huge_budget["search"] = json!({"time_budget_secs": 1e30});
        assert!(matches!(parse(huge_budget), Err(TuneError::Config(_))));

        let mut bad_step = base();
        bad_step["search"] = json!({"pattern": {"initial_step": 0}});
        assert!(parse(bad_step).is_err());

        assert!(matches!(
            TunerConfig::from_json_str("{not json"),
            Err(TuneError::Serialization(_))
        ));
    }

    #[test]
    fn method_parsing() {
        assert_eq!("GA".parse::<Method>().unwrap(), Method::Genetic);
        assert_eq!("particle".parse::<Method>().unwrap(), Method::Particle);
        assert_eq!(Method::Pattern.to_string(), "pattern");
        assert!("annealing".parse::<Method>().is_err());
    }

    #[test]
    fn evaluator_carries_process_settings() {
        let config = parse(json!({
            "executable": "./model",
            "fixed_args": ["--quiet"],
            "timeout_secs": 2.5,
            "parameters": [{"name": "n", "type": "int", "min": 1, "max": 10}]
        }))
        .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(2500)));
        let evaluator = config.evaluator().unwrap();
        assert_eq!(evaluator.executable(), Path::new("./model"));
    }
}
