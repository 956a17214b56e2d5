use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// ===== ENUMS =====

/// Whether the measured time should be driven down or up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveDirection {
    #[default]
    Minimize,
    Maximize,
}

impl ObjectiveDirection {
    /// Map a score onto the cost every solver minimises.
    ///
    /// The sentinel maps to `+inf` in both directions so it never wins a comparison.
    pub fn cost(self, score: Score) -> f64 {
        match (self, score) {
            (_, Score::Unusable) => f64::INFINITY,
            (Self::Minimize, Score::Seconds(t)) => t,
            (Self::Maximize, Score::Seconds(t)) => -t,
        }
    }

    /// Inverse of [`ObjectiveDirection::cost`].
    pub fn score(self, cost: f64) -> Score {
        if !cost.is_finite() {
            return Score::Unusable;
        }
        match self {
            Self::Minimize => Score::Seconds(cost),
            Self::Maximize => Score::Seconds(-cost),
        }
    }

    /// Order two scores so that the better one compares as `Less`.
    pub fn compare(self, a: Score, b: Score) -> Ordering {
        self.cost(a).total_cmp(&self.cost(b))
    }
}

// ===== CORE DATA TYPES =====

/// Domain of one tunable dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Inclusive integer range. `step` is the resolution local search ends at.
    Integer { min: i64, max: i64, step: i64 },
    /// Ordered set of opaque argument tokens.
    Categorical { values: Vec<String> },
}

/// One named tunable dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
}

impl ParameterSpec {
    pub fn integer(name: impl Into<String>, min: i64, max: i64, step: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Integer { min, max, step },
        }
    }

    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ParameterKind::Categorical {
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, ParameterKind::Categorical { .. })
    }

    /// Number of distinct values this dimension can take.
    pub fn cardinality(&self) -> u64 {
        match &self.kind {
            ParameterKind::Integer { min, max, .. } => max.abs_diff(*min).saturating_add(1),
            ParameterKind::Categorical { values } => values.len() as u64,
        }
    }
}

/// Ordered, validated list of parameter specs.
///
/// Position `i` of every [`Candidate`] refers to `specs[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParameterSpace {
    pub(crate) specs: Vec<ParameterSpec>,
}

/// Internal numeric representation of one point in the space.
///
/// Integer dimensions hold the value itself, categorical dimensions hold an
/// index into `values`. Components may be fractional or out of range while a
/// swarm is moving; [`crate::decode`] coerces them back into the domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate(Vec<f64>);

impl Candidate {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Copy of this candidate with one component replaced.
    pub fn with_component(&self, index: usize, value: f64) -> Self {
        let mut values = self.0.clone();
        values[index] = value;
        Self(values)
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for Candidate {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Observed cost of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Score {
    /// Wall-clock seconds from launch to exit.
    Seconds(f64),
    /// The run timed out or could not be launched.
    Unusable,
}

impl Score {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Seconds(_))
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(t) => Some(*t),
            Self::Unusable => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(t) => write!(f, "{t:.4}s"),
            Self::Unusable => write!(f, "unusable"),
        }
    }
}

/// A decoded parameter value, as passed on the command line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

/// Outcome of one tuning run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuningResult {
    pub method: String,
    pub success: bool,
    pub score: Score,
    pub iterations: u32,
    pub evaluations: usize,
    pub message: String,
    pub elapsed_secs: f64,
    /// Positional argument tokens of the best candidate (without fixed args).
    pub arguments: Vec<String>,
    pub assignments: Vec<Assignment>,
}

impl TuningResult {
    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}
