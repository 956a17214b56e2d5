//! Conversion between internal candidate vectors and argument tokens.
//!
//! [`decode`] is the only place where the continuous representation used by the
//! solvers turns back into discrete domain values. It never rejects a component:
//! fractional values are rounded, out-of-range values clamped.

use super::error::{TuneError, TuneResult};
use super::types::{Assignment, Candidate, ParameterKind, ParameterSpace, ParameterSpec};

/// Round and clamp one component to a valid integer value or category index.
pub fn discretize(spec: &ParameterSpec, value: f64) -> i64 {
    // NaN casts to 0, infinities saturate.
    let rounded = value.round() as i64;
    match &spec.kind {
        ParameterKind::Integer { min, max, .. } => rounded.clamp(*min, *max),
        ParameterKind::Categorical { values } => rounded.clamp(0, values.len() as i64 - 1),
    }
}

/// Decode one component into its argument token.
pub fn decode_component(spec: &ParameterSpec, value: f64) -> String {
    let discrete = discretize(spec, value);
    match &spec.kind {
        ParameterKind::Integer { .. } => discrete.to_string(),
        ParameterKind::Categorical { values } => values[discrete as usize].clone(),
    }
}

/// Decode a whole candidate into the positional argument list.
pub fn decode(space: &ParameterSpace, candidate: &Candidate) -> TuneResult<Vec<String>> {
    space.check_dimensions(candidate)?;
    Ok(space
        .iter()
        .zip(candidate.as_slice())
        .map(|(spec, &v)| decode_component(spec, v))
        .collect())
}

/// Decode a candidate into `name = value` pairs.
pub fn decode_assignments(
    space: &ParameterSpace,
    candidate: &Candidate,
) -> TuneResult<Vec<Assignment>> {
    let tokens = decode(space, candidate)?;
    Ok(space
        .iter()
        .zip(tokens)
        .map(|(spec, value)| Assignment {
            name: spec.name.clone(),
            value,
        })
        .collect())
}

/// Internal value for an external token; the token must be in the domain.
pub fn encode_component(spec: &ParameterSpec, token: &str) -> TuneResult<f64> {
    match &spec.kind {
        ParameterKind::Integer { min, max, .. } => {
            let value: i64 = token.trim().parse().map_err(|_| {
                TuneError::invalid_parameter(&spec.name, format!("'{token}' is not an integer"))
            })?;
            if value < *min || value > *max {
                return Err(TuneError::invalid_parameter(
                    &spec.name,
                    format!("{value} is outside [{min}, {max}]"),
                ));
            }
            Ok(value as f64)
        }
        ParameterKind::Categorical { values } => values
            .iter()
            .position(|v| v == token)
            .map(|idx| idx as f64)
            .ok_or_else(|| {
                TuneError::invalid_parameter(
                    &spec.name,
                    format!("'{token}' is not one of {values:?}"),
                )
            }),
    }
}

/// Encode a full positional argument list.
pub fn encode<S: AsRef<str>>(space: &ParameterSpace, tokens: &[S]) -> TuneResult<Candidate> {
    if tokens.len() != space.len() {
        return Err(TuneError::DimensionMismatch {
            expected: space.len(),
            actual: tokens.len(),
        });
    }
    space
        .iter()
        .zip(tokens)
        .map(|(spec, token)| encode_component(spec, token.as_ref()))
        .collect::<TuneResult<Vec<f64>>>()
        .map(Candidate::new)
}
