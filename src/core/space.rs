use super::error::{TuneError, TuneResult};
use super::types::{Candidate, ParameterKind, ParameterSpace, ParameterSpec};
use rand::Rng;
use std::collections::HashSet;

impl ParameterSpec {
    /// Check this parameter's own invariants (bounds ordering, step, non-empty values).
    pub fn validate(&self) -> TuneResult<()> {
        if self.name.trim().is_empty() {
            return Err(TuneError::invalid_parameter(
                &self.name,
                "parameter name must not be empty",
            ));
        }

        match &self.kind {
            ParameterKind::Integer { min, max, step } => {
                if min > max {
                    return Err(TuneError::invalid_parameter(
                        &self.name,
                        format!("min {min} is greater than max {max}"),
                    ));
                }
                if *step < 1 {
                    return Err(TuneError::invalid_parameter(
                        &self.name,
                        format!("step must be at least 1, got {step}"),
                    ));
                }
            }
            ParameterKind::Categorical { values } => {
                if values.is_empty() {
                    return Err(TuneError::invalid_parameter(
                        &self.name,
                        "categorical parameter needs at least one value",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Continuous range of the internal representation.
    ///
    /// Categorical dimensions span the index range `[0, len - 1]`.
    pub fn bounds(&self) -> (f64, f64) {
        match &self.kind {
            ParameterKind::Integer { min, max, .. } => (*min as f64, *max as f64),
            ParameterKind::Categorical { values } => (0.0, values.len().saturating_sub(1) as f64),
        }
    }

    /// Clamp a real-valued component into [`ParameterSpec::bounds`] without rounding.
    pub fn clamp(&self, value: f64) -> f64 {
        let (min, max) = self.bounds();
        if value.is_nan() {
            return min;
        }
        value.clamp(min, max)
    }

    /// Uniform draw over the domain, in internal representation.
    pub fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.kind {
            ParameterKind::Integer { min, max, .. } => rng.gen_range(*min..=*max) as f64,
            ParameterKind::Categorical { values } => rng.gen_range(0..values.len()) as f64,
        }
    }

    /// Internal value of a default starting point: first value or range midpoint.
    pub fn default_value(&self) -> f64 {
        match &self.kind {
            ParameterKind::Integer { min, max, .. } => {
                (i128::from(*min) + i128::from(*max)).div_euclid(2) as f64
            }
            ParameterKind::Categorical { .. } => 0.0,
        }
    }
}

/// Validate a list of specs before they form a space.
///
/// Fails on an empty list, duplicate names, or any spec-level violation.
pub fn validate_space(specs: &[ParameterSpec]) -> TuneResult<()> {
    if specs.is_empty() {
        return Err(TuneError::Config(
            "parameter space must contain at least one parameter".into(),
        ));
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(TuneError::invalid_parameter(
                &spec.name,
                "duplicate parameter name",
            ));
        }
    }

    Ok(())
}

impl ParameterSpace {
    pub fn new(specs: Vec<ParameterSpec>) -> TuneResult<Self> {
        validate_space(&specs)?;
        Ok(Self { specs })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterSpec> {
        self.specs.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ParameterSpec> {
        self.specs.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name.clone()).collect()
    }

    /// Continuous bounds per dimension, see [`ParameterSpec::bounds`].
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.specs.iter().map(ParameterSpec::bounds).collect()
    }

    /// Number of distinct decoded configurations, `None` on overflow.
    pub fn grid_size(&self) -> Option<u64> {
        self.specs
            .iter()
            .try_fold(1u64, |total, spec| total.checked_mul(spec.cardinality()))
    }

    pub fn categorical_count(&self) -> usize {
        self.specs.iter().filter(|s| s.is_categorical()).count()
    }

    /// Every dimension drawn independently with [`ParameterSpec::random_value`].
    pub fn random_candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Candidate {
        Candidate::new(self.specs.iter().map(|s| s.random_value(&mut *rng)).collect())
    }

    /// First categorical value and integer midpoint for every dimension.
    pub fn default_candidate(&self) -> Candidate {
        Candidate::new(self.specs.iter().map(ParameterSpec::default_value).collect())
    }

    /// Clamp every component into its continuous bounds (no rounding).
    pub fn clamp_continuous(&self, candidate: &Candidate) -> TuneResult<Candidate> {
        self.check_dimensions(candidate)?;
        Ok(Candidate::new(
            self.specs
                .iter()
                .zip(candidate.as_slice())
                .map(|(spec, &v)| spec.clamp(v))
                .collect(),
        ))
    }

    pub fn check_dimensions(&self, candidate: &Candidate) -> TuneResult<()> {
        if candidate.len() != self.specs.len() {
            return Err(TuneError::DimensionMismatch {
                expected: self.specs.len(),
                actual: candidate.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn mixed_space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterSpec::categorical("x1", ["low", "medium", "high"]),
            ParameterSpec::integer("x2", 1, 100, 10),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_invalid_specs() {
        assert!(ParameterSpace::new(vec![]).is_err());
        assert!(ParameterSpace::new(vec![ParameterSpec::integer("a", 5, 1, 1)]).is_err());
        assert!(ParameterSpace::new(vec![ParameterSpec::integer("a", 1, 5, 0)]).is_err());
        assert!(
            ParameterSpace::new(vec![ParameterSpec::categorical("c", Vec::<String>::new())])
                .is_err()
        );

        let duplicate = ParameterSpace::new(vec![
            ParameterSpec::integer("a", 1, 5, 1),
            ParameterSpec::categorical("a", ["x"]),
        ]);
        match duplicate {
            Err(TuneError::InvalidParameter { name, .. }) => assert_eq!(name, "a"),
            other => panic!("expected duplicate-name error, got {other:?}"),
        }
    }

    #[test]
    fn random_values_stay_in_domain() {
        let space = mixed_space();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let candidate = space.random_candidate(&mut rng);
            let idx = candidate.get(0).unwrap();
            let x2 = candidate.get(1).unwrap();
            assert!((0.0..=2.0).contains(&idx) && idx.fract() == 0.0);
            assert!((1.0..=100.0).contains(&x2) && x2.fract() == 0.0);
        }
    }

    #[test]
    fn degenerate_range_has_single_value() {
        let spec = ParameterSpec::integer("n", 1, 1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(spec.random_value(&mut rng), 1.0);
        }
        assert_eq!(spec.default_value(), 1.0);
        assert_eq!(spec.clamp(42.7), 1.0);
    }

    #[test]
    fn clamp_continuous_keeps_fractions() {
        let space = mixed_space();
        let clamped = space
            .clamp_continuous(&Candidate::new(vec![5.3, 42.25]))
            .unwrap();
        assert_eq!(clamped.as_slice(), &[2.0, 42.25]);

        let clamped = space
            .clamp_continuous(&Candidate::new(vec![f64::NAN, -1e12]))
            .unwrap();
        assert_eq!(clamped.as_slice(), &[0.0, 1.0]);

        assert!(matches!(
            space.clamp_continuous(&Candidate::new(vec![1.0])),
            Err(TuneError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn default_candidate_uses_first_value_and_midpoint() {
        let space = mixed_space();
        assert_eq!(space.default_candidate().as_slice(), &[0.0, 50.0]);

        let negative = ParameterSpec::integer("n", -3, 0, 1);
        assert_eq!(negative.default_value(), -2.0);
    }

    #[test]
    fn grid_size_multiplies_cardinalities() {
        assert_eq!(mixed_space().grid_size(), Some(300));
        let huge = ParameterSpace::new(vec![
            ParameterSpec::integer("a", i64::MIN, i64::MAX, 1),
            ParameterSpec::integer("b", i64::MIN, i64::MAX, 1),
        ])
        .unwrap();
        assert_eq!(huge.grid_size(), None);
    }
}
