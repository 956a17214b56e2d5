mod process;

pub use process::ProcessEvaluator;

use crate::core::{Score, TuneResult};

/// Black-box boundary: turns a decoded argument list into an observed score.
///
/// `evaluate` never fails. Timeouts and launch failures come back as
/// [`Score::Unusable`] so that a single bad run cannot derail a search.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, args: &[String]) -> Score;

    /// Launch check run once before any search. Errors here abort the run.
    fn preflight(&self, _args: &[String]) -> TuneResult<()> {
        Ok(())
    }
}

impl<F> Evaluator for F
where
    F: Fn(&[String]) -> Score + Send + Sync,
{
    fn evaluate(&self, args: &[String]) -> Score {
        self(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_evaluators() {
        let evaluator = |args: &[String]| Score::Seconds(args.len() as f64);
        let boxed: Box<dyn Evaluator> = Box::new(evaluator);
        assert_eq!(
            boxed.evaluate(&["a".to_string(), "b".to_string()]),
            Score::Seconds(2.0)
        );
        assert!(boxed.preflight(&[]).is_ok());
    }
}
