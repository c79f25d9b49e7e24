//! Scoring parameter vector for the parametric energy model.

use std::fmt;

use num_traits::Zero;

use crate::rational::{display_with_approx, Rational};

/// The classical Turner-99 multiloop weights (initiation, per-unpaired,
/// per-branch) that the parameter vector reweights.
pub fn classical_weights() -> (Rational, Rational, Rational) {
    (
        Rational::new(17.into(), 5.into()),
        Rational::zero(),
        Rational::new(2.into(), 5.into()),
    )
}

/// The four reweighting coefficients (a, b, c, d): multiloop initiation,
/// unpaired base, branching helix, and the scaling applied to every
/// classical term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterVector {
    /// a — charged once per multiloop
    pub multiloop_penalty: Rational,
    /// b — charged per unpaired base inside multiloops
    pub unpaired_penalty: Rational,
    /// c — charged per branching helix of a multiloop
    pub branch_penalty: Rational,
    /// d — scales every non-parametric (classical) term
    pub dummy_scaling: Rational,
}

impl Default for ParameterVector {
    fn default() -> Self {
        let (a, b, c) = classical_weights();
        Self {
            multiloop_penalty: a,
            unpaired_penalty: b,
            branch_penalty: c,
            dummy_scaling: Rational::from_integer(1.into()),
        }
    }
}

impl ParameterVector {
    /// Assemble a vector from its four coefficients.
    pub fn new(a: Rational, b: Rational, c: Rational, d: Rational) -> Self {
        Self {
            multiloop_penalty: a,
            unpaired_penalty: b,
            branch_penalty: c,
            dummy_scaling: d,
        }
    }

    /// Divide every coefficient through by d, fixing the scaling at 1.
    ///
    /// A zero scaling (possible for raw polytope objectives, which are
    /// never canonicalized) is left untouched.
    pub fn canonicalize(&mut self) {
        if self.dummy_scaling.is_zero() {
            return;
        }
        self.multiloop_penalty = &self.multiloop_penalty / &self.dummy_scaling;
        self.unpaired_penalty = &self.unpaired_penalty / &self.dummy_scaling;
        self.branch_penalty = &self.branch_penalty / &self.dummy_scaling;
        self.dummy_scaling = Rational::from_integer(1.into());
    }

    /// Re-express the vector as deviations from the classical multiloop
    /// weights (scaled by d). Exact inverse of [`Self::untransform_params`].
    pub fn transform_params(&mut self) {
        let (a, b, c) = classical_weights();
        self.multiloop_penalty = &self.multiloop_penalty - &(&a * &self.dummy_scaling);
        self.unpaired_penalty = &self.unpaired_penalty - &(&b * &self.dummy_scaling);
        self.branch_penalty = &self.branch_penalty - &(&c * &self.dummy_scaling);
    }

    /// Map deviation coordinates back to absolute weights. Exact inverse
    /// of [`Self::transform_params`].
    pub fn untransform_params(&mut self) {
        let (a, b, c) = classical_weights();
        self.multiloop_penalty = &self.multiloop_penalty + &(&a * &self.dummy_scaling);
        self.unpaired_penalty = &self.unpaired_penalty + &(&b * &self.dummy_scaling);
        self.branch_penalty = &self.branch_penalty + &(&c * &self.dummy_scaling);
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a = {}, b = {}, c = {}, d = {}",
            display_with_approx(&self.multiloop_penalty),
            display_with_approx(&self.unpaired_penalty),
            display_with_approx(&self.branch_penalty),
            display_with_approx(&self.dummy_scaling),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::parse_rational;

    fn vector(a: &str, b: &str, c: &str, d: &str) -> ParameterVector {
        ParameterVector::new(
            parse_rational(a).unwrap(),
            parse_rational(b).unwrap(),
            parse_rational(c).unwrap(),
            parse_rational(d).unwrap(),
        )
    }

    #[test]
    fn defaults_match_classical_turner_weights() {
        let params = ParameterVector::default();
        assert_eq!(params.multiloop_penalty, parse_rational("3.4").unwrap());
        assert_eq!(params.unpaired_penalty, parse_rational("0").unwrap());
        assert_eq!(params.branch_penalty, parse_rational("0.4").unwrap());
        assert_eq!(params.dummy_scaling, parse_rational("1").unwrap());
    }

    #[test]
    fn canonicalize_divides_through_by_the_scaling() {
        let mut params = vector("6.8", "1", "0.8", "2");
        params.canonicalize();
        assert_eq!(params, vector("3.4", "0.5", "0.4", "1"));
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let mut params = vector("1.7", "-2", "5/3", "4");
        params.canonicalize();
        let once = params.clone();
        params.canonicalize();
        assert_eq!(params, once);
    }

    #[test]
    fn canonicalize_leaves_zero_scalings_alone() {
        let mut params = vector("1", "2", "3", "0");
        params.canonicalize();
        assert_eq!(params, vector("1", "2", "3", "0"));
    }

    #[test]
    fn transform_round_trips_both_ways() {
        let original = vector("1.2", "-0.5", "7/3", "2");

        let mut forward = original.clone();
        forward.transform_params();
        forward.untransform_params();
        assert_eq!(forward, original);

        let mut backward = original.clone();
        backward.untransform_params();
        backward.transform_params();
        assert_eq!(backward, original);
    }

    #[test]
    fn transform_measures_deviation_from_classical() {
        let mut params = ParameterVector::default();
        params.transform_params();
        assert!(params.multiloop_penalty.is_zero());
        assert!(params.branch_penalty.is_zero());
    }
}
