//! Secondary structures, dangle marks, and score vectors.

use std::cmp::Ordering;
use std::fmt;

use num_traits::Zero;

use crate::params::ParameterVector;
use crate::rational::{rational_from_i64, Rational};
use crate::types::PolyfoldError;

/// A (partial or complete) secondary structure: the pair partner of each
/// position plus the 5'/3' dangle choices made while assembling it.
///
/// Pairs are non-crossing by construction: they are only ever produced by
/// the recurrence tracebacks or by parsing a balanced dot-bracket string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RnaStructure {
    pairs: Vec<Option<usize>>,
    d5: Vec<bool>,
    d3: Vec<bool>,
}

impl RnaStructure {
    /// The structure with no pairs on a sequence of length `len`.
    #[must_use]
    pub fn empty(len: usize) -> Self {
        Self {
            pairs: vec![None; len],
            d5: vec![false; len],
            d3: vec![false; len],
        }
    }

    /// Parse a dot-bracket string.
    pub fn from_dot_bracket(text: &str) -> Result<Self, PolyfoldError> {
        let mut structure = Self::empty(text.chars().count());
        let mut open = Vec::new();
        for (i, c) in text.chars().enumerate() {
            match c {
                '.' => {}
                '(' => open.push(i),
                ')' => {
                    let j = open.pop().ok_or_else(|| {
                        PolyfoldError::InvalidStructure(format!(
                            "unmatched ')' at position {}",
                            i + 1
                        ))
                    })?;
                    structure.mark_pair(j, i);
                }
                other => {
                    return Err(PolyfoldError::InvalidStructure(format!(
                        "unexpected character {other:?}"
                    )))
                }
            }
        }
        if let Some(i) = open.pop() {
            return Err(PolyfoldError::InvalidStructure(format!(
                "unmatched '(' at position {}",
                i + 1
            )));
        }
        Ok(structure)
    }

    /// Sequence length this structure annotates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the annotated sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The partner of position `i`, if paired.
    #[must_use]
    pub fn partner(&self, i: usize) -> Option<usize> {
        self.pairs[i]
    }

    /// Record the pair (i, j), i < j.
    pub fn mark_pair(&mut self, i: usize, j: usize) {
        debug_assert!(i < j);
        self.pairs[i] = Some(j);
        self.pairs[j] = Some(i);
    }

    /// Record that base `i` was consumed as a 5' dangle.
    pub fn mark_d5(&mut self, i: usize) {
        self.d5[i] = true;
    }

    /// Record that base `i` was consumed as a 3' dangle.
    pub fn mark_d3(&mut self, i: usize) {
        self.d3[i] = true;
    }

    /// Whether base `i` carries a 5' dangle mark.
    #[must_use]
    pub fn has_d5(&self, i: usize) -> bool {
        self.d5[i]
    }

    /// Whether base `i` carries a 3' dangle mark.
    #[must_use]
    pub fn has_d3(&self, i: usize) -> bool {
        self.d3[i]
    }

    /// Whether any dangle choice was recorded.
    #[must_use]
    pub fn has_dangle_marks(&self) -> bool {
        self.d5.iter().chain(self.d3.iter()).any(|&m| m)
    }

    /// Iterate over pairs (i, j) with i < j, ascending in i.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.filter(|&j| i < j).map(|j| (i, j)))
    }

    /// Dot-bracket rendering.
    #[must_use]
    pub fn dot_bracket(&self) -> String {
        self.pairs
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                Some(j) if i < *j => '(',
                Some(_) => ')',
                None => '.',
            })
            .collect()
    }
}

impl fmt::Display for RnaStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dot_bracket())
    }
}

/// Decomposition of a structure's energy into the parametric counts and
/// the classical remainder.
///
/// Invariant: `energy = a·multiloops + b·unpaired + c·branches + d·w`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreVector {
    /// Number of multiloops.
    pub multiloops: i64,
    /// Unpaired bases inside multiloops (consumed dangle bases included).
    pub unpaired: i64,
    /// Branching helices of multiloops (closing helix included).
    pub branches: i64,
    /// Classical (non-parametric) energy, unscaled.
    pub w: Rational,
    /// Total energy under the parameter vector the structure was scored
    /// with.
    pub energy: Rational,
}

impl ScoreVector {
    /// The all-zero score (the empty structure).
    pub fn zero() -> Self {
        Self {
            multiloops: 0,
            unpaired: 0,
            branches: 0,
            w: Rational::zero(),
            energy: Rational::zero(),
        }
    }

    /// Charge one multiloop initiation.
    pub fn add_multiloop(&mut self, params: &ParameterVector) {
        self.multiloops += 1;
        self.energy = &self.energy + &params.multiloop_penalty;
    }

    /// Charge `count` unpaired bases.
    pub fn add_unpaired(&mut self, count: i64, params: &ParameterVector) {
        if count == 0 {
            return;
        }
        self.unpaired += count;
        self.energy = &self.energy + &(&params.unpaired_penalty * &rational_from_i64(count));
    }

    /// Charge one branching helix.
    pub fn add_branch(&mut self, params: &ParameterVector) {
        self.branches += 1;
        self.energy = &self.energy + &params.branch_penalty;
    }

    /// Charge a classical term: `value` goes to w, `d·value` to energy.
    pub fn add_classical(&mut self, value: &Rational, params: &ParameterVector) {
        self.w = &self.w + value;
        self.energy = &self.energy + &(value * &params.dummy_scaling);
    }

    /// Evaluate the energy identity under an arbitrary parameter vector.
    pub fn evaluate(&self, params: &ParameterVector) -> Rational {
        let mut total = &params.multiloop_penalty * &rational_from_i64(self.multiloops);
        total = &total + &(&params.unpaired_penalty * &rational_from_i64(self.unpaired));
        total = &total + &(&params.branch_penalty * &rational_from_i64(self.branches));
        &total + &(&params.dummy_scaling * &self.w)
    }

    /// The score as a point (m, u, h, w) in ℚ⁴.
    pub fn point(&self) -> Vec<Rational> {
        vec![
            rational_from_i64(self.multiloops),
            rational_from_i64(self.unpaired),
            rational_from_i64(self.branches),
            self.w.clone(),
        ]
    }
}

/// A complete structure together with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredStructure {
    /// The structure itself.
    pub structure: RnaStructure,
    /// Its exact score decomposition.
    pub score: ScoreVector,
}

impl PartialOrd for ScoredStructure {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredStructure {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .energy
            .cmp(&other.score.energy)
            .then_with(|| self.structure.dot_bracket().cmp(&other.structure.dot_bracket()))
    }
}

impl fmt::Display for ScoredStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.structure.dot_bracket(),
            self.score.multiloops,
            self.score.unpaired,
            self.score.branches,
            self.score.w,
            self.score.energy,
        )
    }
}
