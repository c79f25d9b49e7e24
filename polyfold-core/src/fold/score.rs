//! Scoring of complete structures, independent of the DP tables.
//!
//! Walks the loop decomposition of a pair array and charges each loop the
//! way the recurrences would, so a structure emitted by the traceback or
//! the suboptimal search rescored here reproduces its energy exactly.

use rustc_hash::FxHashMap;

use crate::constants::TURN;
use crate::rational::Energy;
use crate::sequence::RnaSequence;
use crate::structure::{RnaStructure, ScoreVector};
use crate::thermo::EnergyModel;
use crate::types::{DangleMode, PolyfoldError};

/// How CHOOSE_DANGLE assignments are resolved while rescoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DanglePolicy {
    /// Charge exactly the dangles recorded in the structure's marks.
    Marked,
    /// Pick the best assignment per loop (for bare structures).
    Optimal,
}

impl EnergyModel {
    /// Score a structure, honoring its recorded dangle marks.
    ///
    /// This inverts the traceback exactly: a structure produced by
    /// [`EnergyModel::mfe_structure`] or the suboptimal search rescored
    /// here reproduces its reported score vector.
    pub fn score_structure(
        &self,
        seq: &RnaSequence,
        structure: &RnaStructure,
    ) -> Result<ScoreVector, PolyfoldError> {
        self.score_with_policy(seq, structure, DanglePolicy::Marked)
    }

    /// Score a bare structure, choosing optimal dangles in
    /// CHOOSE_DANGLE mode. Dangle choices interact only inside a single
    /// unpaired gap, so a per-gap minimum is globally optimal.
    pub fn score_with_optimal_dangles(
        &self,
        seq: &RnaSequence,
        structure: &RnaStructure,
    ) -> Result<ScoreVector, PolyfoldError> {
        self.score_with_policy(seq, structure, DanglePolicy::Optimal)
    }

    fn score_with_policy(
        &self,
        seq: &RnaSequence,
        structure: &RnaStructure,
        policy: DanglePolicy,
    ) -> Result<ScoreVector, PolyfoldError> {
        let n = seq.len();
        if structure.len() != n {
            return Err(PolyfoldError::InvalidStructure(format!(
                "structure length {} does not match sequence length {n}",
                structure.len()
            )));
        }
        for (i, j) in structure.pairs() {
            if j - i <= TURN {
                return Err(PolyfoldError::InvalidStructure(format!(
                    "pair ({}, {}) closes a hairpin shorter than {TURN}",
                    i + 1,
                    j + 1
                )));
            }
            if !seq.can_pair(i, j) {
                return Err(PolyfoldError::InvalidStructure(format!(
                    "bases {} and {} cannot pair",
                    i + 1,
                    j + 1
                )));
            }
        }

        // Direct children of every pair, and the exterior branches.
        let mut exterior: Vec<(usize, usize)> = Vec::new();
        let mut children: FxHashMap<usize, Vec<(usize, usize)>> = FxHashMap::default();
        let mut open: Vec<usize> = Vec::new();
        for pos in 0..n {
            match structure.partner(pos) {
                Some(p) if pos < p => {
                    match open.last() {
                        Some(&parent) => children.entry(parent).or_default().push((pos, p)),
                        None => exterior.push((pos, p)),
                    }
                    open.push(pos);
                }
                Some(_) => {
                    open.pop();
                }
                None => {}
            }
        }

        let params = self.params();
        let mut score = ScoreVector::zero();
        let mut classical = Energy::zero();

        for &(p, q) in &exterior {
            classical = &classical + &self.au_penalty(seq, p, q);
        }
        classical = &classical + &self.loop_dangles(seq, structure, policy, None, &exterior);

        for (i, j) in structure.pairs() {
            let kids = children.get(&i).map(Vec::as_slice).unwrap_or(&[]);
            match kids {
                [] => {
                    classical = &classical + &self.hairpin(seq, i, j);
                }
                [(p, q)] if *p == i + 1 && *q == j - 1 => {
                    classical = &classical + &self.stack(seq, i, j);
                }
                [(p, q)] => {
                    classical = &classical + &self.internal_loop(seq, i, j, *p, *q);
                }
                _ => {
                    score.add_multiloop(params);
                    score.add_branch(params);
                    let mut covered = 0;
                    for &(p, q) in kids {
                        score.add_branch(params);
                        covered += q - p + 1;
                        classical = &classical + &self.au_penalty(seq, p, q);
                    }
                    score.add_unpaired((j - i - 1 - covered) as i64, params);
                    classical = &classical + &self.au_penalty(seq, i, j);
                    classical =
                        &classical + &self.loop_dangles(seq, structure, policy, Some((i, j)), kids);
                }
            }
        }

        match classical {
            Energy::Finite(value) => {
                score.add_classical(&value, params);
                Ok(score)
            }
            Energy::Infinite => Err(PolyfoldError::InvalidStructure(
                "structure has no finite energy under this model".to_string(),
            )),
        }
    }

    /// Dangle charges for one loop: the exterior (no closing pair) or a
    /// multiloop closed by `closing`, with `branches` ordered 5' to 3'.
    fn loop_dangles(
        &self,
        seq: &RnaSequence,
        structure: &RnaStructure,
        policy: DanglePolicy,
        closing: Option<(usize, usize)>,
        branches: &[(usize, usize)],
    ) -> Energy {
        match self.dangles() {
            DangleMode::NoDangle => Energy::zero(),
            DangleMode::BothDangle => {
                let mut total = Energy::zero();
                if let Some((i, j)) = closing {
                    total = &total + &(&self.ed5(seq, i, j, false) + &self.ed3(seq, i, j, false));
                }
                for &(p, q) in branches {
                    total = &total + &(&self.ed5(seq, p, q, false) + &self.ed3(seq, p, q, false));
                }
                total
            }
            DangleMode::ChooseDangle => match policy {
                DanglePolicy::Marked => self.marked_dangles(seq, structure, closing, branches),
                DanglePolicy::Optimal => self.optimal_dangles(seq, closing, branches),
            },
        }
    }

    fn marked_dangles(
        &self,
        seq: &RnaSequence,
        structure: &RnaStructure,
        closing: Option<(usize, usize)>,
        branches: &[(usize, usize)],
    ) -> Energy {
        let unpaired_mark = |pos: usize, is_d5: bool| {
            structure.partner(pos).is_none()
                && if is_d5 {
                    structure.has_d5(pos)
                } else {
                    structure.has_d3(pos)
                }
        };
        let mut total = Energy::zero();
        if let Some((i, j)) = closing {
            // The closing pair's inside dangles are recorded on the
            // consumed bases i+1 and j-1.
            if unpaired_mark(i + 1, false) {
                total = &total + &self.ed5(seq, i, j, true);
            }
            if unpaired_mark(j - 1, true) {
                total = &total + &self.ed3(seq, i, j, true);
            }
        }
        for &(p, q) in branches {
            if p > 0 && unpaired_mark(p - 1, true) {
                total = &total + &self.ed5(seq, p, q, false);
            }
            if q + 1 < seq.len() && unpaired_mark(q + 1, false) {
                total = &total + &self.ed3(seq, p, q, false);
            }
        }
        total
    }

    fn optimal_dangles(
        &self,
        seq: &RnaSequence,
        closing: Option<(usize, usize)>,
        branches: &[(usize, usize)],
    ) -> Energy {
        if branches.is_empty() {
            return Energy::zero();
        }

        let mut total = Energy::zero();
        let first = branches[0];
        let last = branches[branches.len() - 1];

        // Gap before the first branch.
        let (size, left) = match closing {
            Some((i, j)) => (first.0 - i - 1, Some(self.ed5(seq, i, j, true))),
            None => (first.0, None),
        };
        total = &total + &gap_minimum(size, left, Some(self.ed5(seq, first.0, first.1, false)));

        // Gaps between consecutive branches.
        for pair in branches.windows(2) {
            let (_, left_end) = pair[0];
            let (right_start, right_end) = pair[1];
            total = &total
                + &gap_minimum(
                    right_start - left_end - 1,
                    Some(self.ed3(seq, pair[0].0, left_end, false)),
                    Some(self.ed5(seq, right_start, right_end, false)),
                );
        }

        // Gap after the last branch.
        let (size, right) = match closing {
            Some((i, j)) => (j - last.1 - 1, Some(self.ed3(seq, i, j, true))),
            None => (seq.len() - 1 - last.1, None),
        };
        total = &total + &gap_minimum(size, Some(self.ed3(seq, last.0, last.1, false)), right);

        total
    }
}

/// Best dangle assignment across one unpaired gap: with a single free
/// base the two adjacent helix ends compete for it; with two or more
/// each end claims independently.
fn gap_minimum(size: usize, left: Option<Energy>, right: Option<Energy>) -> Energy {
    let floor = |claim: Option<Energy>| {
        claim
            .map(|energy| energy.min(Energy::zero()))
            .unwrap_or_else(Energy::zero)
    };
    match size {
        0 => Energy::zero(),
        1 => {
            let mut best = Energy::zero();
            if let Some(claim) = left {
                best = best.min(claim);
            }
            if let Some(claim) = right {
                best = best.min(claim);
            }
            best
        }
        _ => &floor(left) + &floor(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::parse_rational;
    use crate::testing::toy_model;

    fn scored(
        model: &EnergyModel,
        text: &str,
        brackets: &str,
    ) -> Result<ScoreVector, PolyfoldError> {
        let seq = RnaSequence::new(text).unwrap();
        let structure = RnaStructure::from_dot_bracket(brackets)?;
        model.score_structure(&seq, &structure)
    }

    #[test]
    fn hairpin_helix_scores_stacks_plus_loop() {
        let model = toy_model(DangleMode::NoDangle);
        let score = scored(&model, "GGGAAACCC", "(((...)))").unwrap();
        assert_eq!(score.energy, parse_rational("-1.2").unwrap());
        assert_eq!(score.w, parse_rational("-1.2").unwrap());
        assert_eq!((score.multiloops, score.unpaired, score.branches), (0, 0, 0));
    }

    #[test]
    fn multiloop_charges_initiation_branches_and_unpaired() {
        let model = toy_model(DangleMode::NoDangle);
        // closing pair (0, 12), branches (1, 5) and (7, 11), base 6 free
        let score = scored(&model, "GGAAACAGAAACC", "((...).(...))").unwrap();
        assert_eq!((score.multiloops, score.unpaired, score.branches), (1, 1, 3));
        // two hairpins at 5.4, no AU penalties
        assert_eq!(score.w, parse_rational("10.8").unwrap());
        // 10.8 + a 3.4 + 3 * c 0.4
        assert_eq!(score.energy, parse_rational("15.4").unwrap());
    }

    #[test]
    fn bare_structures_get_optimal_dangles_in_choose_mode() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("AGGGAAACCCA").unwrap();
        let structure = RnaStructure::from_dot_bracket(".(((...))).").unwrap();

        let marked = model.score_structure(&seq, &structure).unwrap();
        assert_eq!(marked.energy, parse_rational("-1.2").unwrap());

        let optimal = model.score_with_optimal_dangles(&seq, &structure).unwrap();
        assert_eq!(optimal.energy, parse_rational("-1.5").unwrap());
    }

    #[test]
    fn adjacent_branches_share_a_single_free_base() {
        let model = toy_model(DangleMode::ChooseDangle);
        // two exterior branches with one unpaired base between them
        let seq = RnaSequence::new("GGAAACAGAAACC").unwrap();
        let structure = RnaStructure::from_dot_bracket("(....).(....)").unwrap();
        // both hairpins GC-closed at size 4
        let optimal = model.score_with_optimal_dangles(&seq, &structure).unwrap();
        // each hairpin: 5.6 - 0.3; the shared base 6 goes to the better
        // claim (5' of the right branch at -0.2)
        assert_eq!(optimal.energy, parse_rational("10.4").unwrap());
    }

    #[test]
    fn both_dangle_mode_charges_every_branch_end() {
        let model = toy_model(DangleMode::BothDangle);
        let score = scored(&model, "AGGGAAACCCA", ".(((...))).").unwrap();
        assert_eq!(score.energy, parse_rational("-1.5").unwrap());
    }

    #[test]
    fn incompatible_pairs_and_short_hairpins_are_rejected() {
        let model = toy_model(DangleMode::NoDangle);
        assert!(matches!(
            scored(&model, "AAAAAAAAA", "(((...)))"),
            Err(PolyfoldError::InvalidStructure(_))
        ));
        assert!(matches!(
            scored(&model, "GAAC", "(..)"),
            Err(PolyfoldError::InvalidStructure(_))
        ));
        assert!(matches!(
            scored(&model, "GGGAAACCC", "(((...))"),
            Err(PolyfoldError::InvalidStructure(_))
        ));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let model = toy_model(DangleMode::NoDangle);
        assert!(scored(&model, "GGGAAACCC", ".....").is_err());
    }
}
