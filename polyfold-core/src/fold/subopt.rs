//! Suboptimal structure enumeration.
//!
//! A depth-first search over partial structures. Each live partial
//! structure owns a pair-array snapshot, a stack of unresolved segments,
//! and its committed score; its *forecast* — committed energy plus the
//! table value of every pending segment — never exceeds the energy
//! window. Table values are exact optima, so a case whose forecast fits
//! the window always leads to at least one emitted structure, and every
//! structure inside the window survives pruning: the enumeration is both
//! sound and complete.

use crate::constants::TURN;
use crate::fold::{FoldTables, SegLabel};
use crate::rational::{Energy, Rational};
use crate::sequence::RnaSequence;
use crate::structure::{RnaStructure, ScoreVector, ScoredStructure};
use crate::thermo::EnergyModel;

/// A traceback work item: resolve table `label` over [i, j]. `value` is
/// the table entry, cached for forecast maintenance.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Left end of the interval.
    pub i: usize,
    /// Right end of the interval.
    pub j: usize,
    /// Which recurrence the segment refers to.
    pub label: SegLabel,
    /// The table value at (i, j), i.e. the best possible completion.
    pub value: Rational,
}

/// A structure under construction during the suboptimal DFS.
#[derive(Debug, Clone)]
struct PartialStructure {
    structure: RnaStructure,
    segments: Vec<Segment>,
    total: ScoreVector,
    /// total.energy plus the cached values of every pending segment.
    forecast: Rational,
}

impl EnergyModel {
    /// Every structure with energy at most MFE + `delta`, in DFS order
    /// (or ascending by energy when `sorted`).
    pub fn suboptimal_structures(
        &self,
        seq: &RnaSequence,
        tables: &FoldTables,
        delta: &Rational,
        sorted: bool,
    ) -> Vec<ScoredStructure> {
        let n = seq.len();
        let Energy::Finite(mfe) = self.minimum_energy(tables) else {
            return Vec::new();
        };
        let upper_bound = &mfe + delta;

        let first = PartialStructure {
            structure: RnaStructure::empty(n),
            segments: vec![Segment {
                i: 0,
                j: n - 1,
                label: SegLabel::W,
                value: mfe.clone(),
            }],
            total: ScoreVector::zero(),
            forecast: mfe,
        };

        let mut work = vec![first];
        let mut results = Vec::new();

        while let Some(mut partial) = work.pop() {
            let Some(segment) = partial.segments.pop() else {
                // Fully evaluated.
                results.push(ScoredStructure {
                    structure: partial.structure,
                    score: partial.total,
                });
                continue;
            };
            partial.forecast = &partial.forecast - &segment.value;

            // Too short to hold a substructure: contributes nothing.
            if segment.j - segment.i <= TURN {
                work.push(partial);
                continue;
            }

            let mut pushed_something = false;
            for candidate in
                self.candidates_for(segment.label, seq, tables, segment.i, segment.j)
            {
                let Energy::Finite(candidate_energy) = &candidate.energy else {
                    continue;
                };
                if &partial.forecast + candidate_energy > upper_bound {
                    continue;
                }
                let mut next = partial.clone();
                candidate.apply(&mut next.structure, &mut next.total, self);
                for &(ci, cj, label) in &candidate.children {
                    let value = tables.value(label, ci, cj).expect_finite().clone();
                    next.segments.push(Segment {
                        i: ci,
                        j: cj,
                        label,
                        value,
                    });
                }
                // Committed charges and the children's optima in one step.
                next.forecast = &partial.forecast + candidate_energy;
                work.push(next);
                pushed_something = true;
            }

            // With the forecast invariant at least one case always fits;
            // a segment can still come up empty when it is dominated by
            // entries the bound already paid for, so keep the rest.
            if !pushed_something {
                work.push(partial);
            }
        }

        if sorted {
            results.sort();
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::testing::{enumerate_structures, q, toy_model};
    use crate::types::DangleMode;

    fn all_within(model: &EnergyModel, seq: &RnaSequence, delta: &str) -> Vec<ScoredStructure> {
        let tables = model.energy_tables(seq);
        model.suboptimal_structures(seq, &tables, &q(delta), false)
    }

    #[test]
    fn enumeration_is_complete_for_plain_dangle_modes() {
        // Without dangle choices the case decomposition is unambiguous,
        // so a wide-open window must enumerate every valid pairing
        // exactly once.
        for mode in [DangleMode::NoDangle, DangleMode::BothDangle] {
            let model = toy_model(mode);
            for text in ["GGGAAACCC", "GGAAACGAAACC", "GCGCAAAAGCGC"] {
                let seq = RnaSequence::new(text).unwrap();
                let emitted = all_within(&model, &seq, "1000");
                let expected = enumerate_structures(&seq);
                assert_eq!(
                    emitted.len(),
                    expected.len(),
                    "mode {mode:?}, sequence {text}"
                );

                let emitted_brackets: FxHashSet<String> = emitted
                    .iter()
                    .map(|s| s.structure.dot_bracket())
                    .collect();
                assert_eq!(emitted_brackets.len(), emitted.len(), "duplicate emission");
                for structure in &expected {
                    assert!(emitted_brackets.contains(&structure.dot_bracket()));
                }
            }
        }
    }

    #[test]
    fn choose_dangle_covers_every_pairing_without_duplicates() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("GGAAACGAAACC").unwrap();
        let emitted = all_within(&model, &seq, "1000");

        let expected: FxHashSet<String> = enumerate_structures(&seq)
            .iter()
            .map(|s| s.dot_bracket())
            .collect();
        let brackets: FxHashSet<String> = emitted
            .iter()
            .map(|s| s.structure.dot_bracket())
            .collect();
        assert_eq!(brackets, expected);

        // Distinct dangle choices are distinct structures, but each
        // (pairing, marks) combination appears once.
        let mut seen = FxHashSet::default();
        for s in &emitted {
            let key = (
                s.structure.dot_bracket(),
                (0..s.structure.len())
                    .map(|i| (s.structure.has_d5(i), s.structure.has_d3(i)))
                    .collect::<Vec<_>>(),
            );
            assert!(seen.insert(key), "duplicate marked structure");
        }
    }

    #[test]
    fn every_emission_is_inside_the_window_and_rescores_exactly() {
        for mode in [
            DangleMode::NoDangle,
            DangleMode::ChooseDangle,
            DangleMode::BothDangle,
        ] {
            let model = toy_model(mode);
            // The second sequence admits multiloops inside the window.
            for (text, delta) in [("GCGCAAAAGCGC", "6"), ("GGAAACGAAACC", "1000")] {
                let seq = RnaSequence::new(text).unwrap();
                let tables = model.energy_tables(&seq);
                let mfe = model.minimum_energy(&tables);
                let delta = q(delta);
                let upper = mfe.expect_finite() + &delta;

                for emitted in model.suboptimal_structures(&seq, &tables, &delta, false) {
                    assert!(emitted.score.energy <= upper, "mode {mode:?} on {text}");
                    let rescored = model
                        .score_structure(&seq, &emitted.structure)
                        .expect("emitted structures rescore");
                    assert_eq!(rescored, emitted.score, "mode {mode:?} on {text}");
                }
            }
        }
    }

    #[test]
    fn zero_delta_yields_exactly_the_optimal_structures() {
        let model = toy_model(DangleMode::NoDangle);
        let seq = RnaSequence::new("GGGAAACCC").unwrap();
        let tables = model.energy_tables(&seq);
        let optimal = model.suboptimal_structures(&seq, &tables, &q("0"), true);
        assert_eq!(optimal.len(), 1);
        assert_eq!(optimal[0].structure.dot_bracket(), "(((...)))");
        assert_eq!(
            Energy::Finite(optimal[0].score.energy.clone()),
            model.minimum_energy(&tables)
        );
    }

    #[test]
    fn sorted_output_ascends_by_energy() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("GGGAAACCC").unwrap();
        let tables = model.energy_tables(&seq);
        let sorted = model.suboptimal_structures(&seq, &tables, &q("12"), true);
        assert!(!sorted.is_empty());
        for window in sorted.windows(2) {
            assert!(window[0].score.energy <= window[1].score.energy);
        }
        assert_eq!(
            Energy::Finite(sorted[0].score.energy.clone()),
            model.minimum_energy(&tables)
        );
    }

    #[test]
    fn tiny_sequences_emit_only_the_open_chain() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("GCG").unwrap();
        let emitted = all_within(&model, &seq, "1000");
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].structure.dot_bracket(), "...");
    }
}
