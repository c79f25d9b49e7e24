//! Traceback of one MFE structure out of the filled tables.

use crate::constants::TURN;
use crate::fold::{FoldTables, SegLabel};
use crate::sequence::RnaSequence;
use crate::structure::{RnaStructure, ScoreVector, ScoredStructure};
use crate::thermo::EnergyModel;

impl EnergyModel {
    /// Rediscover, case by case, which alternative attained each table
    /// minimum and assemble the resulting structure with its exact score
    /// decomposition. Ties break on the first match in fill enumeration
    /// order.
    ///
    /// Panics if no case attains a visited entry; that indicates a
    /// fill/traceback mismatch, not a property of the input.
    pub fn mfe_structure(&self, seq: &RnaSequence, tables: &FoldTables) -> ScoredStructure {
        let n = seq.len();
        let mut structure = RnaStructure::empty(n);
        let mut score = ScoreVector::zero();
        let mut work = Vec::new();
        if n > 0 {
            work.push((0usize, n - 1, SegLabel::W));
        }

        while let Some((i, j, label)) = work.pop() {
            if j - i <= TURN {
                continue;
            }
            let cell = tables.value(label, i, j).clone();
            let chosen = self
                .candidates_for(label, seq, tables, i, j)
                .into_iter()
                .find(|candidate| candidate.energy == cell);
            match chosen {
                Some(candidate) => {
                    candidate.apply(&mut structure, &mut score, self);
                    work.extend(candidate.children.iter().copied());
                }
                None => panic!("traceback mismatch: no case attains {label:?}[{i}, {j}]"),
            }
        }

        ScoredStructure { structure, score }
    }
}

#[cfg(test)]
mod tests {
    use num_traits::Zero;

    use crate::rational::parse_rational;
    use crate::sequence::RnaSequence;
    use crate::testing::toy_model;
    use crate::types::DangleMode;

    #[test]
    fn traces_the_triple_helix_hairpin() {
        let model = toy_model(DangleMode::NoDangle);
        let seq = RnaSequence::new("GGGAAACCC").unwrap();
        let tables = model.energy_tables(&seq);
        let best = model.mfe_structure(&seq, &tables);

        assert_eq!(best.structure.dot_bracket(), "(((...)))");
        assert_eq!(best.score.energy, parse_rational("-1.2").unwrap());
        assert_eq!(best.score.w, parse_rational("-1.2").unwrap());
        assert_eq!(best.score.multiloops, 0);
        assert_eq!(best.score.unpaired, 0);
        assert_eq!(best.score.branches, 0);
    }

    #[test]
    fn traced_energy_always_matches_the_table_minimum() {
        for mode in [
            DangleMode::NoDangle,
            DangleMode::ChooseDangle,
            DangleMode::BothDangle,
        ] {
            let model = toy_model(mode);
            for text in ["GGGAAACCC", "AGGGAAACCCA", "GCGGAUUUAUCCGC", "AAAAAAA"] {
                let seq = RnaSequence::new(text).unwrap();
                let tables = model.energy_tables(&seq);
                let best = model.mfe_structure(&seq, &tables);
                assert_eq!(
                    &crate::rational::Energy::Finite(best.score.energy.clone()),
                    tables.w(seq.len() - 1),
                    "mode {mode:?}, sequence {text}"
                );
                assert_eq!(best.score.energy, best.score.evaluate(model.params()));
            }
        }
    }

    #[test]
    fn chosen_exterior_dangles_are_marked() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("AGGGAAACCCA").unwrap();
        let tables = model.energy_tables(&seq);
        let best = model.mfe_structure(&seq, &tables);

        assert_eq!(best.structure.dot_bracket(), ".(((...))).");
        // helix energy -1.2 plus both exterior dangles (-0.2, -0.1)
        assert_eq!(best.score.energy, parse_rational("-1.5").unwrap());
        assert!(best.structure.has_d5(0));
        assert!(best.structure.has_d3(10));
    }

    #[test]
    fn both_dangle_mode_charges_without_consuming() {
        let model = toy_model(DangleMode::BothDangle);
        let seq = RnaSequence::new("AGGGAAACCCA").unwrap();
        let tables = model.energy_tables(&seq);
        let best = model.mfe_structure(&seq, &tables);

        assert_eq!(best.structure.dot_bracket(), ".(((...))).");
        assert_eq!(best.score.energy, parse_rational("-1.5").unwrap());
        assert!(!best.structure.has_dangle_marks());
    }

    #[test]
    fn empty_mfe_yields_the_open_chain() {
        let model = toy_model(DangleMode::ChooseDangle);
        let seq = RnaSequence::new("ACACACAC").unwrap();
        let tables = model.energy_tables(&seq);
        let best = model.mfe_structure(&seq, &tables);
        assert_eq!(best.structure.dot_bracket(), "........");
        assert!(best.score.energy.is_zero());
    }
}
