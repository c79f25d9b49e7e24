//! Text writers for fold results.

use std::io::Write;

use crate::params::ParameterVector;
use crate::rational::{approx, Rational};
use crate::sequence::RnaSequence;
use crate::structure::ScoredStructure;
use crate::types::PolyfoldError;

/// Write one scored structure under its sequence: the dot-bracket string
/// with the score vector and exact rational energy alongside.
pub fn write_structure(
    writer: &mut dyn Write,
    seq: &RnaSequence,
    scored: &ScoredStructure,
) -> Result<(), PolyfoldError> {
    writeln!(writer, "{seq}")?;
    writeln!(writer, "{scored}\t≈ {:.4}", approx(&scored.score.energy))?;
    Ok(())
}

/// Write the suboptimal listing: the energy window, the coefficients it
/// was computed under, a column header, then one row per structure.
pub fn write_subopt_listing(
    writer: &mut dyn Write,
    seq: &RnaSequence,
    params: &ParameterVector,
    delta: &Rational,
    structures: &[ScoredStructure],
) -> Result<(), PolyfoldError> {
    writeln!(
        writer,
        "#\tSuboptimal secondary structures within {} of minimum energy.",
        approx(delta)
    )?;
    writeln!(writer, "#\tCoefficients:\t{params}")?;
    writeln!(writer, "#\t{seq}\tM\tU\tB\tw\tEnergy")?;
    writeln!(writer)?;
    for (index, scored) in structures.iter().enumerate() {
        writeln!(
            writer,
            "{index}\t{scored}\t≈ {}",
            approx(&scored.score.energy)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{RnaStructure, ScoreVector};
    use crate::testing::q;

    fn sample() -> (RnaSequence, ScoredStructure) {
        let seq = RnaSequence::new("GGGAAACCC").unwrap();
        let scored = ScoredStructure {
            structure: RnaStructure::from_dot_bracket("(((...)))").unwrap(),
            score: ScoreVector {
                w: q("-1.2"),
                energy: q("-1.2"),
                ..ScoreVector::zero()
            },
        };
        (seq, scored)
    }

    #[test]
    fn structure_output_carries_sequence_brackets_and_energy() {
        let (seq, scored) = sample();
        let mut buffer = Vec::new();
        write_structure(&mut buffer, &seq, &scored).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("GGGAAACCC"));
        assert!(text.contains("(((...)))"));
        assert!(text.contains("-6/5"));
    }

    #[test]
    fn subopt_listing_has_header_and_indexed_rows() {
        let (seq, scored) = sample();
        let mut buffer = Vec::new();
        write_subopt_listing(
            &mut buffer,
            &seq,
            &ParameterVector::default(),
            &q("2"),
            &[scored.clone(), scored],
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("#\tCoefficients:"));
        assert!(text.lines().any(|line| line.starts_with("0\t(((...)))")));
        assert!(text.lines().any(|line| line.starts_with("1\t(((...)))")));
    }
}
