//! RNA sequence model: bases, pair compatibility, FASTA input.

use std::fmt;
use std::fs::File;
use std::path::Path;

use bio::io::fasta;

use crate::types::PolyfoldError;

/// A single RNA base. `T` in input is coerced to [`Base::U`]; anything the
/// alphabet cannot express is rejected at parse time except `N`, which is
/// carried through and never pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    A,
    C,
    G,
    U,
    N,
}

impl Base {
    /// Parse a base, case-insensitively, coercing T to U.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'C' => Some(Self::C),
            'G' => Some(Self::G),
            'U' | 'T' => Some(Self::U),
            'N' => Some(Self::N),
            _ => None,
        }
    }

    /// Canonical upper-case character.
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::G => 'G',
            Self::U => 'U',
            Self::N => 'N',
        }
    }

    /// Index into the thermodynamic tables; `N` has no entry.
    #[must_use]
    pub const fn table_index(self) -> Option<usize> {
        match self {
            Self::A => Some(0),
            Self::C => Some(1),
            Self::G => Some(2),
            Self::U => Some(3),
            Self::N => None,
        }
    }

    /// Digit used to key the tetraloop and triloop bonus tables.
    #[must_use]
    pub const fn loop_digit(self) -> u32 {
        match self {
            Self::A => 1,
            Self::C => 2,
            Self::G => 3,
            Self::U => 4,
            Self::N => 0,
        }
    }
}

/// Watson-Crick and wobble pair predicate.
#[must_use]
pub const fn can_pair(x: Base, y: Base) -> bool {
    matches!(
        (x, y),
        (Base::A, Base::U)
            | (Base::U, Base::A)
            | (Base::G, Base::C)
            | (Base::C, Base::G)
            | (Base::G, Base::U)
            | (Base::U, Base::G)
    )
}

/// An immutable RNA sequence.
#[derive(Debug, Clone)]
pub struct RnaSequence {
    header: Option<String>,
    bases: Vec<Base>,
    text: String,
}

impl RnaSequence {
    /// Build a sequence from raw body text (whitespace ignored).
    pub fn new(raw: &str) -> Result<Self, PolyfoldError> {
        Self::with_header(None, raw)
    }

    /// Build a sequence from a header and raw body text.
    pub fn with_header(header: Option<String>, raw: &str) -> Result<Self, PolyfoldError> {
        let mut bases = Vec::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_whitespace() {
                continue;
            }
            match Base::from_char(c) {
                Some(base) => bases.push(base),
                None => {
                    return Err(PolyfoldError::InvalidSequence(format!(
                        "unexpected character {c:?}"
                    )))
                }
            }
        }
        if bases.is_empty() {
            return Err(PolyfoldError::InvalidSequence("empty sequence".to_string()));
        }
        let text = bases.iter().map(|b| b.to_char()).collect();
        Ok(Self {
            header,
            bases,
            text,
        })
    }

    /// Read the first record of a FASTA file.
    pub fn from_fasta_file(path: &Path) -> Result<Self, PolyfoldError> {
        let file = File::open(path)?;
        let reader = fasta::Reader::new(file);
        let record = reader
            .records()
            .next()
            .ok_or_else(|| {
                PolyfoldError::InvalidSequence(format!("{}: no FASTA records", path.display()))
            })?
            .map_err(|e| PolyfoldError::InvalidSequence(e.to_string()))?;
        let body: String = record.seq().iter().map(|&b| b as char).collect();
        Self::with_header(Some(record.id().to_string()), &body)
    }

    /// Number of bases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Whether the sequence holds no bases (never true for a parsed one).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// The base at 0-based position `i`.
    #[must_use]
    pub fn base(&self, i: usize) -> Base {
        self.bases[i]
    }

    /// Whether positions `i` and `j` hold a compatible pair.
    #[must_use]
    pub fn can_pair(&self, i: usize, j: usize) -> bool {
        can_pair(self.bases[i], self.bases[j])
    }

    /// FASTA header, if the sequence came from a file.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Normalized sequence text (upper-case, U for T).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for RnaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
