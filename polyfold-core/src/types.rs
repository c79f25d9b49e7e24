use thiserror::Error;

/// Dangle handling applied at every helix end adjacent to a loop.
///
/// The integer forms (0, 1, 2) match the `--dangle-model` CLI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangleMode {
    /// No dangle terms anywhere.
    NoDangle,
    /// Each branch end independently chooses none, 5', 3' or both dangles;
    /// a chosen dangle consumes the adjacent unpaired base.
    ChooseDangle,
    /// Both dangle terms are always charged; no base is consumed.
    BothDangle,
}

impl DangleMode {
    /// Convert the CLI model number into a mode.
    pub fn from_model_number(number: i64) -> Result<Self, PolyfoldError> {
        match number {
            0 => Ok(Self::NoDangle),
            1 => Ok(Self::ChooseDangle),
            2 => Ok(Self::BothDangle),
            other => Err(PolyfoldError::InvalidDangleModel(other)),
        }
    }

    /// The CLI model number for this mode.
    #[must_use]
    pub const fn model_number(self) -> i64 {
        match self {
            Self::NoDangle => 0,
            Self::ChooseDangle => 1,
            Self::BothDangle => 2,
        }
    }
}

/// Error types produced while loading inputs or scoring structures.
#[derive(Error, Debug)]
pub enum PolyfoldError {
    /// Invalid input sequence format or content
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
    /// A structure file or dot-bracket string could not be interpreted
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
    /// A numeric literal was not a decimal or a fraction
    #[error("Invalid rational literal: {0}")]
    InvalidRational(String),
    /// Dangle model outside {0, 1, 2}
    #[error("Invalid dangle model: {0} (expected 0, 1 or 2)")]
    InvalidDangleModel(i64),
    /// A thermodynamic parameter table failed to load
    #[error("Parameter table {table}: {reason}")]
    InvalidTable {
        /// Table file stem, e.g. `stack`
        table: String,
        /// Human-readable parse failure
        reason: String,
    },
    /// A driver-supplied parameter was out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
