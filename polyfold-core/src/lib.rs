//! # polyfold — parametric RNA secondary structure prediction
//!
//! A Rust implementation of minimum free energy (MFE) RNA folding under
//! the Turner-99 nearest-neighbor thermodynamic model, with two layers on
//! top of the basic fold:
//!
//! - **Suboptimal enumeration**: every structure within an energy window
//!   of the MFE, produced by a depth-first search over partial structures.
//! - **Parametric analysis**: the full convex polytope of score vectors
//!   (multiloops, unpaired bases, branching helices, classical energy)
//!   that are optimal for *some* choice of the multiloop scoring
//!   parameters, built by driving the fold engine as a vertex oracle.
//!
//! All scoring arithmetic is exact: energies are arbitrary-precision
//! rationals end to end, which is what makes polytope vertices
//! well-defined.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use polyfold_core::params::ParameterVector;
//! use polyfold_core::sequence::RnaSequence;
//! use polyfold_core::thermo::{EnergyModel, ThermoTables};
//! use polyfold_core::types::DangleMode;
//!
//! let tables = Arc::new(ThermoTables::from_dir(Path::new("data/Turner99"))?);
//! let model = EnergyModel::new(tables, ParameterVector::default(), DangleMode::ChooseDangle);
//!
//! let seq = RnaSequence::new("GCGGAUUUAUCCGC")?;
//! let filled = model.energy_tables(&seq);
//! let best = model.mfe_structure(&seq, &filled);
//! println!("{}\t{}", best.structure, best.score.energy);
//! # Ok::<(), polyfold_core::types::PolyfoldError>(())
//! ```
//!
//! ## Module organization
//!
//! - [`rational`]: exact rational arithmetic and the +∞-extended energy
//! - [`sequence`]: bases, pair compatibility, FASTA input
//! - [`params`]: the (a, b, c, d) scoring parameter vector
//! - [`thermo`]: Turner-99 tables and the energy model
//! - [`structure`]: structures, dangle marks, score vectors
//! - [`fold`]: the DP engine, MFE traceback, suboptimal enumeration and
//!   structure rescoring
//! - [`polytope`]: the exact convex hull builder and its vertex oracle
//! - [`output`]: text writers for structures and polytopes

pub mod constants;
pub mod fold;
pub mod output;
pub mod params;
pub mod polytope;
pub mod rational;
pub mod sequence;
pub mod structure;
pub mod thermo;
pub mod types;

pub use params::ParameterVector;
pub use sequence::RnaSequence;
pub use structure::{RnaStructure, ScoreVector, ScoredStructure};
pub use thermo::EnergyModel;
pub use types::{DangleMode, PolyfoldError};
