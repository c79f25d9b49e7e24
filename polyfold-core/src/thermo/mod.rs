//! Thermodynamic parameter tables and the parametric energy model built
//! on top of them.

pub mod model;
pub mod tables;

pub use model::EnergyModel;
pub use tables::{DangleSide, DangleTable, LoopTable, PairTable, ThermoTables};
