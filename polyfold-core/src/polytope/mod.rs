//! The parametric polytope: the convex hull of score vectors achievable
//! by any secondary structure of a sequence.
//!
//! Every vertex corresponds to a combinatorially distinct structure that
//! is MFE-optimal for some choice of the scoring parameters. The builder
//! drives the fold engine as an exact vertex oracle: an objective θ maps
//! to a parameter vector, the MFE structure under those parameters is
//! computed, and its score vector is the achievable point minimizing
//! θ·x.

pub mod hull;

pub use hull::{build_hull, BuildObserver, Facet, Hull, Point, SilentObserver, Vector};

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use crate::params::ParameterVector;
use crate::rational::{rational_from_i64, Rational};
use crate::sequence::RnaSequence;
use crate::structure::ScoredStructure;
use crate::thermo::{EnergyModel, ThermoTables};
use crate::types::{DangleMode, PolyfoldError};

/// The polytope of a sequence, with the structure that realized every
/// oracle answer.
#[derive(Debug)]
pub struct RnaPolytope {
    /// The sequence the polytope describes.
    pub sequence: RnaSequence,
    /// Dangle mode used by every oracle call.
    pub dangles: DangleMode,
    /// Fixed unpaired-base weight of the 3D sub-mode, if any.
    pub multiloop_weight: Option<Rational>,
    structures: FxHashMap<Point, ScoredStructure>,
    hull: Hull,
}

impl RnaPolytope {
    /// Build the polytope: 4D over (m, u, h, w), or 3D over (m, h, w')
    /// when a fixed unpaired weight collapses the u dimension into the
    /// scaling (w' = w + weight·u).
    pub fn build(
        tables: Arc<ThermoTables>,
        sequence: RnaSequence,
        dangles: DangleMode,
        multiloop_weight: Option<Rational>,
        observer: &dyn BuildObserver,
    ) -> Self {
        let dim = if multiloop_weight.is_some() { 3 } else { 4 };
        let structures: Mutex<FxHashMap<Point, ScoredStructure>> =
            Mutex::new(FxHashMap::default());

        let oracle = |objective: &Vector| -> Point {
            let params = oracle_params(objective, multiloop_weight.as_ref());
            let model = EnergyModel::new(Arc::clone(&tables), params, dangles);
            let filled = model.energy_tables(&sequence);
            let scored = model.mfe_structure(&sequence, &filled);
            let point = project(&scored, multiloop_weight.as_ref());
            structures
                .lock()
                .expect("oracle bookkeeping poisoned")
                .insert(point.clone(), scored);
            point
        };

        let hull = build_hull(dim, &oracle, observer);
        Self {
            sequence,
            dangles,
            multiloop_weight,
            structures: structures.into_inner().expect("oracle bookkeeping poisoned"),
            hull,
        }
    }

    /// Ambient dimension (3 or 4).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.hull.dimension()
    }

    /// The underlying hull.
    pub fn hull(&self) -> &Hull {
        &self.hull
    }

    /// Number of hull vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.hull.vertex_points().len()
    }

    /// Number of hull facets.
    #[must_use]
    pub fn number_of_facets(&self) -> usize {
        self.hull.facet_count()
    }

    /// Hull vertices with the structures that realized them.
    pub fn vertices(&self) -> Vec<(&Point, &ScoredStructure)> {
        self.hull
            .vertex_points()
            .into_iter()
            .map(|point| {
                let structure = self
                    .structures
                    .get(point)
                    .expect("every hull vertex was an oracle answer");
                (point, structure)
            })
            .collect()
    }

    /// Write the polytope in the text format: counts, a header with the
    /// sequence, then one line per vertex.
    pub fn write(&self, writer: &mut dyn Write) -> Result<(), PolyfoldError> {
        writeln!(writer, "# Points: {}", self.number_of_vertices())?;
        writeln!(writer, "# Facets: {}", self.number_of_facets())?;
        writeln!(writer)?;
        writeln!(writer, "#\t{}\tm\tu\th\tw\te", self.sequence)?;
        for (index, (_, structure)) in self.vertices().iter().enumerate() {
            writeln!(writer, "{}\t{}", index + 1, structure)?;
        }
        Ok(())
    }

    /// Write the polytope to a file.
    pub fn write_to_file(&self, path: &Path) -> Result<(), PolyfoldError> {
        let mut file = std::fs::File::create(path)?;
        self.write(&mut file)
    }
}

/// Interpret a hull objective as a parameter vector. In 3D mode the
/// fixed unpaired weight rides on the scaling coordinate, which is what
/// makes the collapsed oracle exact.
fn oracle_params(objective: &Vector, multiloop_weight: Option<&Rational>) -> ParameterVector {
    match multiloop_weight {
        None => ParameterVector::new(
            objective[0].clone(),
            objective[1].clone(),
            objective[2].clone(),
            objective[3].clone(),
        ),
        Some(weight) => ParameterVector::new(
            objective[0].clone(),
            weight * &objective[2],
            objective[1].clone(),
            objective[2].clone(),
        ),
    }
}

/// Project a scored structure onto the polytope's coordinates.
fn project(scored: &ScoredStructure, multiloop_weight: Option<&Rational>) -> Point {
    match multiloop_weight {
        None => scored.score.point(),
        Some(weight) => vec![
            rational_from_i64(scored.score.multiloops),
            rational_from_i64(scored.score.branches),
            &scored.score.w + &(weight * &rational_from_i64(scored.score.unpaired)),
        ],
    }
}
