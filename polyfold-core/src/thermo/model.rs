//! Per-position energy functions of the nearest-neighbor model.
//!
//! All functions return *unscaled* classical energies; the recurrences
//! multiply by the scaling coefficient d at charge time, so the model
//! remains usable for objectives with d = 0 (no division appears
//! anywhere). Functions are pure in their indices and the frozen tables.

use std::sync::Arc;

use num_traits::Zero;

use crate::constants::MAXLOOP;
use crate::params::ParameterVector;
use crate::rational::{
    min_rational, rational_from_f64, rational_from_i64, Energy, Rational,
};
use crate::sequence::{Base, RnaSequence};
use crate::thermo::tables::{loop_bonus_key, DangleSide, PairTable, ThermoTables};
use crate::types::DangleMode;

/// The energy model: shared tables, the scoring parameter vector, and the
/// dangle mode. Immutable once built; freely shared across threads.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    tables: Arc<ThermoTables>,
    params: ParameterVector,
    dangles: DangleMode,
    shape: Vec<Rational>,
}

impl EnergyModel {
    /// Build a model over loaded tables.
    pub fn new(tables: Arc<ThermoTables>, params: ParameterVector, dangles: DangleMode) -> Self {
        Self {
            tables,
            params,
            dangles,
            shape: Vec::new(),
        }
    }

    /// Install per-position SHAPE corrections (position k maps to
    /// `shape[k]`). Positions beyond the vector score zero, as does the
    /// default empty vector.
    #[must_use]
    pub fn with_shape(mut self, shape: Vec<Rational>) -> Self {
        self.shape = shape;
        self
    }

    /// The underlying tables.
    pub fn tables(&self) -> &ThermoTables {
        &self.tables
    }

    /// The scoring parameter vector.
    pub fn params(&self) -> &ParameterVector {
        &self.params
    }

    /// The dangle mode.
    pub fn dangles(&self) -> DangleMode {
        self.dangles
    }

    /// Scale a classical energy by the d coefficient.
    #[must_use]
    pub fn scale(&self, energy: Energy) -> Energy {
        energy.scale(&self.params.dummy_scaling)
    }

    fn shape_at(&self, i: usize) -> Rational {
        self.shape.get(i).cloned().unwrap_or_else(Rational::zero)
    }

    fn oversize_penalty(&self, size: usize) -> Rational {
        &self.tables.prelog * &rational_from_f64((size as f64 / MAXLOOP as f64).ln())
    }

    fn terminal_mismatch(
        &self,
        table: &PairTable,
        seq: &RnaSequence,
        i: usize,
        j: usize,
    ) -> Energy {
        table.get(seq.base(i), seq.base(j), seq.base(i + 1), seq.base(j - 1))
    }

    /// Penalty for a non-GC closing pair.
    pub fn au_penalty(&self, seq: &RnaSequence, i: usize, j: usize) -> Rational {
        match (seq.base(i), seq.base(j)) {
            (Base::G, Base::C) | (Base::C, Base::G) => Rational::zero(),
            _ => self.tables.terminal_au.clone(),
        }
    }

    /// eH: hairpin loop closed by (i, j).
    pub fn hairpin(&self, seq: &RnaSequence, i: usize, j: usize) -> Energy {
        let tables = &*self.tables;
        let size = j - i - 1;
        if size == 0 {
            return Energy::Infinite;
        }

        let mut energy = if size > MAXLOOP {
            let extrapolated = &tables.hairpin[MAXLOOP] + &self.oversize_penalty(size);
            &extrapolated + &self.terminal_mismatch(&tables.tstkh, seq, i, j)
        } else if size > 4 {
            &tables.hairpin[size] + &self.terminal_mismatch(&tables.tstkh, seq, i, j)
        } else if size == 4 {
            let window: Vec<Base> = (i..=j).map(|k| seq.base(k)).collect();
            let bonus = tables
                .tloop
                .get(&loop_bonus_key(&window))
                .cloned()
                .unwrap_or_else(Rational::zero);
            &(&tables.hairpin[4] + &bonus) + &self.terminal_mismatch(&tables.tstkh, seq, i, j)
        } else if size == 3 {
            // Triloops take the closing-pair penalty but no terminal
            // mismatch stacking.
            &tables.hairpin[3] + &self.au_penalty(seq, i, j)
        } else {
            tables.hairpin[size].clone()
        };

        // GU closure preceded by GG
        if i >= 2
            && seq.base(i - 2) == Base::G
            && seq.base(i - 1) == Base::G
            && seq.base(i) == Base::G
            && seq.base(j) == Base::U
        {
            energy = &energy + &tables.gu_bonus;
        }

        if (1..=size).all(|k| seq.base(i + k) == Base::C) {
            if size == 3 {
                energy = &energy + &tables.c3;
            } else {
                let run = &tables.c_intercept + &(&tables.c_slope * &rational_from_i64(size as i64));
                energy = &energy + &run;
            }
        }

        energy
    }

    /// eS: stacked pair (i, j) on (i+1, j-1).
    pub fn stack(&self, seq: &RnaSequence, i: usize, j: usize) -> Energy {
        let base = self
            .tables
            .stack
            .get(seq.base(i), seq.base(j), seq.base(i + 1), seq.base(j - 1));
        &base + &(&self.shape_at(i) + &self.shape_at(j))
    }

    /// eL: internal loop or bulge with outer pair (i, j) and inner pair
    /// (ip, jp).
    pub fn internal_loop(
        &self,
        seq: &RnaSequence,
        i: usize,
        j: usize,
        ip: usize,
        jp: usize,
    ) -> Energy {
        let tables = &*self.tables;
        let size1 = ip - i - 1;
        let size2 = j - jp - 1;
        let size = size1 + size2;

        if size1 == 0 || size2 == 0 {
            // Bulge. A single bulged base keeps the helix stacked and
            // takes no closing-pair penalties.
            return if size > MAXLOOP {
                let both_au =
                    &self.au_penalty(seq, i, j) + &self.au_penalty(seq, ip, jp);
                &(&tables.bulge[MAXLOOP] + &self.oversize_penalty(size)) + &both_au
            } else if size == 1 {
                let stacked = tables
                    .stack
                    .get(seq.base(i), seq.base(j), seq.base(ip), seq.base(jp));
                let shape = &(&self.shape_at(i) + &self.shape_at(j))
                    + &(&self.shape_at(ip) + &self.shape_at(jp));
                &(&stacked + &tables.bulge[1]) + &shape
            } else {
                let both_au =
                    &self.au_penalty(seq, i, j) + &self.au_penalty(seq, ip, jp);
                &tables.bulge[size] + &both_au
            };
        }

        let lopsided = (size1 as i64 - size2 as i64).unsigned_abs() as i64;
        let narrow = size1.min(size2).min(2);
        let asymmetry = min_rational(
            tables.maxpen.clone(),
            &rational_from_i64(lopsided) * &tables.poppen[narrow],
        );
        let gail_applies = (size1 == 1 || size2 == 1) && tables.gail;

        if size > MAXLOOP {
            let (m1, m2) = if gail_applies {
                (
                    tables.tstki.get(seq.base(i), seq.base(j), Base::A, Base::A),
                    tables.tstki.get(seq.base(jp), seq.base(ip), Base::A, Base::A),
                )
            } else {
                (
                    self.terminal_mismatch(&tables.tstki, seq, i, j),
                    tables.tstki.get(
                        seq.base(jp),
                        seq.base(ip),
                        seq.base(jp + 1),
                        seq.base(ip - 1),
                    ),
                )
            };
            let sized = &tables.interior[MAXLOOP] + &self.oversize_penalty(size);
            return &(&m1 + &m2) + &(&sized + &asymmetry);
        }

        match (size1, size2) {
            (2, 2) => tables.iloop22.get(&[
                seq.base(i),
                seq.base(ip),
                seq.base(j),
                seq.base(jp),
                seq.base(i + 1),
                seq.base(i + 2),
                seq.base(j - 1),
                seq.base(j - 2),
            ]),
            (1, 2) => tables.iloop21.get(&[
                seq.base(i),
                seq.base(j),
                seq.base(i + 1),
                seq.base(j - 1),
                seq.base(j - 2),
                seq.base(ip),
                seq.base(jp),
            ]),
            (2, 1) => tables.iloop21.get(&[
                seq.base(jp),
                seq.base(ip),
                seq.base(j - 1),
                seq.base(i + 2),
                seq.base(i + 1),
                seq.base(j),
                seq.base(i),
            ]),
            (1, 1) => tables.iloop11.get(&[
                seq.base(i),
                seq.base(i + 1),
                seq.base(ip),
                seq.base(j),
                seq.base(j - 1),
                seq.base(jp),
            ]),
            _ if gail_applies => {
                let m1 = tables.tstki.get(seq.base(i), seq.base(j), Base::A, Base::A);
                let m2 = tables.tstki.get(seq.base(jp), seq.base(ip), Base::A, Base::A);
                &(&m1 + &m2) + &(&tables.interior[size] + &asymmetry)
            }
            _ => {
                let m1 = self.terminal_mismatch(&tables.tstki, seq, i, j);
                let m2 = tables.tstki.get(
                    seq.base(jp),
                    seq.base(ip),
                    seq.base(jp + 1),
                    seq.base(ip - 1),
                );
                &(&m1 + &m2) + &(&tables.interior[size] + &asymmetry)
            }
        }
    }

    fn dangle_or_zero(&self, i: Base, j: Base, k: Base, side: DangleSide) -> Energy {
        if k == Base::N {
            return Energy::zero();
        }
        self.tables.dangle.get(i, j, k, side)
    }

    /// Ed5: 5' dangle for the helix closed by (i, j). Outside orientation
    /// stacks base i-1 under the pair; the inside orientation (the
    /// multiloop closing pair seen from within) stacks base i+1. A
    /// dangling position outside the sequence contributes zero.
    pub fn ed5(&self, seq: &RnaSequence, i: usize, j: usize, inside: bool) -> Energy {
        if inside {
            self.dangle_or_zero(seq.base(i), seq.base(j), seq.base(i + 1), DangleSide::Three)
        } else if i == 0 {
            Energy::zero()
        } else {
            self.dangle_or_zero(seq.base(i), seq.base(j), seq.base(i - 1), DangleSide::Five)
        }
    }

    /// Ed3: 3' dangle for the helix closed by (i, j); see [`Self::ed5`].
    pub fn ed3(&self, seq: &RnaSequence, i: usize, j: usize, inside: bool) -> Energy {
        if inside {
            self.dangle_or_zero(seq.base(i), seq.base(j), seq.base(j - 1), DangleSide::Five)
        } else if j + 1 >= seq.len() {
            Energy::zero()
        } else {
            self.dangle_or_zero(seq.base(i), seq.base(j), seq.base(j + 1), DangleSide::Three)
        }
    }
}
