//! The nearest-neighbor dynamic programming engine.
//!
//! [`FoldTables`] holds the five interval tables of the recurrence:
//!
//! - `V[i,j]` — best energy given that i pairs with j
//! - `VBI[i,j]` — best energy when (i, j) closes an internal loop/bulge
//! - `FM[i,j]` — best multiloop interior with at least one branch
//! - `FM1[i,j]` — best multiloop interior whose single branch starts at i
//! - `W[j]` — best structure on [0, j]
//!
//! Tables fill in strictly increasing interval width; every entry is
//! written once and immutable afterwards.
//!
//! The recurrence cases themselves are enumerated by the `*_candidates`
//! methods as [`Candidate`] values carrying the case's total energy, its
//! child segments, and the charges it commits. The fill takes the minimum
//! over candidates, the MFE traceback rediscovers the attaining case by
//! exact equality (ties break on the first match in enumeration order),
//! and the suboptimal search keeps every case within the energy window —
//! all three walk the same enumeration, so they cannot drift apart.
//!
//! Enumeration order, per table: `W`: unpaired-end case, then cut points
//! ascending (dangle variants in none/5'/3'/both order); `V`: hairpin,
//! stack, internal, multiloop splits ascending; `FM1`/`FM`: unpaired-end
//! case, single branch, multi-branch splits ascending, then free-prefix
//! cases ascending.

pub mod score;
pub mod subopt;
mod traceback;

use crate::constants::{MAXLOOP, TURN};
use crate::rational::{rational_from_i64, Energy, Rational};
use crate::sequence::RnaSequence;
use crate::structure::{RnaStructure, ScoreVector};
use crate::thermo::EnergyModel;
use crate::types::DangleMode;

/// Which table a traceback work item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegLabel {
    /// Exterior-loop table W.
    W,
    /// Paired table V.
    V,
    /// Internal-loop table VBI.
    Vbi,
    /// Multiloop interior FM.
    M,
    /// Single-branch multiloop interior FM1.
    M1,
}

/// The filled DP tables for one sequence under one energy model.
#[derive(Debug, Clone)]
pub struct FoldTables {
    n: usize,
    w: Vec<Energy>,
    v: Vec<Energy>,
    vbi: Vec<Energy>,
    fm: Vec<Energy>,
    fm1: Vec<Energy>,
}

impl FoldTables {
    fn new(n: usize) -> Self {
        Self {
            n,
            w: vec![Energy::Infinite; n],
            v: vec![Energy::Infinite; n * n],
            vbi: vec![Energy::Infinite; n * n],
            fm: vec![Energy::Infinite; n * n],
            fm1: vec![Energy::Infinite; n * n],
        }
    }

    /// Sequence length the tables were filled for.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.n);
        i * self.n + j
    }

    /// W[j]: best energy on [0, j].
    pub fn w(&self, j: usize) -> &Energy {
        &self.w[j]
    }

    /// V[i, j]: best energy given i pairs with j.
    pub fn v(&self, i: usize, j: usize) -> &Energy {
        &self.v[self.at(i, j)]
    }

    /// VBI[i, j]: best energy with (i, j) closing an internal loop.
    pub fn vbi(&self, i: usize, j: usize) -> &Energy {
        &self.vbi[self.at(i, j)]
    }

    /// FM[i, j]: best multiloop interior with at least one branch.
    pub fn fm(&self, i: usize, j: usize) -> &Energy {
        &self.fm[self.at(i, j)]
    }

    /// FM1[i, j]: best single-branch multiloop interior starting at i.
    pub fn fm1(&self, i: usize, j: usize) -> &Energy {
        &self.fm1[self.at(i, j)]
    }

    /// The entry a segment with the given label refers to.
    pub fn value(&self, label: SegLabel, i: usize, j: usize) -> &Energy {
        match label {
            SegLabel::W => self.w(j),
            SegLabel::V => self.v(i, j),
            SegLabel::Vbi => self.vbi(i, j),
            SegLabel::M => self.fm(i, j),
            SegLabel::M1 => self.fm1(i, j),
        }
    }
}

/// The charges a recurrence case commits when chosen: parametric counts
/// plus the classical (unscaled) remainder.
#[derive(Debug, Clone)]
pub(crate) struct LocalCharges {
    pub multiloops: i64,
    pub unpaired: i64,
    pub branches: i64,
    pub classical: Rational,
}

/// One alternative of a recurrence, shared by fill, traceback and the
/// suboptimal search.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    /// Local charges plus the table values of all child segments.
    pub energy: Energy,
    pub local: LocalCharges,
    pub children: Vec<(usize, usize, SegLabel)>,
    pub pair: Option<(usize, usize)>,
    pub d5_marks: Vec<usize>,
    pub d3_marks: Vec<usize>,
}

impl Candidate {
    /// Commit this case's pair, marks, and charges.
    pub(crate) fn apply(&self, structure: &mut RnaStructure, score: &mut ScoreVector, model: &EnergyModel) {
        if let Some((i, j)) = self.pair {
            structure.mark_pair(i, j);
        }
        for &mark in &self.d5_marks {
            structure.mark_d5(mark);
        }
        for &mark in &self.d3_marks {
            structure.mark_d3(mark);
        }
        let params = model.params();
        for _ in 0..self.local.multiloops {
            score.add_multiloop(params);
        }
        score.add_unpaired(self.local.unpaired, params);
        for _ in 0..self.local.branches {
            score.add_branch(params);
        }
        score.add_classical(&self.local.classical, params);
    }
}

/// Accumulates candidates for one table entry, discarding unreachable
/// cases as they are proposed.
struct CandidateSet<'m> {
    model: &'m EnergyModel,
    candidates: Vec<Candidate>,
}

impl<'m> CandidateSet<'m> {
    fn new(model: &'m EnergyModel) -> Self {
        Self {
            model,
            candidates: Vec::new(),
        }
    }

    /// Propose a case. `classical` is the unscaled classical charge;
    /// counts are the parametric charges. Unreachable cases (+∞ in the
    /// classical part or any child entry) are dropped here, so every
    /// retained candidate has a finite energy.
    #[allow(clippy::too_many_arguments)]
    fn propose(
        &mut self,
        tables: &FoldTables,
        classical: Energy,
        (multiloops, unpaired, branches): (i64, i64, i64),
        children: Vec<(usize, usize, SegLabel)>,
        pair: Option<(usize, usize)>,
        d5_marks: Vec<usize>,
        d3_marks: Vec<usize>,
    ) {
        let Energy::Finite(classical) = classical else {
            return;
        };
        let params = self.model.params();
        let mut energy = &classical * &params.dummy_scaling;
        energy = &energy + &(&params.multiloop_penalty * &rational_from_i64(multiloops));
        energy = &energy + &(&params.unpaired_penalty * &rational_from_i64(unpaired));
        energy = &energy + &(&params.branch_penalty * &rational_from_i64(branches));
        let mut total = Energy::Finite(energy);
        for &(ci, cj, label) in &children {
            total = &total + tables.value(label, ci, cj);
        }
        if !total.is_finite() {
            return;
        }
        self.candidates.push(Candidate {
            energy: total,
            local: LocalCharges {
                multiloops,
                unpaired,
                branches,
                classical,
            },
            children,
            pair,
            d5_marks,
            d3_marks,
        });
    }

    fn minimum(&self) -> Energy {
        self.candidates
            .iter()
            .map(|c| c.energy.clone())
            .min()
            .unwrap_or(Energy::Infinite)
    }
}

impl EnergyModel {
    /// Fill the five DP tables for `seq`.
    pub fn energy_tables(&self, seq: &RnaSequence) -> FoldTables {
        let n = seq.len();
        let mut tables = FoldTables::new(n);

        for width in (TURN + 1)..n {
            for i in 0..(n - width) {
                let j = i + width;
                if seq.can_pair(i, j) {
                    let vbi = self.vbi_candidates(seq, &tables, i, j).minimum();
                    let index = tables.at(i, j);
                    tables.vbi[index] = vbi;
                    let v = self.v_candidates(seq, &tables, i, j).minimum();
                    tables.v[index] = v;
                }
                let fm1 = self.m1_candidates(seq, &tables, i, j).minimum();
                let index = tables.at(i, j);
                tables.fm1[index] = fm1;
                let fm = self.m_candidates(seq, &tables, i, j).minimum();
                tables.fm[index] = fm;
            }
        }

        for j in 0..n {
            let best = if j <= TURN {
                Energy::zero()
            } else {
                self.w_candidates(seq, &tables, j).minimum()
            };
            tables.w[j] = best;
        }

        tables
    }

    /// The minimum free energy: W over the whole sequence.
    pub fn minimum_energy(&self, tables: &FoldTables) -> Energy {
        match tables.n() {
            0 => Energy::zero(),
            n => tables.w(n - 1).clone(),
        }
    }

    pub(crate) fn candidates_for(
        &self,
        label: SegLabel,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) -> Vec<Candidate> {
        let set = match label {
            SegLabel::W => self.w_candidates(seq, tables, j),
            SegLabel::V => self.v_candidates(seq, tables, i, j),
            SegLabel::Vbi => self.vbi_candidates(seq, tables, i, j),
            SegLabel::M => self.m_candidates(seq, tables, i, j),
            SegLabel::M1 => self.m1_candidates(seq, tables, i, j),
        };
        set.candidates
    }

    /// W[j] cases: j unpaired, then one exterior branch ending at (or
    /// dangling into) j for every cut point l.
    fn w_candidates<'m>(
        &'m self,
        seq: &RnaSequence,
        tables: &FoldTables,
        j: usize,
    ) -> CandidateSet<'m> {
        let mut set = CandidateSet::new(self);
        debug_assert!(j > TURN);

        set.propose(
            tables,
            Energy::zero(),
            (0, 0, 0),
            vec![(0, j - 1, SegLabel::W)],
            None,
            vec![],
            vec![],
        );

        for l in 0..=(j - TURN - 1) {
            let rest = |children: &mut Vec<(usize, usize, SegLabel)>| {
                if l > 0 {
                    children.push((0, l - 1, SegLabel::W));
                }
            };
            match self.dangles() {
                DangleMode::NoDangle => {
                    let mut children = vec![(l, j, SegLabel::V)];
                    rest(&mut children);
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, l, j)),
                        (0, 0, 0),
                        children,
                        None,
                        vec![],
                        vec![],
                    );
                }
                DangleMode::ChooseDangle => {
                    let mut children = vec![(l, j, SegLabel::V)];
                    rest(&mut children);
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, l, j)),
                        (0, 0, 0),
                        children,
                        None,
                        vec![],
                        vec![],
                    );
                    if l + 1 < j - TURN {
                        let mut children = vec![(l + 1, j, SegLabel::V)];
                        rest(&mut children);
                        let classical = &self.ed5(seq, l + 1, j, false)
                            + &self.au_penalty(seq, l + 1, j);
                        set.propose(
                            tables,
                            classical,
                            (0, 0, 0),
                            children,
                            None,
                            vec![l],
                            vec![],
                        );
                    }
                    if l < j - TURN - 1 {
                        let mut children = vec![(l, j - 1, SegLabel::V)];
                        rest(&mut children);
                        let classical = &self.ed3(seq, l, j - 1, false)
                            + &self.au_penalty(seq, l, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, 0, 0),
                            children,
                            None,
                            vec![],
                            vec![j],
                        );
                    }
                    if l + 1 < j - TURN - 1 {
                        let mut children = vec![(l + 1, j - 1, SegLabel::V)];
                        rest(&mut children);
                        let dangles = &self.ed5(seq, l + 1, j - 1, false)
                            + &self.ed3(seq, l + 1, j - 1, false);
                        let classical = &dangles + &self.au_penalty(seq, l + 1, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, 0, 0),
                            children,
                            None,
                            vec![l],
                            vec![j],
                        );
                    }
                }
                DangleMode::BothDangle => {
                    let mut children = vec![(l, j, SegLabel::V)];
                    rest(&mut children);
                    let dangles = &self.ed5(seq, l, j, false) + &self.ed3(seq, l, j, false);
                    let classical = &dangles + &self.au_penalty(seq, l, j);
                    set.propose(tables, classical, (0, 0, 0), children, None, vec![], vec![]);
                }
            }
        }
        set
    }

    /// V[i,j] cases: hairpin, stack, internal loop, multiloop closing.
    fn v_candidates<'m>(
        &'m self,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) -> CandidateSet<'m> {
        let mut set = CandidateSet::new(self);
        debug_assert!(j - i > TURN && seq.can_pair(i, j));

        set.propose(
            tables,
            self.hairpin(seq, i, j),
            (0, 0, 0),
            vec![],
            Some((i, j)),
            vec![],
            vec![],
        );
        set.propose(
            tables,
            self.stack(seq, i, j),
            (0, 0, 0),
            vec![(i + 1, j - 1, SegLabel::V)],
            Some((i, j)),
            vec![],
            vec![],
        );
        set.propose(
            tables,
            Energy::zero(),
            (0, 0, 0),
            vec![(i, j, SegLabel::Vbi)],
            None,
            vec![],
            vec![],
        );

        // Multiloop closing: split the interior at k into FM + FM1, with
        // the closing pair's dangles taken inside the loop.
        for k in (i + 2)..=(j - TURN - 1) {
            match self.dangles() {
                DangleMode::NoDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, i, j)),
                        (1, 0, 1),
                        vec![(i + 1, k, SegLabel::M), (k + 1, j - 1, SegLabel::M1)],
                        Some((i, j)),
                        vec![],
                        vec![],
                    );
                }
                DangleMode::ChooseDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, i, j)),
                        (1, 0, 1),
                        vec![(i + 1, k, SegLabel::M), (k + 1, j - 1, SegLabel::M1)],
                        Some((i, j)),
                        vec![],
                        vec![],
                    );
                    if k > i + 2 {
                        let classical =
                            &self.ed5(seq, i, j, true) + &self.au_penalty(seq, i, j);
                        set.propose(
                            tables,
                            classical,
                            (1, 1, 1),
                            vec![(i + 2, k, SegLabel::M), (k + 1, j - 1, SegLabel::M1)],
                            Some((i, j)),
                            vec![],
                            vec![i + 1],
                        );
                    }
                    if k <= j - TURN - 2 {
                        let classical =
                            &self.ed3(seq, i, j, true) + &self.au_penalty(seq, i, j);
                        set.propose(
                            tables,
                            classical,
                            (1, 1, 1),
                            vec![(i + 1, k, SegLabel::M), (k + 1, j - 2, SegLabel::M1)],
                            Some((i, j)),
                            vec![j - 1],
                            vec![],
                        );
                    }
                    if k > i + 2 && k <= j - TURN - 2 {
                        let dangles = &self.ed5(seq, i, j, true) + &self.ed3(seq, i, j, true);
                        let classical = &dangles + &self.au_penalty(seq, i, j);
                        set.propose(
                            tables,
                            classical,
                            (1, 2, 1),
                            vec![(i + 2, k, SegLabel::M), (k + 1, j - 2, SegLabel::M1)],
                            Some((i, j)),
                            vec![j - 1],
                            vec![i + 1],
                        );
                    }
                }
                DangleMode::BothDangle => {
                    let dangles = &self.ed5(seq, i, j, false) + &self.ed3(seq, i, j, false);
                    let classical = &dangles + &self.au_penalty(seq, i, j);
                    set.propose(
                        tables,
                        classical,
                        (1, 0, 1),
                        vec![(i + 1, k, SegLabel::M), (k + 1, j - 1, SegLabel::M1)],
                        Some((i, j)),
                        vec![],
                        vec![],
                    );
                }
            }
        }
        set
    }

    /// VBI[i,j] cases: every admissible inner pair (p, q).
    fn vbi_candidates<'m>(
        &'m self,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) -> CandidateSet<'m> {
        let mut set = CandidateSet::new(self);
        let p_max = (j as i64 - 2 - TURN as i64).min(i as i64 + MAXLOOP as i64 + 1);
        let mut p = i as i64 + 1;
        while p <= p_max {
            let pu = p as usize;
            let q_min = (j as i64 - i as i64 + p - MAXLOOP as i64 - 2).max(p + 1 + TURN as i64);
            let q_max = if pu == i + 1 { j - 2 } else { j - 1 };
            let mut q = q_min.max(0);
            while q <= q_max as i64 {
                let qu = q as usize;
                set.propose(
                    tables,
                    self.internal_loop(seq, i, j, pu, qu),
                    (0, 0, 0),
                    vec![(pu, qu, SegLabel::V)],
                    Some((i, j)),
                    vec![],
                    vec![],
                );
                q += 1;
            }
            p += 1;
        }
        set
    }

    /// A multiloop branch on [i, j] with its dangle variants: shared by
    /// the single-branch cases of FM1 and FM.
    fn branch_cases(
        &self,
        set: &mut CandidateSet<'_>,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) {
        match self.dangles() {
            DangleMode::NoDangle => {
                set.propose(
                    tables,
                    Energy::Finite(self.au_penalty(seq, i, j)),
                    (0, 0, 1),
                    vec![(i, j, SegLabel::V)],
                    None,
                    vec![],
                    vec![],
                );
            }
            DangleMode::ChooseDangle => {
                set.propose(
                    tables,
                    Energy::Finite(self.au_penalty(seq, i, j)),
                    (0, 0, 1),
                    vec![(i, j, SegLabel::V)],
                    None,
                    vec![],
                    vec![],
                );
                if i + 1 < j {
                    let classical =
                        &self.ed5(seq, i + 1, j, false) + &self.au_penalty(seq, i + 1, j);
                    set.propose(
                        tables,
                        classical,
                        (0, 1, 1),
                        vec![(i + 1, j, SegLabel::V)],
                        None,
                        vec![i],
                        vec![],
                    );
                }
                if i < j - 1 {
                    let classical =
                        &self.ed3(seq, i, j - 1, false) + &self.au_penalty(seq, i, j - 1);
                    set.propose(
                        tables,
                        classical,
                        (0, 1, 1),
                        vec![(i, j - 1, SegLabel::V)],
                        None,
                        vec![],
                        vec![j],
                    );
                }
                if i + 1 < j - 1 {
                    let dangles = &self.ed5(seq, i + 1, j - 1, false)
                        + &self.ed3(seq, i + 1, j - 1, false);
                    let classical = &dangles + &self.au_penalty(seq, i + 1, j - 1);
                    set.propose(
                        tables,
                        classical,
                        (0, 2, 1),
                        vec![(i + 1, j - 1, SegLabel::V)],
                        None,
                        vec![i],
                        vec![j],
                    );
                }
            }
            DangleMode::BothDangle => {
                let dangles = &self.ed5(seq, i, j, false) + &self.ed3(seq, i, j, false);
                let classical = &dangles + &self.au_penalty(seq, i, j);
                set.propose(
                    tables,
                    classical,
                    (0, 0, 1),
                    vec![(i, j, SegLabel::V)],
                    None,
                    vec![],
                    vec![],
                );
            }
        }
    }

    /// FM1[i,j] cases: j unpaired, or the single branch ends at (or
    /// dangles into) j.
    fn m1_candidates<'m>(
        &'m self,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) -> CandidateSet<'m> {
        let mut set = CandidateSet::new(self);
        set.propose(
            tables,
            Energy::zero(),
            (0, 1, 0),
            vec![(i, j - 1, SegLabel::M1)],
            None,
            vec![],
            vec![],
        );
        self.branch_cases(&mut set, seq, tables, i, j);
        set
    }

    /// FM[i,j] cases: j unpaired, a single branch spanning the region, a
    /// multi-branch split, or a free-base prefix before a single branch.
    fn m_candidates<'m>(
        &'m self,
        seq: &RnaSequence,
        tables: &FoldTables,
        i: usize,
        j: usize,
    ) -> CandidateSet<'m> {
        let mut set = CandidateSet::new(self);
        set.propose(
            tables,
            Energy::zero(),
            (0, 1, 0),
            vec![(i, j - 1, SegLabel::M)],
            None,
            vec![],
            vec![],
        );
        self.branch_cases(&mut set, seq, tables, i, j);

        for k in (i + TURN + 1)..=(j - TURN - 1) {
            let fm = (i, k, SegLabel::M);
            match self.dangles() {
                DangleMode::NoDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, k + 1, j)),
                        (0, 0, 1),
                        vec![fm, (k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                }
                DangleMode::ChooseDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, k + 1, j)),
                        (0, 0, 1),
                        vec![fm, (k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                    if k + 2 <= j - TURN {
                        let classical =
                            &self.ed5(seq, k + 2, j, false) + &self.au_penalty(seq, k + 2, j);
                        set.propose(
                            tables,
                            classical,
                            (0, 1, 1),
                            vec![fm, (k + 2, j, SegLabel::V)],
                            None,
                            vec![k + 1],
                            vec![],
                        );
                    }
                    if k + 1 <= j - 1 - TURN {
                        let classical = &self.ed3(seq, k + 1, j - 1, false)
                            + &self.au_penalty(seq, k + 1, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, 1, 1),
                            vec![fm, (k + 1, j - 1, SegLabel::V)],
                            None,
                            vec![],
                            vec![j],
                        );
                    }
                    if k + 2 <= j - 1 - TURN {
                        let dangles = &self.ed5(seq, k + 2, j - 1, false)
                            + &self.ed3(seq, k + 2, j - 1, false);
                        let classical = &dangles + &self.au_penalty(seq, k + 2, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, 2, 1),
                            vec![fm, (k + 2, j - 1, SegLabel::V)],
                            None,
                            vec![k + 1],
                            vec![j],
                        );
                    }
                }
                DangleMode::BothDangle => {
                    let dangles =
                        &self.ed5(seq, k + 1, j, false) + &self.ed3(seq, k + 1, j, false);
                    let classical = &dangles + &self.au_penalty(seq, k + 1, j);
                    set.propose(
                        tables,
                        classical,
                        (0, 0, 1),
                        vec![fm, (k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                }
            }
        }

        for k in i..=(j - TURN - 1) {
            let prefix = (k - i) as i64;
            match self.dangles() {
                DangleMode::NoDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, k + 1, j)),
                        (0, prefix + 1, 1),
                        vec![(k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                }
                DangleMode::ChooseDangle => {
                    set.propose(
                        tables,
                        Energy::Finite(self.au_penalty(seq, k + 1, j)),
                        (0, prefix + 1, 1),
                        vec![(k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                    if k + 2 <= j - TURN {
                        let classical =
                            &self.ed5(seq, k + 2, j, false) + &self.au_penalty(seq, k + 2, j);
                        set.propose(
                            tables,
                            classical,
                            (0, prefix + 2, 1),
                            vec![(k + 2, j, SegLabel::V)],
                            None,
                            vec![k + 1],
                            vec![],
                        );
                    }
                    if k + 1 <= j - 1 - TURN {
                        let classical = &self.ed3(seq, k + 1, j - 1, false)
                            + &self.au_penalty(seq, k + 1, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, prefix + 2, 1),
                            vec![(k + 1, j - 1, SegLabel::V)],
                            None,
                            vec![],
                            vec![j],
                        );
                    }
                    if k + 2 <= j - 1 - TURN {
                        let dangles = &self.ed5(seq, k + 2, j - 1, false)
                            + &self.ed3(seq, k + 2, j - 1, false);
                        let classical = &dangles + &self.au_penalty(seq, k + 2, j - 1);
                        set.propose(
                            tables,
                            classical,
                            (0, prefix + 3, 1),
                            vec![(k + 2, j - 1, SegLabel::V)],
                            None,
                            vec![k + 1],
                            vec![j],
                        );
                    }
                }
                DangleMode::BothDangle => {
                    let dangles =
                        &self.ed5(seq, k + 1, j, false) + &self.ed3(seq, k + 1, j, false);
                    let classical = &dangles + &self.au_penalty(seq, k + 1, j);
                    set.propose(
                        tables,
                        classical,
                        (0, prefix + 1, 1),
                        vec![(k + 1, j, SegLabel::V)],
                        None,
                        vec![],
                        vec![],
                    );
                }
            }
        }
        set
    }
}
