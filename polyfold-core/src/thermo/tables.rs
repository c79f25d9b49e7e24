//! Turner-99 thermodynamic parameter tables.
//!
//! Tables load once from a parameter directory holding one text file per
//! table. Every file is a stream of whitespace-separated tokens; `#`
//! starts a comment running to end of line; a token of `.` or `inf`
//! denotes an undefined entry, which maps to +∞. Values are exact decimal
//! or fractional literals. Multi-dimensional tables are stored flat in
//! row-major base order (A, C, G, U), indexed by packed base codes.
//!
//! File inventory (sizes in tokens):
//!
//! - `miscloop.dat` — prelog, maxpen, poppen[1..4], the classical
//!   multiloop triple, the efn2 multiloop triple, terminal AU penalty,
//!   GGG·U hairpin bonus, poly-C slope/intercept/size-3, intermolecular
//!   initiation, GAIL flag (19).
//! - `loop.dat` — rows `size interior bulge hairpin`, sizes 1..=30 (120).
//! - `stack.dat`, `tstkh.dat`, `tstki.dat`, `tstacke.dat`, `tstackm.dat`,
//!   `tstacki23.dat` — pair/mismatch grids (256 each).
//! - `dangle.dat` — [pair-i][pair-j][dangling base][side] with side 0 = 5'
//!   and 1 = 3' (128).
//! - `tloop.dat` / `triloop.dat` — `SEQUENCE bonus` rows over 6-mers and
//!   5-mers.
//! - `iloop11.dat` (4096), `iloop21.dat` (16384), `iloop22.dat` (65536).

use std::fs;
use std::path::Path;

use num_traits::Zero;
use rustc_hash::FxHashMap;

use crate::constants::MAXLOOP;
use crate::rational::{parse_rational, Energy, Rational};
use crate::sequence::Base;
use crate::types::PolyfoldError;

/// A 4-base lookup grid (stacks and terminal mismatches).
#[derive(Debug, Clone)]
pub struct PairTable {
    data: Vec<Energy>,
}

impl PairTable {
    /// A grid with every entry set to the same energy.
    #[must_use]
    pub fn uniform(value: Energy) -> Self {
        Self {
            data: vec![value; 256],
        }
    }

    /// Set the entry for the packed base code (a, b, c, d).
    pub fn set(&mut self, a: Base, b: Base, c: Base, d: Base, value: Energy) {
        if let Some(index) = pack(&[a, b, c, d]) {
            self.data[index] = value;
        }
    }

    /// Look up (a, b, c, d); any `N` yields +∞.
    #[must_use]
    pub fn get(&self, a: Base, b: Base, c: Base, d: Base) -> Energy {
        match pack(&[a, b, c, d]) {
            Some(index) => self.data[index].clone(),
            None => Energy::Infinite,
        }
    }

    fn from_tokens(table: &str, tokens: &[String]) -> Result<Self, PolyfoldError> {
        let data = parse_energies(table, tokens, 256)?;
        Ok(Self { data })
    }
}

/// Dangling-base energies: [pair-i][pair-j][dangling base][side].
#[derive(Debug, Clone)]
pub struct DangleTable {
    data: Vec<Energy>,
}

/// Side selector for [`DangleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangleSide {
    /// The dangling base sits 5' of the helix end.
    Five,
    /// The dangling base sits 3' of the helix end.
    Three,
}

impl DangleTable {
    /// A table with every entry set to the same energy.
    #[must_use]
    pub fn uniform(value: Energy) -> Self {
        Self {
            data: vec![value; 128],
        }
    }

    /// Set the entry for pair (i, j) with dangling base `k`.
    pub fn set(&mut self, i: Base, j: Base, k: Base, side: DangleSide, value: Energy) {
        if let Some(index) = pack(&[i, j, k]) {
            self.data[index * 2 + side_index(side)] = value;
        }
    }

    /// Look up pair (i, j) with dangling base `k`; any `N` yields +∞.
    #[must_use]
    pub fn get(&self, i: Base, j: Base, k: Base, side: DangleSide) -> Energy {
        match pack(&[i, j, k]) {
            Some(index) => self.data[index * 2 + side_index(side)].clone(),
            None => Energy::Infinite,
        }
    }

    fn from_tokens(table: &str, tokens: &[String]) -> Result<Self, PolyfoldError> {
        let data = parse_energies(table, tokens, 128)?;
        Ok(Self { data })
    }
}

const fn side_index(side: DangleSide) -> usize {
    match side {
        DangleSide::Five => 0,
        DangleSide::Three => 1,
    }
}

/// A flat table over `arity` packed base codes (the special internal-loop
/// tables; iloop22 is the 8-index case).
#[derive(Debug, Clone)]
pub struct LoopTable {
    arity: usize,
    data: Vec<Energy>,
}

impl LoopTable {
    /// A table of the given arity with every entry set to one energy.
    #[must_use]
    pub fn uniform(arity: usize, value: Energy) -> Self {
        Self {
            arity,
            data: vec![value; 1 << (2 * arity)],
        }
    }

    /// Set one entry by its packed base code.
    pub fn set(&mut self, bases: &[Base], value: Energy) {
        debug_assert_eq!(bases.len(), self.arity);
        if let Some(index) = pack(bases) {
            self.data[index] = value;
        }
    }

    /// Look up a packed base code; any `N` yields +∞.
    #[must_use]
    pub fn get(&self, bases: &[Base]) -> Energy {
        debug_assert_eq!(bases.len(), self.arity);
        match pack(bases) {
            Some(index) => self.data[index].clone(),
            None => Energy::Infinite,
        }
    }

    fn from_tokens(table: &str, arity: usize, tokens: &[String]) -> Result<Self, PolyfoldError> {
        let data = parse_energies(table, tokens, 1 << (2 * arity))?;
        Ok(Self { arity, data })
    }
}

fn pack(bases: &[Base]) -> Option<usize> {
    let mut index = 0;
    for base in bases {
        index = index * 4 + base.table_index()?;
    }
    Some(index)
}

/// The tetraloop/triloop bonus key: the loop window read as a base-10
/// number over A=1, C=2, G=3, U=4.
#[must_use]
pub fn loop_bonus_key(bases: &[Base]) -> u32 {
    bases.iter().fold(0, |key, base| key * 10 + base.loop_digit())
}

/// The full Turner-99 table set, unscaled.
///
/// Immutable after load; shared freely across threads.
#[derive(Debug, Clone)]
pub struct ThermoTables {
    /// Coefficient of the logarithmic extrapolation for loops larger
    /// than [`MAXLOOP`].
    pub prelog: Rational,
    /// Cap on the internal-loop asymmetry penalty.
    pub maxpen: Rational,
    /// Per-size asymmetry penalty weights (file order; index 0 unused).
    pub poppen: Vec<Rational>,
    /// Penalty for a non-GC closing pair.
    pub terminal_au: Rational,
    /// Bonus for a GU hairpin closure preceded by GG.
    pub gu_bonus: Rational,
    /// Poly-C hairpin slope.
    pub c_slope: Rational,
    /// Poly-C hairpin intercept.
    pub c_intercept: Rational,
    /// Poly-C hairpin bonus at size 3.
    pub c3: Rational,
    /// Grossly Asymmetric Interior Loop rule flag.
    pub gail: bool,
    /// Internal loop initiation by size (1..=30; others +∞).
    pub interior: Vec<Energy>,
    /// Bulge initiation by size.
    pub bulge: Vec<Energy>,
    /// Hairpin initiation by size.
    pub hairpin: Vec<Energy>,
    /// Helix stacking.
    pub stack: PairTable,
    /// Terminal mismatch stacking for hairpins.
    pub tstkh: PairTable,
    /// Terminal mismatch stacking for internal loops.
    pub tstki: PairTable,
    /// Terminal stacking at exterior-loop helix ends.
    pub tstacke: PairTable,
    /// Terminal stacking at multiloop helix ends.
    pub tstackm: PairTable,
    /// Terminal mismatch table for 2×3 internal loops.
    pub tstacki23: PairTable,
    /// Dangling-base energies.
    pub dangle: DangleTable,
    /// Tetraloop bonuses keyed by the 6-base window.
    pub tloop: FxHashMap<u32, Rational>,
    /// Triloop bonuses keyed by the 5-base window.
    pub triloop: FxHashMap<u32, Rational>,
    /// 1×1 internal loops: [i][i+1][p][j][j-1][q].
    pub iloop11: LoopTable,
    /// 1×2 internal loops: [i][j][i+1][j-1][j-2][p][q].
    pub iloop21: LoopTable,
    /// 2×2 internal loops: [i][p][j][q][i+1][i+2][j-1][j-2].
    pub iloop22: LoopTable,
}

impl ThermoTables {
    /// Load every table from a parameter directory.
    pub fn from_dir(dir: &Path) -> Result<Self, PolyfoldError> {
        let misc = read_tokens(dir, "miscloop")?;
        if misc.len() < 19 {
            return Err(table_err(
                "miscloop",
                format!("expected 19 values, found {}", misc.len()),
            ));
        }
        let finite = |index: usize| parse_finite("miscloop", &misc[index]);

        let prelog = finite(0)?;
        let maxpen = finite(1)?;
        let mut poppen = vec![Rational::zero()];
        for index in 2..6 {
            poppen.push(finite(index)?);
        }
        // Tokens 6..12 are the classical and efn2 multiloop triples; the
        // parametric engine takes its multiloop weights from the
        // ParameterVector instead.
        let terminal_au = finite(12)?;
        let gu_bonus = finite(13)?;
        let c_slope = finite(14)?;
        let c_intercept = finite(15)?;
        let c3 = finite(16)?;
        let gail = !finite(18)?.is_zero();

        let (interior, bulge, hairpin) = parse_loop_sizes(&read_tokens(dir, "loop")?)?;

        Ok(Self {
            prelog,
            maxpen,
            poppen,
            terminal_au,
            gu_bonus,
            c_slope,
            c_intercept,
            c3,
            gail,
            interior,
            bulge,
            hairpin,
            stack: PairTable::from_tokens("stack", &read_tokens(dir, "stack")?)?,
            tstkh: PairTable::from_tokens("tstkh", &read_tokens(dir, "tstkh")?)?,
            tstki: PairTable::from_tokens("tstki", &read_tokens(dir, "tstki")?)?,
            tstacke: PairTable::from_tokens("tstacke", &read_tokens(dir, "tstacke")?)?,
            tstackm: PairTable::from_tokens("tstackm", &read_tokens(dir, "tstackm")?)?,
            tstacki23: PairTable::from_tokens("tstacki23", &read_tokens(dir, "tstacki23")?)?,
            dangle: DangleTable::from_tokens("dangle", &read_tokens(dir, "dangle")?)?,
            tloop: parse_loop_bonuses("tloop", &read_tokens(dir, "tloop")?, 6)?,
            triloop: parse_loop_bonuses("triloop", &read_tokens(dir, "triloop")?, 5)?,
            iloop11: LoopTable::from_tokens("iloop11", 6, &read_tokens(dir, "iloop11")?)?,
            iloop21: LoopTable::from_tokens("iloop21", 7, &read_tokens(dir, "iloop21")?)?,
            iloop22: LoopTable::from_tokens("iloop22", 8, &read_tokens(dir, "iloop22")?)?,
        })
    }
}

fn table_err(table: &str, reason: impl Into<String>) -> PolyfoldError {
    PolyfoldError::InvalidTable {
        table: table.to_string(),
        reason: reason.into(),
    }
}

fn read_tokens(dir: &Path, table: &str) -> Result<Vec<String>, PolyfoldError> {
    let path = dir.join(format!("{table}.dat"));
    let content = fs::read_to_string(&path)
        .map_err(|e| table_err(table, format!("{}: {e}", path.display())))?;
    let mut tokens = Vec::new();
    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("");
        tokens.extend(line.split_whitespace().map(str::to_string));
    }
    Ok(tokens)
}

fn parse_energy(table: &str, token: &str) -> Result<Energy, PolyfoldError> {
    if token == "." || token.eq_ignore_ascii_case("inf") {
        return Ok(Energy::Infinite);
    }
    parse_rational(token)
        .map(Energy::Finite)
        .map_err(|_| table_err(table, format!("bad value {token:?}")))
}

fn parse_finite(table: &str, token: &str) -> Result<Rational, PolyfoldError> {
    parse_rational(token).map_err(|_| table_err(table, format!("bad value {token:?}")))
}

fn parse_energies(
    table: &str,
    tokens: &[String],
    expected: usize,
) -> Result<Vec<Energy>, PolyfoldError> {
    if tokens.len() != expected {
        return Err(table_err(
            table,
            format!("expected {expected} values, found {}", tokens.len()),
        ));
    }
    tokens.iter().map(|t| parse_energy(table, t)).collect()
}

type LoopSizeTables = (Vec<Energy>, Vec<Energy>, Vec<Energy>);

fn parse_loop_sizes(tokens: &[String]) -> Result<LoopSizeTables, PolyfoldError> {
    if tokens.len() != 4 * MAXLOOP {
        return Err(table_err(
            "loop",
            format!("expected {} values, found {}", 4 * MAXLOOP, tokens.len()),
        ));
    }
    let mut interior = vec![Energy::Infinite; MAXLOOP + 1];
    let mut bulge = vec![Energy::Infinite; MAXLOOP + 1];
    let mut hairpin = vec![Energy::Infinite; MAXLOOP + 1];
    for row in tokens.chunks_exact(4) {
        let size: usize = row[0]
            .parse()
            .map_err(|_| table_err("loop", format!("bad size {:?}", row[0])))?;
        if size == 0 || size > MAXLOOP {
            return Err(table_err("loop", format!("size {size} out of range")));
        }
        interior[size] = parse_energy("loop", &row[1])?;
        bulge[size] = parse_energy("loop", &row[2])?;
        hairpin[size] = parse_energy("loop", &row[3])?;
    }
    Ok((interior, bulge, hairpin))
}

fn parse_loop_bonuses(
    table: &str,
    tokens: &[String],
    window: usize,
) -> Result<FxHashMap<u32, Rational>, PolyfoldError> {
    if tokens.len() % 2 != 0 {
        return Err(table_err(table, "expected SEQUENCE/bonus pairs"));
    }
    let mut bonuses = FxHashMap::default();
    for row in tokens.chunks_exact(2) {
        let bases: Option<Vec<Base>> = row[0].chars().map(Base::from_char).collect();
        let bases =
            bases.ok_or_else(|| table_err(table, format!("bad loop sequence {:?}", row[0])))?;
        if bases.len() != window {
            return Err(table_err(
                table,
                format!("loop sequence {:?} is not {window} bases", row[0]),
            ));
        }
        bonuses.insert(loop_bonus_key(&bases), parse_finite(table, &row[1])?);
    }
    Ok(bonuses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::rational_from_i64;
    use std::fs;
    use tempfile::TempDir;

    fn write_minimal_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let grid256 = vec!["-1.1"; 256].join(" ");
        let grid128 = vec!["-0.2"; 128].join(" ");
        fs::write(
            dir.path().join("miscloop.dat"),
            "# extrapolation and multiloop constants\n\
             1.079 3.0\n0.5 0.5 0.5 0.5\n3.4 0.0 0.4\n3.4 0.0 0.4\n\
             0.5 -2.2 0.3 1.6 1.4 4.1 1\n",
        )
        .unwrap();
        let mut loop_rows = String::new();
        for size in 1..=MAXLOOP {
            let hairpin = if size < 3 { ".".to_string() } else { format!("{}.{}", 5, size) };
            loop_rows.push_str(&format!("{size} 4.0 3.0 {hairpin}\n"));
        }
        fs::write(dir.path().join("loop.dat"), loop_rows).unwrap();
        for table in ["stack", "tstkh", "tstki", "tstacke", "tstackm", "tstacki23"] {
            fs::write(dir.path().join(format!("{table}.dat")), &grid256).unwrap();
        }
        fs::write(dir.path().join("dangle.dat"), &grid128).unwrap();
        fs::write(dir.path().join("tloop.dat"), "GGGGAC -3.0\n").unwrap();
        fs::write(dir.path().join("triloop.dat"), "").unwrap();
        fs::write(dir.path().join("iloop11.dat"), vec!["0.9"; 4096].join(" ")).unwrap();
        fs::write(dir.path().join("iloop21.dat"), vec!["1.9"; 16384].join(" ")).unwrap();
        fs::write(dir.path().join("iloop22.dat"), vec!["2.9"; 65536].join(" ")).unwrap();
        dir
    }

    #[test]
    fn loads_a_complete_directory() {
        let dir = write_minimal_dir();
        let tables = ThermoTables::from_dir(dir.path()).unwrap();

        assert_eq!(tables.maxpen, rational_from_i64(3));
        assert!(tables.gail);
        assert_eq!(
            tables.stack.get(Base::G, Base::C, Base::G, Base::C),
            Energy::Finite(parse_rational("-1.1").unwrap())
        );
        assert_eq!(tables.hairpin[1], Energy::Infinite);
        assert_eq!(
            tables.hairpin[4],
            Energy::Finite(parse_rational("5.4").unwrap())
        );
        assert_eq!(
            tables.tloop.get(&loop_bonus_key(&[
                Base::G,
                Base::G,
                Base::G,
                Base::G,
                Base::A,
                Base::C
            ])),
            Some(&parse_rational("-3.0").unwrap())
        );
        assert!(tables.triloop.is_empty());
    }

    #[test]
    fn n_lookups_are_undefined() {
        let table = PairTable::uniform(Energy::zero());
        assert_eq!(
            table.get(Base::N, Base::A, Base::A, Base::A),
            Energy::Infinite
        );
    }

    #[test]
    fn missing_files_fail_with_the_table_name() {
        let dir = TempDir::new().unwrap();
        match ThermoTables::from_dir(dir.path()) {
            Err(PolyfoldError::InvalidTable { table, .. }) => assert_eq!(table, "miscloop"),
            other => panic!("expected a table error, got {other:?}"),
        }
    }

    #[test]
    fn token_count_mismatches_are_rejected() {
        let dir = write_minimal_dir();
        fs::write(dir.path().join("stack.dat"), "1.0 2.0").unwrap();
        assert!(matches!(
            ThermoTables::from_dir(dir.path()),
            Err(PolyfoldError::InvalidTable { table, .. }) if table == "stack"
        ));
    }

    #[test]
    fn loop_bonus_keys_use_base_ten_digits() {
        let key = loop_bonus_key(&[Base::G, Base::G, Base::G, Base::G, Base::A, Base::C]);
        assert_eq!(key, 333_312);
    }
}
