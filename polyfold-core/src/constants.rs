/// Minimum number of unpaired bases enclosed by a hairpin; a pair (i, j)
/// requires j - i > TURN.
pub const TURN: usize = 3;

/// Maximum combined size of an internal loop or bulge searched by the
/// recurrences; also the largest size with its own table entry (larger
/// loops extrapolate logarithmically from this size).
pub const MAXLOOP: usize = 30;
