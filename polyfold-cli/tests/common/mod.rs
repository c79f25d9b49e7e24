#![allow(dead_code)]

//! Shared fixtures for driver tests: a complete synthetic Turner99-style
//! parameter directory with hand-checkable values, and FASTA helpers.
//!
//! The values mirror the core test tables: stacks -3.3, hairpins
//! 5.4/5.6/(52+s)/10, bulges (36+s)/10, interior (40+s)/10, mismatches
//! -0.3/-0.2, dangles -0.2/-0.1. A GGGAAACCC helix folds to -1.2.

use std::fs;
use std::path::Path;

const PAIRS: [(usize, usize); 6] = [(0, 3), (3, 0), (2, 1), (1, 2), (2, 3), (3, 2)];

fn pairable(a: usize, b: usize) -> bool {
    PAIRS.contains(&(a, b))
}

fn grid256(value: &str, pair_gated: bool, inner_gated: bool) -> String {
    let mut tokens = Vec::with_capacity(256);
    for a in 0..4 {
        for b in 0..4 {
            for c in 0..4 {
                for d in 0..4 {
                    let defined = (!pair_gated || pairable(a, b))
                        && (!inner_gated || pairable(c, d));
                    tokens.push(if defined { value } else { "." });
                }
            }
        }
    }
    tokens.join(" ")
}

fn dangle128(five: &str, three: &str) -> String {
    let mut tokens = Vec::with_capacity(128);
    for a in 0..4 {
        for b in 0..4 {
            for _k in 0..4 {
                if pairable(a, b) {
                    tokens.push(five);
                    tokens.push(three);
                } else {
                    tokens.push(".");
                    tokens.push(".");
                }
            }
        }
    }
    tokens.join(" ")
}

fn loop_rows() -> String {
    let mut rows = String::new();
    for size in 1..=30 {
        let interior = format!("{}.{}", (40 + size) / 10, (40 + size) % 10);
        let bulge = format!("{}.{}", (36 + size) / 10, (36 + size) % 10);
        let hairpin = match size {
            1 | 2 => ".".to_string(),
            3 => "5.4".to_string(),
            4 => "5.6".to_string(),
            s => format!("{}.{}", (52 + s) / 10, (52 + s) % 10),
        };
        rows.push_str(&format!("{size} {interior} {bulge} {hairpin}\n"));
    }
    rows
}

/// Write a complete parameter directory under `dir`.
pub fn write_param_dir(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    let write = |name: &str, content: String| {
        fs::write(dir.join(format!("{name}.dat")), content).unwrap();
    };

    write(
        "miscloop",
        "# prelog maxpen poppen[1-4]\n\
         1.079 3.0\n\
         0.5 0.5 0.5 0.5\n\
         # classical and efn2 multiloop triples\n\
         3.4 0.0 0.4\n\
         3.4 0.0 0.4\n\
         # terminal AU, GGG-U bonus, poly-C slope/intercept/c3, init, gail\n\
         0.5 -2.2 0.3 1.6 1.4 4.1 1\n"
            .to_string(),
    );
    write("loop", loop_rows());
    write("stack", grid256("-3.3", true, true));
    write("tstkh", grid256("-0.3", true, false));
    write("tstki", grid256("-0.2", true, false));
    write("tstacke", grid256("-0.1", true, false));
    write("tstackm", grid256("-0.15", true, false));
    write("tstacki23", grid256("-0.4", true, false));
    write("dangle", dangle128("-0.2", "-0.1"));
    write("tloop", "GGGGAC -3.0\n".to_string());
    write("triloop", String::new());
    write("iloop11", vec!["0.9"; 4096].join(" "));
    write("iloop21", vec!["1.9"; 16384].join(" "));
    write("iloop22", vec!["2.9"; 65536].join(" "));
}

/// Write a single-record FASTA file.
pub fn write_fasta(path: &Path, body: &str) {
    fs::write(path, format!(">fixture\n{body}\n")).unwrap();
}

/// Write a structure file (sequence line plus dot-bracket line).
pub fn write_structure_file(path: &Path, sequence: &str, brackets: &str) {
    fs::write(path, format!("{sequence}\n{brackets}\n")).unwrap();
}
