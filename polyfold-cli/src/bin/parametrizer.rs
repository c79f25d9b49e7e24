//! parametrizer: build the parametric polytope of a sequence.

use anyhow::{Context, Result};
use clap::{Arg, Command};

use polyfold_cli::{
    base_args, configure_threads, dangle_from_matches, default_outfile, parse_args_or_usage,
    rational_flag, sequence_from_matches, tables_from_matches, StderrObserver,
};
use polyfold_core::polytope::RnaPolytope;

fn main() -> Result<()> {
    let command = base_args(
        Command::new("parametrizer")
            .version(env!("CARGO_PKG_VERSION"))
            .about("The polytope of score vectors optimal for some parameter choice"),
    )
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .value_name("FILE")
            .help("Output file (default: sequence file with extension .rnapoly)"),
    )
    .arg(
        Arg::new("b-parameter")
            .long("b-parameter")
            .short('b')
            .value_name("Q")
            .allow_hyphen_values(true)
            .help("Fix the unpaired-base weight and build the 3D polytope"),
    )
    .arg(
        Arg::new("num-threads")
            .long("num-threads")
            .short('t')
            .value_name("N")
            .default_value("0")
            .help("Number of threads (0: default pool)"),
    );
    let matches = parse_args_or_usage(command);
    configure_threads(&matches)?;

    let dangles = dangle_from_matches(&matches)?;
    let tables = tables_from_matches(&matches)?;
    let sequence = sequence_from_matches(&matches)?;
    let multiloop_weight = rational_flag(&matches, "b-parameter")?;

    let observer = StderrObserver::new(matches.get_flag("verbose"));
    let polytope = RnaPolytope::build(tables, sequence, dangles, multiloop_weight, &observer);

    println!(
        "Polytope has {} vertices and {} facets in dimension {}.",
        polytope.number_of_vertices(),
        polytope.number_of_facets(),
        polytope.dimension(),
    );

    let path = default_outfile(&matches, "rnapoly");
    polytope
        .write_to_file(&path)
        .with_context(|| format!("writing polytope to {}", path.display()))?;
    println!("Wrote polytope to {}.", path.display());
    Ok(())
}
