//! rnascorer: score a given structure under the energy model.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, Command};

use polyfold_cli::{dangle_from_matches, parse_args_or_usage, read_structure_file};
use polyfold_core::params::ParameterVector;
use polyfold_core::rational::approx;
use polyfold_core::thermo::{EnergyModel, ThermoTables};

fn main() -> Result<()> {
    let command = Command::new("rnascorer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Score an RNA secondary structure under the Turner99 model")
        .arg(
            Arg::new("structure")
                .long("structure")
                .value_name("FILE")
                .required(true)
                .help("Structure file: sequence line, then dot-bracket line"),
        )
        .arg(
            Arg::new("paramdir")
                .long("paramdir")
                .short('p')
                .value_name("DIR")
                .default_value("data/Turner99")
                .help("Turner99 parameter directory"),
        )
        .arg(
            Arg::new("dangle-model")
                .long("dangle-model")
                .short('m')
                .value_name("MODEL")
                .default_value("1")
                .help("Dangle model: 0 (none), 1 (choose), 2 (both)"),
        );
    let matches = parse_args_or_usage(command);

    let dangles = dangle_from_matches(&matches)?;
    let dir = matches
        .get_one::<String>("paramdir")
        .expect("paramdir has a default");
    let tables = ThermoTables::from_dir(Path::new(dir))
        .with_context(|| format!("loading parameter tables from {dir}"))?;

    let structure_path = matches
        .get_one::<String>("structure")
        .expect("structure is required");
    let (sequence, structure) = read_structure_file(Path::new(structure_path))?;

    let model = EnergyModel::new(Arc::new(tables), ParameterVector::default(), dangles);
    let score = model.score_with_optimal_dangles(&sequence, &structure)?;

    println!(
        "Computed energy {} = {:5.3}",
        score.energy,
        approx(&score.energy)
    );
    Ok(())
}
