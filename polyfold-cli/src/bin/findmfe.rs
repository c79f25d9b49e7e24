//! findmfe: the minimum free energy structure of a sequence under a
//! given scoring parameter vector.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Result;
use clap::{Arg, Command};

use polyfold_cli::{
    base_args, dangle_from_matches, param_args, params_from_matches, parse_args_or_usage,
    sequence_from_matches, tables_from_matches,
};
use polyfold_core::output::write_structure;
use polyfold_core::thermo::EnergyModel;

fn main() -> Result<()> {
    let command = param_args(base_args(
        Command::new("findmfe")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Minimum free energy RNA secondary structure"),
    ))
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .value_name("FILE")
            .help("Output file (default: stdout)"),
    );
    let matches = parse_args_or_usage(command);

    let params = params_from_matches(&matches)?;
    let dangles = dangle_from_matches(&matches)?;
    let tables = tables_from_matches(&matches)?;
    let seq = sequence_from_matches(&matches)?;

    let model = EnergyModel::new(tables, params.clone(), dangles);
    let filled = model.energy_tables(&seq);
    let mut best = model.mfe_structure(&seq, &filled);

    if matches.get_flag("transform-output") {
        let mut transformed = params;
        transformed.transform_params();
        best.score.energy = best.score.evaluate(&transformed);
    }

    let mut writer: Box<dyn Write> = match matches.get_one::<String>("outfile") {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    write_structure(&mut *writer, &seq, &best)?;
    writer.flush()?;

    if matches.get_flag("verbose") {
        eprintln!("Folded {} bases.", seq.len());
    }
    Ok(())
}
