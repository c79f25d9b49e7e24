//! subopt: every structure within an energy window of the MFE.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

use polyfold_cli::{
    base_args, configure_threads, dangle_from_matches, default_outfile, param_args,
    params_from_matches, parse_args_or_usage, rational_flag, sequence_from_matches,
    tables_from_matches,
};
use polyfold_core::output::write_subopt_listing;
use polyfold_core::thermo::EnergyModel;

fn main() -> Result<()> {
    let command = param_args(base_args(
        Command::new("subopt")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Suboptimal RNA secondary structures within an energy window"),
    ))
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .value_name("FILE")
            .help("Output file (default: sequence file with extension .rnasubopt)"),
    )
    .arg(
        Arg::new("consoleout")
            .long("consoleout")
            .short('C')
            .action(ArgAction::SetTrue)
            .help("Write the listing to stdout instead of a file"),
    )
    .arg(
        Arg::new("delta")
            .long("delta")
            .value_name("Q")
            .default_value("0")
            .help("Energy window above the MFE"),
    )
    .arg(
        Arg::new("sorted")
            .long("sorted")
            .short('s')
            .action(ArgAction::SetTrue)
            .help("Sort results in increasing energy order"),
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

    let params = params_from_matches(&matches)?;
    let dangles = dangle_from_matches(&matches)?;
    let delta = rational_flag(&matches, "delta")?.expect("delta has a default");
    let tables = tables_from_matches(&matches)?;
    let seq = sequence_from_matches(&matches)?;

    let model = EnergyModel::new(tables, params.clone(), dangles);
    let filled = model.energy_tables(&seq);
    let mut structures =
        model.suboptimal_structures(&seq, &filled, &delta, matches.get_flag("sorted"));

    println!("Found {} suboptimal structures.", structures.len());

    if matches.get_flag("transform-output") {
        let mut transformed = params.clone();
        transformed.transform_params();
        for scored in &mut structures {
            scored.score.energy = scored.score.evaluate(&transformed);
        }
    }

    if matches.get_flag("consoleout") {
        let mut writer = BufWriter::new(io::stdout());
        write_subopt_listing(&mut writer, &seq, &params, &delta, &structures)?;
        writer.flush()?;
    } else {
        let path = default_outfile(&matches, "rnasubopt");
        let file = File::create(&path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_subopt_listing(&mut writer, &seq, &params, &delta, &structures)?;
        writer.flush()?;
        if matches.get_flag("verbose") {
            eprintln!("Wrote listing to {}.", path.display());
        }
    }
    Ok(())
}
