//! findmfe-rectangle: sweep a rectangular grid in the (a, c) parameter
//! plane, reporting each distinct MFE structure the first time it
//! appears.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use polyfold_cli::{
    base_args, configure_threads, dangle_from_matches, default_outfile, parse_args_or_usage,
    rational_flag, sequence_from_matches, tables_from_matches,
};
use polyfold_core::params::ParameterVector;
use polyfold_core::rational::Rational;
use polyfold_core::structure::ScoredStructure;
use polyfold_core::thermo::EnergyModel;

fn main() -> Result<()> {
    let command = base_args(
        Command::new("findmfe-rectangle")
            .version(env!("CARGO_PKG_VERSION"))
            .about("MFE structures over a rectangular grid of (a, c) parameters"),
    )
    .arg(
        Arg::new("multiloop-penalty-min")
            .long("multiloop-penalty-min")
            .short('a')
            .value_name("Q")
            .allow_hyphen_values(true)
            .required(true)
            .help("Multiloop penalty minimum"),
    )
    .arg(
        Arg::new("multiloop-penalty-max")
            .long("multiloop-penalty-max")
            .short('A')
            .value_name("Q")
            .allow_hyphen_values(true)
            .required(true)
            .help("Multiloop penalty maximum"),
    )
    .arg(
        Arg::new("unpaired-penalty")
            .long("unpaired-penalty")
            .short('b')
            .value_name("Q")
            .allow_hyphen_values(true)
            .default_value("0")
            .help("Unpaired base penalty parameter"),
    )
    .arg(
        Arg::new("branch-penalty-min")
            .long("branch-penalty-min")
            .short('c')
            .value_name("Q")
            .allow_hyphen_values(true)
            .required(true)
            .help("Branching helix penalty minimum"),
    )
    .arg(
        Arg::new("branch-penalty-max")
            .long("branch-penalty-max")
            .short('C')
            .value_name("Q")
            .allow_hyphen_values(true)
            .required(true)
            .help("Branching helix penalty maximum"),
    )
    .arg(
        Arg::new("dummy-scaling")
            .long("dummy-scaling")
            .short('d')
            .value_name("Q")
            .allow_hyphen_values(true)
            .default_value("1")
            .help("Dummy scaling parameter"),
    )
    .arg(
        Arg::new("transformed-input")
            .long("transformed-input")
            .short('I')
            .action(ArgAction::SetTrue)
            .help("Input a, b, c, d is transformed"),
    )
    .arg(
        Arg::new("transform-output")
            .long("transform-output")
            .short('O')
            .action(ArgAction::SetTrue)
            .help("Report energies under the transformed parameters"),
    )
    .arg(
        Arg::new("step-size")
            .long("step-size")
            .short('s')
            .value_name("Q")
            .default_value("0.1")
            .help("Grid step in both directions"),
    )
    .arg(
        Arg::new("parameter-output")
            .long("parameter-output")
            .short('P')
            .action(ArgAction::SetTrue)
            .help("Write the parameters where each structure first appears"),
    )
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .value_name("FILE")
            .help("Parameter output file (default: sequence file with extension .rnarect)"),
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

    let a_min = rational_flag(&matches, "multiloop-penalty-min")?.expect("required");
    let a_max = rational_flag(&matches, "multiloop-penalty-max")?.expect("required");
    let b = rational_flag(&matches, "unpaired-penalty")?.expect("default");
    let c_min = rational_flag(&matches, "branch-penalty-min")?.expect("required");
    let c_max = rational_flag(&matches, "branch-penalty-max")?.expect("required");
    let d = rational_flag(&matches, "dummy-scaling")?.expect("default");
    let step = rational_flag(&matches, "step-size")?.expect("default");

    if !num_traits::Signed::is_positive(&step) {
        bail!("--step-size must be positive");
    }
    if !num_traits::Signed::is_positive(&d) {
        bail!("--dummy-scaling must be positive");
    }

    let dangles = dangle_from_matches(&matches)?;
    let tables = tables_from_matches(&matches)?;
    let seq = sequence_from_matches(&matches)?;

    // Row-major grid: a outermost, c innermost.
    let mut grid: Vec<(Rational, Rational)> = Vec::new();
    let mut a = a_min;
    while a <= a_max {
        let mut c = c_min.clone();
        while c <= c_max {
            grid.push((a.clone(), c.clone()));
            c = &c + &step;
        }
        a = &a + &step;
    }

    let bar = ProgressBar::new(grid.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} grid points").expect("valid template"),
    );

    let transformed_input = matches.get_flag("transformed-input");
    let results: Vec<(ParameterVector, ScoredStructure)> = grid
        .par_iter()
        .map(|(a, c)| {
            let mut params =
                ParameterVector::new(a.clone(), b.clone(), c.clone(), d.clone());
            if transformed_input {
                params.untransform_params();
            }
            params.canonicalize();
            let model = EnergyModel::new(tables.clone(), params.clone(), dangles);
            let filled = model.energy_tables(&seq);
            let best = model.mfe_structure(&seq, &filled);
            bar.inc(1);
            (params, best)
        })
        .collect();
    bar.finish_and_clear();

    let mut parameter_writer = if matches.get_flag("parameter-output") {
        let path = default_outfile(&matches, "rnarect");
        let file = File::create(&path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        Some(BufWriter::new(file))
    } else {
        None
    };

    let transform_output = matches.get_flag("transform-output");
    let mut seen: HashSet<String> = HashSet::new();
    for (params, mut best) in results {
        if transform_output {
            let mut transformed = params.clone();
            transformed.transform_params();
            best.score.energy = best.score.evaluate(&transformed);
        }
        if seen.insert(best.structure.dot_bracket()) {
            println!("{best}");
            if let Some(writer) = parameter_writer.as_mut() {
                writeln!(
                    writer,
                    "{}, {}, {}, {best}",
                    params.multiloop_penalty, params.unpaired_penalty, params.branch_penalty,
                )?;
            }
        }
    }
    if let Some(mut writer) = parameter_writer {
        writer.flush()?;
    }

    if matches.get_flag("verbose") {
        eprintln!("Swept {} grid points, {} distinct structures.", grid.len(), seen.len());
    }
    Ok(())
}
