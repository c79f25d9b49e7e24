//! Shared plumbing for the polyfold driver binaries: argument groups,
//! rational flag parsing, table loading, and outfile derivation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use polyfold_core::params::ParameterVector;
use polyfold_core::polytope::BuildObserver;
use polyfold_core::rational::{parse_rational, Rational};
use polyfold_core::sequence::RnaSequence;
use polyfold_core::structure::RnaStructure;
use polyfold_core::thermo::ThermoTables;
use polyfold_core::types::DangleMode;

/// Arguments every driver shares: the sequence file, the parameter
/// directory, the dangle model, and verbosity.
pub fn base_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("sequence")
                .long("sequence")
                .value_name("FILE")
                .required(true)
                .help("Sequence file (FASTA)"),
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
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Write verbose progress output to stderr"),
        )
}

/// The four scoring-parameter flags.
pub fn param_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("multiloop-penalty")
                .long("multiloop-penalty")
                .short('a')
                .value_name("Q")
                .allow_hyphen_values(true)
                .help("Multiloop penalty parameter"),
        )
        .arg(
            Arg::new("unpaired-penalty")
                .long("unpaired-penalty")
                .short('b')
                .value_name("Q")
                .allow_hyphen_values(true)
                .help("Unpaired base penalty parameter"),
        )
        .arg(
            Arg::new("branch-penalty")
                .long("branch-penalty")
                .short('c')
                .value_name("Q")
                .allow_hyphen_values(true)
                .help("Branching helix penalty parameter"),
        )
        .arg(
            Arg::new("dummy-scaling")
                .long("dummy-scaling")
                .short('d')
                .value_name("Q")
                .allow_hyphen_values(true)
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
}

/// Parse arguments; usage problems (including help requests) exit 1.
pub fn parse_args_or_usage(command: Command) -> ArgMatches {
    command.try_get_matches().unwrap_or_else(|error| {
        let _ = error.print();
        std::process::exit(1);
    })
}

/// Parse one rational-valued flag.
pub fn rational_flag(matches: &ArgMatches, name: &str) -> Result<Option<Rational>> {
    matches
        .get_one::<String>(name)
        .map(|text| parse_rational(text).with_context(|| format!("--{name} {text}")))
        .transpose()
}

/// Assemble the parameter vector from the -a/-b/-c/-d flags, undoing the
/// transform when the input was given in transformed coordinates, and
/// canonicalizing.
pub fn params_from_matches(matches: &ArgMatches) -> Result<ParameterVector> {
    let mut params = ParameterVector::default();
    if let Some(a) = rational_flag(matches, "multiloop-penalty")? {
        params.multiloop_penalty = a;
    }
    if let Some(b) = rational_flag(matches, "unpaired-penalty")? {
        params.unpaired_penalty = b;
    }
    if let Some(c) = rational_flag(matches, "branch-penalty")? {
        params.branch_penalty = c;
    }
    if let Some(d) = rational_flag(matches, "dummy-scaling")? {
        if !num_traits::Signed::is_positive(&d) {
            bail!("--dummy-scaling must be positive");
        }
        params.dummy_scaling = d;
    }
    if matches.get_flag("transformed-input") {
        params.untransform_params();
    }
    params.canonicalize();
    Ok(params)
}

/// Parse the dangle model flag.
pub fn dangle_from_matches(matches: &ArgMatches) -> Result<DangleMode> {
    let text = matches
        .get_one::<String>("dangle-model")
        .expect("dangle-model has a default");
    let number: i64 = text
        .parse()
        .with_context(|| format!("--dangle-model {text}"))?;
    Ok(DangleMode::from_model_number(number)?)
}

/// Load the thermodynamic tables named by --paramdir.
pub fn tables_from_matches(matches: &ArgMatches) -> Result<Arc<ThermoTables>> {
    let dir = matches
        .get_one::<String>("paramdir")
        .expect("paramdir has a default");
    let tables = ThermoTables::from_dir(Path::new(dir))
        .with_context(|| format!("loading parameter tables from {dir}"))?;
    Ok(Arc::new(tables))
}

/// Load the sequence named by --sequence.
pub fn sequence_from_matches(matches: &ArgMatches) -> Result<RnaSequence> {
    let path = matches
        .get_one::<String>("sequence")
        .expect("sequence is required");
    Ok(RnaSequence::from_fasta_file(Path::new(path))
        .with_context(|| format!("reading sequence from {path}"))?)
}

/// The sequence path with its extension replaced, for default outfiles.
pub fn default_outfile(matches: &ArgMatches, extension: &str) -> PathBuf {
    if let Some(outfile) = matches.get_one::<String>("outfile") {
        return PathBuf::from(outfile);
    }
    let mut path = PathBuf::from(
        matches
            .get_one::<String>("sequence")
            .expect("sequence is required"),
    );
    path.set_extension(extension);
    path
}

/// Configure the global rayon pool from --num-threads (0 = default).
pub fn configure_threads(matches: &ArgMatches) -> Result<()> {
    let Some(text) = matches.get_one::<String>("num-threads") else {
        return Ok(());
    };
    let threads: usize = text
        .parse()
        .with_context(|| format!("--num-threads {text}"))?;
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring the thread pool")?;
    }
    Ok(())
}

/// Read a structure file: the sequence on the first non-comment line and
/// the dot-bracket string on the second.
pub fn read_structure_file(path: &Path) -> Result<(RnaSequence, RnaStructure)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading structure from {}", path.display()))?;
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('>'));
    let sequence_line = lines.next().context("structure file has no sequence line")?;
    let bracket_line = lines
        .next()
        .context("structure file has no dot-bracket line")?;
    let sequence = RnaSequence::new(sequence_line)?;
    let structure = RnaStructure::from_dot_bracket(bracket_line)?;
    Ok((sequence, structure))
}

/// Progress reporting for polytope builds, matching the engine's
/// lifecycle hooks.
pub struct StderrObserver {
    enabled: bool,
}

impl StderrObserver {
    /// Log to stderr only when `enabled`.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl BuildObserver for StderrObserver {
    fn preinit(&self) {
        if self.enabled {
            eprintln!("Initializing polytope.");
        }
    }

    fn postinit(&self) {
        if self.enabled {
            eprintln!("Initialization complete. Beginning loop.");
        }
    }

    fn perloop(&self, confirmed: usize, live: usize) {
        if self.enabled {
            eprintln!("Facets (confirmed / known): {confirmed} / {live}.");
        }
    }

    fn postloop(&self) {
        if self.enabled {
            eprintln!("Polytope complete.");
        }
    }
}
