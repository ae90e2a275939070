/// Structure representing command-line arguments.
#[derive(Debug)]
pub struct Args {
    pub input: std::path::PathBuf,
    pub output: std::path::PathBuf,
    pub config: Option<std::path::PathBuf>,
    pub threads: Option<usize>,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub check: bool,
}

/// Command-line arguments parser using Clap.
///
/// Supports input/output paths, an optional TOML configuration, threading and
/// bootstrap overrides.
impl Args {
    /// Parses command-line arguments using `clap`.
    ///
    /// # Returns
    /// * `Args` - Struct containing parsed arguments.
    ///
    /// # Errors
    /// * If required arguments are missing or invalid.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Args {
            input: matches.get_one::<std::path::PathBuf>("input").cloned().unwrap_or_default(),
            output: matches.get_one::<std::path::PathBuf>("output").cloned().unwrap_or_default(),
            config: matches.get_one::<std::path::PathBuf>("config").cloned(),
            threads: matches.get_one::<usize>("threads").cloned(),
            seed: matches.get_one::<u64>("seed").cloned(),
            iterations: matches.get_one::<usize>("iterations").cloned(),
            check: matches.get_flag("check"),
        }
    }
}

fn command() -> clap::Command {
    clap::Command::new("rates-vol-study")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cross-instrument volatility ratio study over Treasury futures ticks")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("Directory holding one tick CSV per instrument")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Directory for report tables and the binary snapshot")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML configuration file (defaults to the reference study settings)")
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Number of threads to use (default: all available)")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_usize_positive)),
        )
        .arg(
            clap::Arg::new("seed")
                .short('s')
                .long("seed")
                .help("Bootstrap random seed, overriding the configuration")
                .num_args(1)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::Arg::new("iterations")
                .short('n')
                .long("iterations")
                .help("Bootstrap iterations, overriding the configuration")
                .num_args(1)
                .value_parser(clap::builder::ValueParser::new(parse_usize_positive)),
        )
        .arg(
            clap::Arg::new("check")
                .long("check")
                .help("After the run, reload the binary snapshot and print its first rows")
                .required(false)
                .action(clap::ArgAction::SetTrue),
        )
}

/// Validates that a count argument is a positive integer.
///
/// # Arguments
/// * `s` - String representation of the number.
///
/// # Returns
/// * `Result<usize>` - Validated number.
fn parse_usize_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Must be a positive integer".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Not a valid number: {}", e)),
    }
}
