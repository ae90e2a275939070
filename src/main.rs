use rates_vol_study::{cli, config, pipeline, report, utils};

// Initialise an INFO `Subscriber` for `Tracing` logs
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(cfg!(debug_assertions))
        .init()
}

/// Main entry point of the application.
///
/// This function orchestrates the entire workflow:
/// 1. Parses command-line arguments and the optional TOML configuration.
/// 2. Validates input/output paths.
/// 3. Determines the number of threads to use.
/// 4. Runs the study and writes its tables and binary snapshot.
/// 5. Optionally reloads the snapshot and prints the first rows.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Success or an error if any step fails.
fn main() -> anyhow::Result<()> {
    init_logging();
    let total_start = std::time::Instant::now();
    let args = cli::Args::parse();

    let mut config = match &args.config {
        Some(path) => config::AnalysisConfig::load(path)?,
        None => config::AnalysisConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.bootstrap.seed = seed;
    }
    if let Some(iterations) = args.iterations {
        config.bootstrap.iterations = iterations;
    }
    config.validate()?;

    utils::check_input_dir(&args.input)?;
    utils::ensure_dir_exists(&args.output)?;

    let effective_threads = match args.threads {
        Some(n) => {
            let max_threads = num_cpus::get();
            if n > max_threads {
                println!("⚠️ Warning: Limiting thread count to {} (max available)", max_threads);
                max_threads
            } else {
                n
            }
        }
        None => rayon::current_num_threads(),
    };
    println!("🚀 Using {} thread(s)", effective_threads);
    println!("Start analysis...");

    let analysis = || -> anyhow::Result<pipeline::AnalysisReport> {
        let report = pipeline::run(&args.input, &config)?;
        report::write_tables(&report, &args.output)?;
        Ok(report)
    };
    let report = if args.threads.is_some() {
        let local_pool = utils::configure_thread_pool(effective_threads)?;
        local_pool.install(analysis)?
    } else {
        analysis()?
    };
    let snapshot = report::save_snapshot(&report, &args.output)?;

    println!(
        "✅ Analysis completed in {:?} seconds ({} grid rows, {} probability rows)",
        total_start.elapsed().as_secs_f64(),
        report.grid.len(),
        report.probabilities.len(),
    );

    if args.check {
        println!("Start reading {}...", snapshot.display());
        let start = std::time::Instant::now();
        let reloaded = report::load_snapshot(&snapshot)?;
        report::print_preview(&reloaded, 5);
        println!(
            "✅ Reading snapshot complete in {:?} seconds",
            start.elapsed().as_secs_f64()
        );
    }
    Ok(())
}
