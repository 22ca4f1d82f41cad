//! Command-line interface for the archive password recovery engine
//!
//! Mirrors the backend protocol the host expects: status lines on stdout,
//! a `FOUND:<password>` marker on success, and exit codes 0 (found),
//! 1 (not found), 2 (configuration error), 3 (archive tester missing),
//! 4 (stopped by request).

use archive_password_recovery::config::{RecoveryConfig, SearchMode};
use archive_password_recovery::engine::{RecoveryEngine, RecoveryOutcome};
use archive_password_recovery::error::{ConfigError, RecoveryError};
use archive_password_recovery::status::{StatusSink, StdoutSink};
use archive_password_recovery::verifier::SevenZipVerifier;
use clap::{Arg, ArgAction, Command};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let matches = Command::new("archive-password-recovery")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parallel, resumable password recovery for encrypted archives")
        .arg(
            Arg::new("charset")
                .value_name("CHARSET")
                .help("Ordered alphabet the candidates are drawn from")
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("min_length")
                .value_name("MIN_LENGTH")
                .help("Shortest candidate length")
                .value_parser(clap::value_parser!(u32))
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("max_length")
                .value_name("MAX_LENGTH")
                .help("Longest candidate length")
                .value_parser(clap::value_parser!(u32))
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("archive")
                .value_name("ARCHIVE")
                .help("Path to the encrypted archive")
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("mode")
                .value_name("MODE")
                .help("Search order: ascending, descending, or random")
                .required_unless_present("config"),
        )
        .arg(
            Arg::new("pattern")
                .short('p')
                .long("pattern")
                .value_name("TEMPLATE")
                .help("Wildcard template: literals, '?', '*', backslash escapes"),
        )
        .arg(
            Arg::new("skip-file")
                .short('s')
                .long("skip-file")
                .value_name("FILE")
                .help("Skip filter file for resumable runs"),
        )
        .arg(
            Arg::new("checkpoint-interval")
                .short('c')
                .long("checkpoint-interval")
                .value_name("SECONDS")
                .help("Seconds between periodic filter saves (0 disables)")
                .value_parser(clap::value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .help("Worker thread count (defaults to the hardware parallelism)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("verifier")
                .long("verifier")
                .value_name("PATH")
                .help("Archive tester executable (otherwise searched near the binary and on PATH)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file instead of positional arguments"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Draw a progress bar on stderr")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let sink = Arc::new(StdoutSink);
    match run(&matches, sink.clone()) {
        Ok(RecoveryOutcome::Found(password)) => {
            info!("password recovered: {password}");
            ExitCode::SUCCESS
        }
        Ok(RecoveryOutcome::NotFound) => ExitCode::from(1),
        Ok(RecoveryOutcome::Stopped) => ExitCode::from(4),
        Err(err) => {
            let code = match &err {
                RecoveryError::Config(_) | RecoveryError::Json(_) => 2,
                RecoveryError::Environment(_) => 3,
                _ => 1,
            };
            sink.error(&err.to_string());
            ExitCode::from(code)
        }
    }
}

fn run(
    matches: &clap::ArgMatches,
    sink: Arc<StdoutSink>,
) -> Result<RecoveryOutcome, RecoveryError> {
    let config = build_config(matches)?;

    let verifier_override = matches.get_one::<String>("verifier").map(PathBuf::from);
    let verifier = SevenZipVerifier::locate(verifier_override.as_deref())?;
    sink.info(&format!(
        "Using archive tester: {}",
        verifier.program().display()
    ));

    let engine = RecoveryEngine::new(config, Arc::new(verifier), sink)?;
    engine.run()
}

fn build_config(matches: &clap::ArgMatches) -> Result<RecoveryConfig, RecoveryError> {
    if let Some(path) = matches.get_one::<String>("config") {
        let config =
            RecoveryConfig::from_file(std::path::Path::new(path)).map_err(|err| match err {
                RecoveryError::Io(io_err) => RecoveryError::Config(ConfigError::InvalidInput(
                    format!("cannot read configuration file {path}: {io_err}"),
                )),
                other => other,
            })?;
        return Ok(config);
    }

    // Positionals are required when --config is absent, so they are present here.
    let charset = matches
        .get_one::<String>("charset")
        .cloned()
        .unwrap_or_default();
    let min_length = matches.get_one::<u32>("min_length").copied().unwrap_or(0);
    let max_length = matches.get_one::<u32>("max_length").copied().unwrap_or(0);
    let archive = matches
        .get_one::<String>("archive")
        .map(PathBuf::from)
        .unwrap_or_default();
    let mode: SearchMode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("")
        .parse()
        .map_err(RecoveryError::Config)?;

    let config = RecoveryConfig {
        charset,
        min_length,
        max_length,
        archive,
        mode,
        pattern: matches
            .get_one::<String>("pattern")
            .cloned()
            .unwrap_or_default(),
        skip_file: matches.get_one::<String>("skip-file").map(PathBuf::from),
        checkpoint_interval_secs: matches
            .get_one::<u64>("checkpoint-interval")
            .copied()
            .unwrap_or(0),
        threads: matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or_else(|| num_cpus::get().max(1)),
        show_progress: matches.get_flag("progress"),
    };
    config.validate()?;
    Ok(config)
}
