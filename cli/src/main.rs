use std::{fs, path::Path, time::Instant};

use clap::Parser;
use enumgen::{run_jobs, GeneratorConfig, Mode, Outcome};

#[derive(Debug, Parser)]
#[command(name = "enumgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generates enumerations and lookup functions from code listings", long_about = None)]
struct Cli {
    /// Path to the config JSON file; job paths in it are relative to its directory.
    /// Without one the ELF tables are generated in the working directory
    #[arg(long, short = 'c')]
    config: Option<String>,
    /// Prevents information like time elapsed from being printed.
    #[arg(long, short = 's')]
    silent: bool,
    /// Only check that the outputs are up to date; nothing is written.
    #[arg(long)]
    check: bool,
    /// Treat value collisions, duplicate names and unresolved symbols as errors.
    #[arg(long)]
    strict: bool,
}

fn exit_with_error(args: std::fmt::Arguments) -> ! {
    eprintln!("{}", args);
    std::process::exit(1);
}

fn elapsed_to_string(start: &Instant) -> String {
    let elapsed = start.elapsed();
    let ms = elapsed.as_millis();
    let us = elapsed.as_micros();
    if ms == 0 {
        format!("{}us", us)
    } else {
        let s = elapsed.as_secs();
        if s == 0 {
            format!("{}.{:03}ms", ms, us % 1000)
        } else {
            format!("{}.{:03}s", s, ms % 1000)
        }
    }
}

fn main() {
    let args = Cli::parse();

    let level = if args.silent { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let mut config = match &args.config {
        Some(path) => match fs::read_to_string(path) {
            // job paths are relative to the config file
            Ok(json) => match GeneratorConfig::from_json(&json) {
                Ok(config) => config.relative_to(Path::new(path).parent().unwrap_or(Path::new(""))),
                Err(err) => exit_with_error(format_args!("failed to parse config JSON: {}", err)),
            },
            Err(err) => exit_with_error(format_args!(
                "failed to read config JSON file at '{}': {}",
                path, err
            )),
        },
        None => GeneratorConfig::default(),
    };
    config.strict |= args.strict;
    let mode = if args.check { Mode::Check } else { Mode::Write };

    let start = Instant::now();
    // one broken listing stops the whole batch
    let outcomes = match run_jobs(&config, mode) {
        Ok(outcomes) => outcomes,
        Err(err) => exit_with_error(format_args!("{:#}", err)),
    };
    let written = outcomes
        .iter()
        .filter(|outcome| **outcome == Outcome::Written)
        .count();
    log::debug!("{} of {} outputs rewritten", written, outcomes.len());
    let stale = config
        .jobs
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| **outcome == Outcome::Stale)
        .map(|(job, _)| job.output.as_str())
        .collect::<Vec<_>>();

    if !args.silent {
        println!(
            "processed {} listings in {}",
            config.jobs.len(),
            elapsed_to_string(&start)
        );
    }

    if !stale.is_empty() {
        for output in stale {
            eprintln!("'{}' is out of date", output);
        }
        std::process::exit(1);
    }
}
