use std::{fs, io, path::Path};

use anyhow::Context;

pub mod code_builder;
pub mod compiler;
pub mod error;
pub mod options;
pub mod row;
pub mod tokenizer;


pub use code_builder::Language;
pub use compiler::{compile, compile_with_counter, read_rows, EnumEntry, Enumeration, RowSet};
pub use error::{Diagnostic, DiagnosticKind, Error, ErrorKind, GenerateError};
pub use options::{GeneratorConfig, Job};

use code_builder::{render, render_source};

/// The text generated for one job.
#[derive(Debug, Clone)]
pub struct Generated {
    pub enumeration: Enumeration,
    pub output: String,
    /// The C++ source file of a split job.
    pub source: Option<String>,
}

/// Compiles a listing and renders it for `job`, without touching the file system.
pub fn generate_source(listing: &str, job: &Job, strict: bool) -> error::Result<Generated> {
    let enumeration = compile(read_rows(listing), &job.enum_name, &job.namespace)?;
    if strict {
        if let Some(diagnostic) = enumeration.diagnostics.first() {
            return Err(Error::new(
                ErrorKind::Strict(diagnostic.kind.clone()),
                diagnostic.line,
            ));
        }
    }

    let split = match (&job.source, job.language) {
        (Some(_), Language::Cpp) => true,
        (Some(source), Language::Rust) => {
            log::warn!(
                "{}: ignoring source file '{}', only C++ output can be split",
                job.enum_name,
                source
            );
            false
        }
        (None, _) => false,
    };
    let output = render(&enumeration, job.language, split);
    let source = split.then(|| render_source(&enumeration, file_name(&job.output)));

    Ok(Generated {
        enumeration,
        output,
        source,
    })
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    /// Compare the outputs with the generated text, but do not write them.
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Unchanged,
    Written,
    /// Only reported in [`Mode::Check`]: the file on disk differs from the generated text.
    Stale,
}

/// Writes `content` to `path` unless the file already holds exactly that.
fn ensure_file_content(path: &str, content: &str, mode: Mode) -> anyhow::Result<Outcome> {
    let current = match fs::read_to_string(path) {
        Ok(current) => Some(current),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read output file '{}'", path))
        }
    };
    if current.as_deref() == Some(content) {
        log::debug!("'{}' is up to date", path);
        return Ok(Outcome::Unchanged);
    }

    match mode {
        Mode::Check => {
            log::warn!("'{}' is out of date", path);
            Ok(Outcome::Stale)
        }
        Mode::Write => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create directory '{}'", parent.display())
                    })?;
                }
            }
            fs::write(path, content)
                .with_context(|| format!("failed to write output file '{}'", path))?;
            log::info!("wrote '{}'", path);
            Ok(Outcome::Written)
        }
    }
}

/// Reads the listing of `job` and brings its output files up to date.
pub fn generate_file(job: &Job, strict: bool, mode: Mode) -> anyhow::Result<Outcome> {
    let listing = fs::read_to_string(&job.input)
        .with_context(|| format!("failed to read listing '{}'", job.input))?;
    let generated = generate_source(&listing, job, strict).map_err(|error| GenerateError {
        path: job.input.clone(),
        error,
    })?;
    log::debug!(
        "{}: {} entries, {} diagnostics",
        job.enum_name,
        generated.enumeration.entries.len(),
        generated.enumeration.diagnostics.len()
    );

    let mut outcome = ensure_file_content(&job.output, &generated.output, mode)?;
    if let (Some(path), Some(source)) = (&job.source, &generated.source) {
        outcome = outcome.max(ensure_file_content(path, source, mode)?);
    }
    Ok(outcome)
}

/// Runs every job of `config` in order. The first failing job aborts the run.
pub fn run_jobs(config: &GeneratorConfig, mode: Mode) -> anyhow::Result<Vec<Outcome>> {
    config
        .jobs
        .iter()
        .map(|job| {
            generate_file(job, config.strict, mode)
                .with_context(|| format!("failed to generate '{}'", job.enum_name))
        })
        .collect()
}
