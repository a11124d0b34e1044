use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rapidpost::job::{Job, JobError};
use rapidpost::validator::Validator;

#[derive(Parser, Debug)]
#[command(name = "rapidpost", version, about = "Generate ABB RAPID MoveL modules from pose paths")]
struct Cli {
    /// Job file (JSON)
    job: PathBuf,

    /// Output file, defaults to <module>.mod
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the module name from the job file
    #[arg(long)]
    module: Option<String>,

    /// Treat lint findings as errors
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Print the module instead of writing a file
    #[arg(long, default_value_t = false)]
    stdout: bool,
}

#[derive(Error, Debug)]
enum Error {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("{0} lint finding(s) in strict mode")]
    Validation(usize),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let source = fs::read_to_string(&cli.job).map_err(|source| Error::Io {
        path: cli.job.clone(),
        source,
    })?;

    let mut job = match Job::from_json(&source) {
        Ok(job) => job,
        Err(JobError::Json(e)) => {
            report_json_error(&cli.job.display().to_string(), &source, &e);
            return Err(JobError::Json(e).into());
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(module) = cli.module {
        job.module = module;
    }

    if let Err(findings) = Validator::new().validate(&job.module, &job.parameters()) {
        for finding in &findings {
            warn!("{finding}");
        }
        if cli.strict {
            return Err(Error::Validation(findings.len()));
        }
    }

    let program = job.compose()?;
    let text = format!("{}\n", program);

    if cli.stdout {
        print!("{text}");
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.mod", job.module)));
    fs::write(&output, text).map_err(|source| Error::Io {
        path: output.clone(),
        source,
    })?;

    info!(path = %output.display(), moves = program.move_count(), "wrote module");
    Ok(())
}

/// Byte offset of a 1-based line/column pair, clamped to the source
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

fn report_json_error(path: &str, source: &str, err: &serde_json::Error) {
    let offset = offset_of(source, err.line(), err.column());
    let end = (offset + 1).min(source.len()).max(offset);

    let printed = Report::build(ReportKind::Error, path, offset)
        .with_message("invalid job file")
        .with_label(
            Label::new((path, offset..end))
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((path, Source::from(source)));
    if let Err(e) = printed {
        error!("could not render diagnostic: {e}");
    }
}
