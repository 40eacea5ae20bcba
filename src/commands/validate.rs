//! The `validate` command: compile the schema once, then run every data
//! file through the read → parse → validate → report pipeline.
//!
//! Files are processed as independent tasks sharing only the compiled
//! validator and the schema-path side table. Each file's report (status
//! line plus formatted errors) is emitted as one atomic block; reports
//! from different files never interleave mid-report.

use std::io::Write;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::cli::{ChangesFormat, ValidateArgs};
use crate::engine::{self, CompileOptions};
use crate::error::ProgramError;
use crate::output::ErrorFormat;

/// Per-file settings copied into every file task.
#[derive(Debug, Clone, Copy)]
struct FileJob {
    errors: ErrorFormat,
    merge: bool,
    location: bool,
    verbose: bool,
    changes: Option<ChangesFormat>,
    colors: bool,
}

/// How one file's pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Valid,
    Invalid,
    Failed,
}

/// One file's buffered report, emitted atomically.
struct FileReport {
    status: String,
    output: Option<String>,
    outcome: Outcome,
}

/// Runs the command and returns the process exit code: 0 when every file
/// is valid, 1 when at least one failed validation, 2 when a file could
/// not be read or decoded.
///
/// # Errors
///
/// Returns [`ProgramError::SchemaInvalid`] when the schema (or one of the
/// `$ref` resources) does not compile; nothing is validated in that case.
#[tracing::instrument(skip_all, fields(schema = %args.schema))]
pub async fn run(args: ValidateArgs) -> Result<i32, ProgramError> {
    let compiled = super::build_validator(
        &args.schema,
        &args.refs,
        &CompileOptions {
            spec: args.spec,
            validate_formats: args.validate_formats,
        },
    )
    .await?;
    let files = super::expand_patterns(&args.data)?;
    let job = FileJob {
        errors: args.errors,
        merge: !args.no_merge_errors,
        location: args.location,
        verbose: args.verbose,
        changes: args.changes,
        colors: console::colors_enabled(),
    };

    let mut tasks = JoinSet::new();
    for filename in files {
        let schema = Arc::clone(&compiled.schema);
        let index = Arc::clone(&compiled.index);
        let validator = Arc::clone(&compiled.validator);
        tasks.spawn(async move { process_file(filename, &validator, &schema, &index, job).await });
    }

    let mut invalid = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => {
                emit(&report);
                match report.outcome {
                    Outcome::Valid => {}
                    Outcome::Invalid => invalid += 1,
                    Outcome::Failed => failed += 1,
                }
            }
            Err(error) => {
                tracing::warn!("file task failed: {error}");
                failed += 1;
            }
        }
    }

    Ok(if failed > 0 {
        2
    } else if invalid > 0 {
        1
    } else {
        0
    })
}

async fn process_file(
    filename: String,
    validator: &jsonschema::Validator,
    schema: &serde_json::Value,
    index: &crate::schema_path::SchemaPathIndex,
    job: FileJob,
) -> FileReport {
    let parsed = match super::load_document(&filename).await {
        Ok(parsed) => parsed,
        Err(error) => {
            return FileReport {
                status: error.to_string(),
                output: None,
                outcome: Outcome::Failed,
            };
        }
    };

    let raw = engine::collect_errors(validator, schema, parsed.data(), job.verbose);
    if raw.is_empty() {
        return FileReport {
            status: format!("{filename} valid"),
            output: job.changes.map(|format| changes_report(format, &parsed)),
            outcome: Outcome::Valid,
        };
    }

    let rendered = super::render_file_errors(
        raw,
        schema,
        index,
        &parsed,
        job.errors,
        job.merge,
        job.location,
        job.colors,
    );
    match rendered {
        Ok(output) => FileReport {
            status: format!("{filename} invalid"),
            output,
            outcome: Outcome::Invalid,
        },
        Err(error) => FileReport {
            status: error.to_string(),
            output: None,
            outcome: Outcome::Failed,
        },
    }
}

/// Diff between the data as parsed and as left behind by validation. The
/// engine never mutates instances, so this reports "no changes" unless
/// that ever stops being true.
fn changes_report(format: ChangesFormat, parsed: &crate::parsers::ParsedFile) -> String {
    let original = parsed.data().clone();
    let patch = json_patch::diff(&original, parsed.data());
    if patch.0.is_empty() {
        return "no changes".to_owned();
    }
    let rendered = match format {
        ChangesFormat::Js => format!("{patch:#?}"),
        ChangesFormat::Json => {
            serde_json::to_string_pretty(&patch).unwrap_or_else(|error| error.to_string())
        }
        ChangesFormat::JsonOneline => {
            serde_json::to_string(&patch).unwrap_or_else(|error| error.to_string())
        }
    };
    format!("changes:\n{rendered}")
}

/// Writes one file's report: the status line to stderr, the formatted
/// errors (or changes) to stdout.
fn emit(report: &FileReport) {
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{}", report.status).ok();
    drop(stderr);
    if let Some(output) = &report.output {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{output}").ok();
    }
}
