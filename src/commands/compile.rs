//! The `compile` command: check that schema files compile, reporting each
//! one independently.

use std::io::Write;

use crate::cli::CompileArgs;
use crate::engine::CompileOptions;
use crate::error::ProgramError;

/// Compiles every schema named by `-s` and reports the result per file.
/// Returns exit code 0 when all compile, 2 otherwise.
///
/// # Errors
///
/// Returns [`ProgramError::InvalidFile`] when a glob pattern is invalid;
/// unreadable or uncompilable schemas are reported per file instead.
#[tracing::instrument(skip_all)]
pub async fn run(args: CompileArgs) -> Result<i32, ProgramError> {
    let files = super::expand_patterns(&args.schemas)?;
    let options = CompileOptions {
        spec: args.spec,
        validate_formats: args.validate_formats,
    };

    let mut all_valid = true;
    for filename in files {
        match super::build_validator(&filename, &args.refs, &options).await {
            Ok(_) => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "schema {filename} is valid").ok();
            }
            Err(error) => {
                all_valid = false;
                let mut stderr = std::io::stderr().lock();
                writeln!(stderr, "schema {filename} is invalid").ok();
                writeln!(stderr, "error: {error}").ok();
            }
        }
    }
    Ok(if all_valid { 0 } else { 2 })
}
