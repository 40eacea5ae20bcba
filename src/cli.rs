//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::SchemaSpec;
use crate::output::ErrorFormat;

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "jsv",
    version,
    about = "Validate JSON, JSONC, and YAML files against a JSON Schema"
)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate data files against a schema.
    Validate(ValidateArgs),
    /// Check that schema files compile.
    Compile(CompileArgs),
    /// Assert that data files are valid (or invalid) against a schema.
    Test(TestArgs),
}

/// Arguments of the `validate` subcommand.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Schema file (JSON, JSONC, or YAML).
    #[arg(short = 's', long = "schema", value_name = "FILE")]
    pub schema: String,

    /// Data files or glob patterns to validate (repeatable).
    #[arg(short = 'd', long = "data", value_name = "FILE", required = true)]
    pub data: Vec<String>,

    /// Additional schemas referenced via `$ref`, registered by their `$id`
    /// (repeatable).
    #[arg(short = 'r', long = "ref-schema", value_name = "FILE")]
    pub refs: Vec<String>,

    /// JSON Schema draft to compile with; detected from `$schema` when
    /// omitted.
    #[arg(long, value_enum)]
    pub spec: Option<SchemaSpec>,

    /// Error output format.
    #[arg(long = "errors", value_enum, default_value = "js")]
    pub errors: ErrorFormat,

    /// Keep every raw validator error instead of merging related ones.
    #[arg(long)]
    pub no_merge_errors: bool,

    /// Resolve source locations even for formats that do not display them.
    #[arg(long)]
    pub location: bool,

    /// Report the difference between pre- and post-validation data.
    #[arg(
        long,
        value_enum,
        value_name = "FORMAT",
        num_args = 0..=1,
        default_missing_value = "js"
    )]
    pub changes: Option<ChangesFormat>,

    /// Keep raw schema/data context on error records.
    #[arg(long)]
    pub verbose: bool,

    /// Validate `format` keywords.
    #[arg(long)]
    pub validate_formats: bool,
}

/// Arguments of the `compile` subcommand.
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Schema files or glob patterns to compile (repeatable).
    #[arg(short = 's', long = "schema", value_name = "FILE", required = true)]
    pub schemas: Vec<String>,

    /// Additional schemas referenced via `$ref` (repeatable).
    #[arg(short = 'r', long = "ref-schema", value_name = "FILE")]
    pub refs: Vec<String>,

    /// JSON Schema draft to compile with; detected from `$schema` when
    /// omitted.
    #[arg(long, value_enum)]
    pub spec: Option<SchemaSpec>,

    /// Validate `format` keywords.
    #[arg(long)]
    pub validate_formats: bool,
}

/// Arguments of the `test` subcommand.
#[derive(Debug, Args)]
pub struct TestArgs {
    /// Schema file (JSON, JSONC, or YAML).
    #[arg(short = 's', long = "schema", value_name = "FILE")]
    pub schema: String,

    /// Data files or glob patterns to test (repeatable).
    #[arg(short = 'd', long = "data", value_name = "FILE", required = true)]
    pub data: Vec<String>,

    /// Additional schemas referenced via `$ref` (repeatable).
    #[arg(short = 'r', long = "ref-schema", value_name = "FILE")]
    pub refs: Vec<String>,

    /// JSON Schema draft to compile with; detected from `$schema` when
    /// omitted.
    #[arg(long, value_enum)]
    pub spec: Option<SchemaSpec>,

    /// Error output format for failing files.
    #[arg(long = "errors", value_enum, default_value = "js")]
    pub errors: ErrorFormat,

    /// Expect every data file to be valid.
    #[arg(long, conflicts_with = "invalid", required_unless_present = "invalid")]
    pub valid: bool,

    /// Expect every data file to be invalid.
    #[arg(long)]
    pub invalid: bool,

    /// Validate `format` keywords.
    #[arg(long)]
    pub validate_formats: bool,
}

/// Output formats of the `--changes` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChangesFormat {
    /// Native structured dump of the patch operations.
    Js,
    /// Pretty-printed JSON patch.
    Json,
    /// Single-line JSON patch.
    JsonOneline,
}
