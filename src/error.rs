//! Program-level error taxonomy.
//!
//! These are the failure kinds the CLI layer maps to exit codes. An
//! unresolvable source location is deliberately *not* an error: it is a
//! documented no-location state that every output format renders as a
//! filename-only line.

/// Fatal failures surfaced to the CLI layer.
///
/// Validation failures are not represented here; they are an expected
/// outcome reported per file and mapped to exit code 1 by the command.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// A schema failed to compile (malformed schema or unresolvable
    /// `$ref`). Fatal for the whole invocation: without a compiled
    /// validator no data file can be processed.
    #[error("schema {filename} is invalid: {reason}")]
    SchemaInvalid {
        /// The schema file that failed to compile.
        filename: String,
        /// The engine's description of the first defect.
        reason: String,
    },

    /// An input file could not be read or decoded.
    #[error("{filename}: {reason}")]
    InvalidFile {
        /// The offending file.
        filename: String,
        /// What went wrong while reading or decoding it.
        reason: String,
    },

    /// Serializing an output document failed.
    #[error("failed to serialize output: {0}")]
    Render(#[from] serde_json::Error),
}

impl ProgramError {
    /// The process exit code for this failure kind.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SchemaInvalid { .. } | Self::InvalidFile { .. } | Self::Render(_) => 2,
        }
    }
}
