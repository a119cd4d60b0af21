use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while locating and reading statistics files.
///
/// Only `NoInputFound` is fatal for a whole invocation, everything else is
/// collected per run and reported as a notice.
#[derive(Debug, Error)]
pub enum StatsError {
    /// a requested run directory has no statistics file
    #[error("no {stats_name} found under {}", dir.display())]
    MissingFile { dir: PathBuf, stats_name: String },

    /// the statistics file exists but could not be read
    #[error("unable to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// a sum candidate in a resolution rule is not a valid regex
    #[error("invalid counter pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// a root could not be expanded as a glob pattern
    #[error("invalid root pattern {pattern:?}: {reason}")]
    Discovery { pattern: String, reason: String },

    /// not a single statistics file was located across all roots
    #[error("no statistics file found in {roots:?}")]
    NoInputFound { roots: Vec<String> },
}
