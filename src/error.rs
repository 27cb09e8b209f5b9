//! Error types for the labor board.

use thiserror::Error;

/// Which uploaded CSV a read failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvSource {
    Roster,
    Swap,
    VetVto,
    LaborShare,
}

impl std::fmt::Display for CsvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CsvSource::Roster => "roster",
            CsvSource::Swap => "swap",
            CsvSource::VetVto => "VET/VTO",
            CsvSource::LaborShare => "labor share",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum BoardError {
    /// No roster file was supplied with a submission
    #[error("Please choose a roster CSV file")]
    MissingRoster,

    /// A CSV file could not be read
    #[error("Failed to read {source_file} CSV: {source}")]
    Csv {
        source_file: CsvSource,
        #[source]
        source: csv::Error,
    },

    /// The submission itself is malformed (bad selector, missing headers)
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Unknown badge: {0}")]
    UnknownBadge(String),

    #[error("Unknown tile: {0}")]
    UnknownTile(String),

    /// Stored snapshot is missing or has the wrong structure
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Publish was not confirmed")]
    NotConfirmed,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BoardError {
    /// Message safe to show to the planner. CSV failures are collapsed into
    /// one generic hint; the detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            BoardError::Csv { .. } => {
                "Could not read the uploaded CSV files. Check the headers and retry.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
