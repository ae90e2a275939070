use crate::instrument::Instrument;

/// All errors generated while loading and analysing tick data.
///
/// Undefined numeric results (empty windows, division by a zero range) are not
/// errors: they travel as `None` and are excluded from every aggregate.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("tick source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {} at line {line}: {reason}", .path.display())]
    MalformedRecord {
        path: std::path::PathBuf,
        line: u64,
        reason: String,
    },

    #[error("no regular-session ticks found for {instrument}")]
    NoRegularSession { instrument: Instrument },

    #[error(
        "instrument date ranges do not overlap: latest first date {latest_start}, \
        earliest last date {earliest_end}"
    )]
    MisalignedDateRange {
        latest_start: chrono::NaiveDate,
        earliest_end: chrono::NaiveDate,
    },

    #[error("tick size for {instrument} must be positive, got {tick_size}")]
    InvalidTickSize { instrument: Instrument, tick_size: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to persist report: {0}")]
    Persist(String),
}

impl From<bincode::Error> for AnalysisError {
    fn from(error: bincode::Error) -> Self {
        AnalysisError::Persist(error.to_string())
    }
}
