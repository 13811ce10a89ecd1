use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage connection failed: {0}")]
    Connection(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("invalid storage configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsufficientDataError {
    #[error("No data available.")]
    NoTicks,
    #[error("Data missing for one or both symbols.")]
    MissingSymbols { missing: Vec<String> },
    #[error("Not enough aligned data. Need at least {required} data points.")]
    NotEnoughAligned { required: usize, available: usize },
}

/// A numerically degenerate estimation step. Never fatal: the estimator
/// substitutes an explicit default and carries this message in its result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimationFault {
    #[error("{0}")]
    DegenerateInput(String),
    #[error("singular design matrix: {0}")]
    Singular(String),
    #[error("sample size is too short to use selected regression component (nobs={nobs})")]
    TooShort { nobs: usize },
    #[error("non-finite estimate: {0}")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Insufficient(#[from] InsufficientDataError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalyticsError {
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::Insufficient(_) => "insufficient_data",
            AnalyticsError::Storage(_) => "storage",
            AnalyticsError::InvalidRequest(_) => "invalid_request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("invalid tick: {0}")]
    InvalidTick(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error("export failed: {0}")]
    Io(String),
}
