use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, DsmError>;

/// Everything that can go wrong while building or querying a model
#[derive(Error, Debug)]
pub enum DsmError {
    /// A line or record does not have the field arity its stage expects
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Conflicting token/id assignment, or an id outside the declared shape
    #[error("index inconsistency: {0}")]
    IndexInconsistency(String),

    /// Strict lookup of a (target, context) pair that never co-occurred
    #[error("no association stored for target {target} and context {context}")]
    UndefinedAssociation { target: String, context: String },

    /// Zero corpus tokens, probabilities cannot be normalised
    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tabular file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("npy write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
