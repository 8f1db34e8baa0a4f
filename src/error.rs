use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Empty snapshot, unparsable underlying or a structurally broken record.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Aggregate put/call ratio with zero call open interest in the window.
    #[error("Aggregate put/call ratio undefined: no call open interest in window")]
    DivisionUndefined,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
