//! Error types shared by every engine operation.

/// Failure conditions reported by the filtering engine.
///
/// Every variant is detected before any transform work starts, so a failed
/// call never produces partial output.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The raster is empty, has an unsupported channel count, or its shape
    /// does not fit the operation. Also used for out-of-range parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An unrecognized operator, filter family, pass or smoothing token.
    #[error("Unsupported filter kind: {0:?}")]
    UnsupportedFilterKind(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FilterError::InvalidInput(msg.into())
    }
}

#[cfg(feature = "python")]
impl From<FilterError> for pyo3::PyErr {
    fn from(err: FilterError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
