use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `CocircError` and maps other errors to
/// convert to a `CocircError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum CocircError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A parameter name is unknown or its value is outside the accepted range.
    ParameterError(String),
    /// A run, scenario or extraction setting is unusable (step, horizon, stride...).
    ConfigError(String),
    /// A handle or segment index that was never issued.
    IndexError {
        kind: &'static str,
        index: usize,
    },
    /// The run was superseded before it finished.
    Cancelled,
    ReportError(String),
    CocircError(String),
}

impl From<io::Error> for CocircError {
    fn from(error: io::Error) -> Self {
        CocircError::IoError(error)
    }
}

impl From<serde_json::Error> for CocircError {
    fn from(error: serde_json::Error) -> Self {
        CocircError::JsonError(error)
    }
}

impl From<csv::Error> for CocircError {
    fn from(error: csv::Error) -> Self {
        CocircError::CSVError(error)
    }
}

impl From<String> for CocircError {
    fn from(error: String) -> Self {
        CocircError::CocircError(error)
    }
}

impl From<&str> for CocircError {
    fn from(error: &str) -> Self {
        CocircError::CocircError(error.to_string())
    }
}

impl std::error::Error for CocircError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CocircError::IoError(e) => Some(e),
            CocircError::JsonError(e) => Some(e),
            CocircError::CSVError(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for CocircError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CocircError::IndexError { kind, index } => {
                write!(f, "Error: no {kind} with index {index}")
            }
            CocircError::Cancelled => write!(f, "Error: run cancelled"),
            CocircError::ParameterError(msg)
            | CocircError::ConfigError(msg)
            | CocircError::ReportError(msg)
            | CocircError::CocircError(msg) => write!(f, "Error: {msg}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_converts_to_generic_variant() {
        let err: CocircError = "something broke".into();
        assert!(matches!(err, CocircError::CocircError(ref m) if m == "something broke"));
        assert_eq!(err.to_string(), "Error: something broke");
    }

    #[test]
    fn index_error_names_kind_and_index() {
        let err = CocircError::IndexError {
            kind: "change segment",
            index: 3,
        };
        assert_eq!(err.to_string(), "Error: no change segment with index 3");
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error;
        let err: CocircError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(err.source().is_some());
    }
}
