//! Error types for the deconfliction engine.
//!
//! Only configuration, navigation data and top-level input failures abort a
//! run. Per-record problems are [`ValidationError`]s: the record is skipped
//! and the rejection is carried into the report.

use thiserror::Error;

/// The main error type for engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Engine configuration failed validation. The run does not start.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Navigation data could not be loaded.
    #[error("invalid navigation data: {message}")]
    Navdata {
        /// Description of what went wrong.
        message: String,
    },

    /// The input document itself could not be parsed.
    #[error("failed to parse input: {0}")]
    Input(#[from] serde_json::Error),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new navigation data error.
    #[must_use]
    pub fn navdata(message: impl Into<String>) -> Self {
        Self::Navdata {
            message: message.into(),
        }
    }

    /// Check if this error is a configuration problem.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// A configuration value outside its permitted range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct ConfigError {
    /// Dotted path of the offending field, e.g. `separation.horizontal_nm`.
    pub field: &'static str,
    /// Description of the constraint that was violated.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Why a single flight record was rejected at ingestion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is absent or null.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A numeric field that must be strictly positive is not.
    #[error("field '{field}' must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// A count that must not be negative is.
    #[error("field '{field}' must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    /// A station code that the navigation database does not know.
    #[error("unknown station '{code}' in field '{field}'")]
    UnknownStation { field: &'static str, code: String },

    /// Departure and arrival resolve to the same station.
    #[error("departure and arrival are both '{code}'")]
    SameStation { code: String },

    /// Another valid record already uses this callsign.
    #[error("duplicate acid '{acid}'")]
    DuplicateAcid { acid: String },

    /// The departure time is not a recognised timestamp.
    #[error("invalid departure time '{value}'")]
    InvalidTimestamp { value: String },

    /// The record could not be read as a flight record at all.
    #[error("malformed record: {message}")]
    Malformed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::from(ConfigError::new(
            "separation.horizontal_nm",
            "must be positive",
        ));
        assert_eq!(
            err.to_string(),
            "invalid configuration: separation.horizontal_nm: must be positive"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_navdata_error_display() {
        let err = Error::navdata("latitude out of range for 'XYZ'");
        assert!(err.to_string().contains("XYZ"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Input(_)));
        }
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NonPositive {
            field: "speed",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "field 'speed' must be positive, got 0");

        let err = ValidationError::UnknownStation {
            field: "arrival",
            code: "ZZZZ".to_string(),
        };
        assert!(err.to_string().contains("ZZZZ"));
    }
}
