//! Error types for the acmedns provider module
//!
//! Every failure mode of configuration resolution is a distinct variant so
//! that callers (and tests) can tell a grammar problem from a credentials
//! file problem without string matching.

use thiserror::Error;

/// Main error type for credential configuration resolution
#[derive(Debug, Error)]
pub enum AcmeDnsError {
    /// Malformed directive: wrong argument count, non-string argument,
    /// unrecognized sub-directive, or a domain block missing a field
    #[error("Directive syntax error: {message}")]
    Syntax { message: String },

    /// A scalar field was assigned more than once in the same parse pass
    #[error("'{field}' already set")]
    DuplicateField { field: String },

    /// The credentials file could not be read
    #[error("Failed to read config file '{path}'")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The credentials file matched neither accepted JSON shape
    #[error("Failed to decode credentials: {message}")]
    Decode { message: String },

    /// Zero or more than one configuration mode was active after parsing
    #[error("Invalid credential configuration: {message}")]
    Exclusivity { message: String },

    /// No credentials are configured for the requested zone
    #[error("No credentials configured for domain '{domain}'")]
    UnknownDomain { domain: String },
}

/// Result type alias for configuration resolution
pub type AcmeDnsResult<T> = Result<T, AcmeDnsError>;

impl AcmeDnsError {
    /// Create a syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Create a duplicate-field error
    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::DuplicateField {
            field: field.into(),
        }
    }

    /// Create a file-read error naming the offending path
    pub fn file_read(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an exclusivity error
    pub fn exclusivity(message: impl Into<String>) -> Self {
        Self::Exclusivity {
            message: message.into(),
        }
    }

    /// Create an unknown-domain error
    pub fn unknown_domain(domain: impl Into<String>) -> Self {
        Self::UnknownDomain {
            domain: domain.into(),
        }
    }

    /// Whether this error came from the directive grammar (as opposed to
    /// file I/O, decoding, or validation)
    pub fn is_grammar_error(&self) -> bool {
        matches!(self, Self::Syntax { .. } | Self::DuplicateField { .. })
    }
}
