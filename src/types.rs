//! Shared types for the aggregation engine
//!
//! One error enum covers every way a merge can fail; every public entry
//! point returns the crate-wide [`Result`] alias.

use std::fmt;

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, AggregateError>;

/// Serialization convention spoken by the fronted execution servers
///
/// The same logical response travels as a JSON document, a plain XML
/// document (JAXB-marshalled on the server side) or an XML document whose
/// tags are fully-qualified legacy type identifiers (XStream-marshalled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireFormat {
    Json,
    JaxbXml,
    XstreamXml,
}

impl WireFormat {
    /// Wire token used by the fleet to declare a format (`X-KIE-ContentType`)
    pub fn token(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::JaxbXml => "JAXB",
            Self::XstreamXml => "XSTREAM",
        }
    }

    /// Parse a declared format token, case-insensitively
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "JSON" => Some(Self::Json),
            "JAXB" => Some(Self::JaxbXml),
            "XSTREAM" => Some(Self::XstreamXml),
            _ => None,
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Failure of a single aggregation call
///
/// Every error is local to one call; the engine never retries and never
/// produces partial output.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// One of the input payloads failed to parse. The position is the
    /// 0-based index of the offending payload in the request.
    #[error("malformed payload at position {index}: {reason}")]
    MalformedPayload { index: usize, reason: String },

    /// Payloads in one request resolved to different envelope shapes.
    #[error("payloads resolve to different shapes: {first} vs {other}")]
    ShapeMismatch { first: String, other: String },

    /// The declared wire format matches no aggregator.
    #[error("unsupported wire format: {0}")]
    UnsupportedFormat(String),
}
