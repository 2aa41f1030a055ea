// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error type shared by every obq crate.
///
/// Quantization is a one-shot pure computation, so every failure is reported
/// synchronously and no partially-valid result is ever returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ObqError {
    /// A precondition on the inputs was violated.
    InvalidArgument(String),
    /// A configured resource budget would be exceeded, or size arithmetic
    /// overflowed while planning allocations.
    ResourceLimit(String),
    /// A non-finite value surfaced where the algorithm requires finite
    /// arithmetic.
    NumericalIssue(String),
}

impl ObqError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    pub fn numerical_issue(msg: impl Into<String>) -> Self {
        Self::NumericalIssue(msg.into())
    }
}

impl fmt::Display for ObqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::ResourceLimit(msg) => write!(f, "resource limit exceeded: {msg}"),
            Self::NumericalIssue(msg) => write!(f, "numerical issue: {msg}"),
        }
    }
}

impl std::error::Error for ObqError {}

#[cfg(test)]
mod tests {
    use super::ObqError;

    #[test]
    fn constructors_produce_matching_variants() {
        assert!(matches!(
            ObqError::invalid_argument("k"),
            ObqError::InvalidArgument(_)
        ));
        assert!(matches!(
            ObqError::resource_limit("bytes"),
            ObqError::ResourceLimit(_)
        ));
        assert!(matches!(
            ObqError::numerical_issue("nan"),
            ObqError::NumericalIssue(_)
        ));
    }

    #[test]
    fn display_prefixes_are_stable() {
        assert_eq!(
            ObqError::invalid_argument("num_buckets must be >= 1").to_string(),
            "invalid argument: num_buckets must be >= 1"
        );
        assert_eq!(
            ObqError::resource_limit("required_bytes=64, limit_bytes=32").to_string(),
            "resource limit exceeded: required_bytes=64, limit_bytes=32"
        );
        assert_eq!(
            ObqError::numerical_issue("non-finite range cost").to_string(),
            "numerical issue: non-finite range cost"
        );
    }
}
