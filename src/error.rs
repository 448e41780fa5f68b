//! Error types for the I/O edges and config loading
//!
//! The simulation itself is infallible; everything here comes from the
//! ledger, the wallet, or a rule table that failed validation.

use thiserror::Error;

/// Failures talking to the score/leaderboard ledger.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("invalid response from leaderboard: {0}")]
    InvalidResponse(String),
    #[error("ledger rejected request: {0}")]
    Rejected(String),
}

impl LedgerError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Network(_) | LedgerError::InvalidResponse(_))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::InvalidResponse(err.to_string())
    }
}

/// Failures from the injected wallet.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("no wallet extension available")]
    Unavailable,
    #[error("wallet connection rejected: {0}")]
    Rejected(String),
    #[error("wallet call failed: {0}")]
    Call(String),
}

/// A rule table that cannot drive a simulation.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite and not negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be at least 1.0 (got {value})")]
    RatioBelowOne { field: &'static str, value: f64 },
    #[error("{field} must be within [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("{field} must not be zero")]
    ZeroCount { field: &'static str },
    #[error("radius {radius} does not fit a {width}x{height} world")]
    DoesNotFit { radius: f32, width: f32, height: f32 },
    #[error("failed to parse rule table: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Parse(err.to_string())
    }
}
