//! Behaviour switches shared by the validator and the login throttle.

use crate::error::AuthError;
use std::fmt;
use std::str::FromStr;

/// What to do when the shared store can't answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Treat the request as if the store had said yes (let it through).
    FailOpen,
    /// Reject the request.
    FailClosed,
}

impl FromStr for FailureMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Ok(FailureMode::FailOpen),
            "fail_closed" | "closed" => Ok(FailureMode::FailClosed),
            other => Err(AuthError::Configuration(format!(
                "unknown failure mode '{}', expected fail_open or fail_closed",
                other
            ))),
        }
    }
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureMode::FailOpen => f.write_str("fail_open"),
            FailureMode::FailClosed => f.write_str("fail_closed"),
        }
    }
}
