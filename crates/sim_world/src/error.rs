//! World boundary error types

use contracts::ContractError;
use thiserror::Error;

/// Errors from the simulator session
#[derive(Debug, Error)]
pub enum WorldError {
    /// Connection failed or session not established
    #[error("failed to connect to world at {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Method called before `connect`
    #[error("world session not connected")]
    NotConnected,

    /// No tick within the wait budget
    #[error("no world tick within {waited_ms}ms")]
    TickTimeout { waited_ms: u64 },
}

impl WorldError {
    pub fn connection_failed(
        host: impl Into<String>,
        port: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            port,
            message: message.into(),
        }
    }
}

impl From<WorldError> for ContractError {
    fn from(err: WorldError) -> Self {
        match err {
            WorldError::TickTimeout { waited_ms } => ContractError::ClockTimeout { waited_ms },
            other => ContractError::connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_timeout_maps_to_clock_timeout() {
        let err: ContractError = WorldError::TickTimeout { waited_ms: 30_000 }.into();
        assert!(matches!(err, ContractError::ClockTimeout { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_connection_maps_to_fatal() {
        let err: ContractError =
            WorldError::connection_failed("localhost", 2000, "refused").into();
        assert!(!err.is_recoverable());
    }
}
