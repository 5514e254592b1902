//! Layered error definitions
//!
//! Categorized by source: config / world / clock / aggregation / topology / sink

use thiserror::Error;

use crate::{FrameId, SensorKind};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== World Errors =====
    /// Simulator connection error (fatal at startup)
    #[error("world connection error: {message}")]
    Connection { message: String },

    /// Actor lookup failure
    #[error("world actor not found: {actor_id}")]
    ActorNotFound { actor_id: u64 },

    // ===== Clock / Aggregation Errors =====
    /// No tick arrived within the configured wait (recoverable)
    #[error("clock timeout: no tick within {waited_ms}ms")]
    ClockTimeout { waited_ms: u64 },

    /// Sensor already attached (logged no-op, not a failure)
    #[error("sensor '{sensor_id}' already attached")]
    AttachConflict { sensor_id: String },

    /// Reading carried an unexpected frame id (diagnostic, reading dropped)
    #[error("frame mismatch for {kind} sensor '{sensor_id}': expected {expected}, got {got}")]
    FrameMismatch {
        sensor_id: String,
        kind: SensorKind,
        expected: FrameId,
        got: FrameId,
    },

    /// A pipeline channel closed underneath its user (fatal)
    #[error("channel '{channel}' closed")]
    ChannelClosed { channel: &'static str },

    // ===== Topology Errors =====
    /// Lane walk exceeded the step bound (feature skipped)
    #[error("lane walk on road {road_id} unterminated after {steps} steps")]
    WalkUnterminated { road_id: u64, steps: usize },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create world connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether the pipeline may keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ClockTimeout { .. } | Self::AttachConflict { .. } | Self::FrameMismatch { .. }
        )
    }
}
