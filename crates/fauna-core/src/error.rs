//! Error types shared across the crate. Hand-rolled `Display`/`Error` impls,
//! no panics or unwinding cross a tick boundary.

use std::{error::Error, fmt};

/// Raised at construction time when configuration is degenerate. This is
/// the only error kind allowed to abort initialization; every other fault
/// is absorbed and counted in `TickTelemetry`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveWorldSize { width: f64, height: f64 },
    NonPositiveGrid { label: &'static str, value: i64 },
    NegativeRate { label: &'static str, value: f64 },
    InvalidRange { label: &'static str, value: f32 },
    EmptyCellCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveWorldSize { width, height } => {
                write!(f, "world size must be positive, got ({width}, {height})")
            }
            ConfigError::NonPositiveGrid { label, value } => {
                write!(f, "{label} must be positive, got {value}")
            }
            ConfigError::NegativeRate { label, value } => {
                write!(f, "{label} must be >= 0, got {value}")
            }
            ConfigError::InvalidRange { label, value } => {
                write!(f, "{label} must be in [0, 1], got {value}")
            }
            ConfigError::EmptyCellCapacity => {
                write!(f, "particles.cell_capacity must be >= 0")
            }
        }
    }
}

impl Error for ConfigError {}

/// Returned by `Brain::think` on evaluation failure. The caller substitutes
/// configured default outputs and continues; no tick is ever aborted by a
/// brain fault.
#[derive(Debug, Clone, PartialEq)]
pub enum BrainError {
    /// The brain could not produce a finite output vector this tick.
    EvaluationFailed(String),
}

impl fmt::Display for BrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrainError::EvaluationFailed(msg) => write!(f, "brain evaluation failed: {msg}"),
        }
    }
}

impl Error for BrainError {}
