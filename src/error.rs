//! Error types for the intake and triage engine.

use crate::models::TokenStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClinicError {
    /// Missing or out-of-range input field.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Duplicate token: {0}")]
    DuplicateToken(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Status changes only move forward.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TokenStatus, to: TokenStatus },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClinicError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClinicError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ClinicError::NotFound(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ClinicError>;
