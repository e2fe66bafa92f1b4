//! Error types for Wristlink.
//!
//! This module provides a unified error type for all Wristlink operations.
//! Command failures never reach callers as errors: the dispatcher folds
//! them into the `error_message` field of a published status record. The
//! variants here cover the transport contract, configuration, and the
//! filesystem helpers.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for Wristlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Wristlink.
#[derive(Error, Debug)]
pub enum Error {
    /// The session transport has not completed activation
    #[error("session not activated")]
    NotActivated,

    /// The transport rejected or failed an operation
    #[error("transport error: {0}")]
    Transport(String),

    /// A capability required by the command is absent in this build or session
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns whether re-issuing the command could succeed without any
    /// state change on this endpoint.
    ///
    /// Activation and reachability are owned by the transport, so a
    /// `NotActivated` failure clears on its own once the session comes up;
    /// a missing capability never does.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotActivated | Self::Transport(_))
    }
}
