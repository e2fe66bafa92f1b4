//! # Wristlink Core Library
//!
//! `wristlink-core` provides the core functionality for Wristlink, a
//! demonstration of phone/wrist companion connectivity: exchanging
//! application context, messages, binary payloads, and files between two
//! paired endpoints, and reflecting transfer status in a user interface.
//!
//! The session transport itself is an external collaborator, consumed
//! through the [`session::SessionTransport`] trait. An in-process
//! [`session::loopback`] implementation pairs two endpoints so the demo
//! binary and the integration tests can run end to end.
//!
//! ## Modules
//!
//! - [`bus`] - Typed publish/subscribe channel for session events
//! - [`commands`] - Command dispatcher issuing operations against the transport
//! - [`config`] - Configuration management
//! - [`delivery`] - The single delivery context for UI-facing updates
//! - [`mod@file`] - Shared-container enumeration and cleanup
//! - [`observers`] - Progress observer registry for in-flight transfers
//! - [`pages`] - Presentation adapters (paged wrist view, phone flow log)
//! - [`payload`] - Payload dictionaries and timed-color digests
//! - [`session`] - Session transport contract and loopback implementation
//! - [`status`] - Commands, phrases, and the command status record
//!
//! ## Example
//!
//! ```rust,ignore
//! use wristlink_core::bus::EventBus;
//! use wristlink_core::commands::{Capabilities, CommandDispatcher};
//! use wristlink_core::payload::Payload;
//!
//! let dispatcher = CommandDispatcher::new(transport, bus.clone(), Capabilities::detect(), dir);
//! dispatcher.send_message(Payload::timed_now());
//! // Subscribers on `bus` receive a `sent` record, then `replied` or `failed`.
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod bus;
pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod file;
pub mod observers;
pub mod pages;
pub mod payload;
pub mod session;
pub mod status;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error text published when a command is issued against an unactivated session.
pub const SESSION_NOT_ACTIVATED: &str = "session not activated";

/// File extensions eligible for transfer and cleanup in the shared container.
pub const TRANSFERABLE_EXTENSIONS: [&str; 3] = ["txt", "caf", "wav"];

/// Default simulated latency for a loopback transfer step, in milliseconds.
pub const DEFAULT_TRANSFER_STEP_MS: u64 = 20;

/// Number of progress steps a loopback transfer reports.
pub const TRANSFER_PROGRESS_STEPS: u64 = 4;
