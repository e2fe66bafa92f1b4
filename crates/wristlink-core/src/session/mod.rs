//! Session transport contract.
//!
//! The core never talks to a radio: it issues calls against a
//! [`SessionTransport`] and reacts to the callbacks. Activation,
//! reachability, and actual byte delivery belong to whatever implements
//! the trait - the in-process [`loopback`] pair here, or a platform
//! session in a real deployment.

pub mod loopback;

use std::path::Path;

use tokio::sync::watch;
use uuid::Uuid;

use crate::error::Result;
use crate::payload::Payload;
use crate::status::Command;

/// Reply callback for a message send.
pub type ReplyHandler = Box<dyn FnOnce(Payload) + Send + 'static>;

/// Reply callback for a binary message send.
pub type DataReplyHandler = Box<dyn FnOnce(Vec<u8>) + Send + 'static>;

/// Error callback for an asynchronous transport operation.
///
/// Carries the transport's error text; the dispatcher folds it into the
/// published status record.
pub type ErrorHandler = Box<dyn FnOnce(String) + Send + 'static>;

/// What kind of transfer a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// A user-info dictionary
    UserInfo,
    /// A file with metadata
    File,
    /// User info destined for the watch-face complication
    ComplicationUserInfo,
}

impl TransferKind {
    /// The command that initiates this kind of transfer.
    #[must_use]
    pub const fn command(&self) -> Command {
        match self {
            Self::UserInfo => Command::TransferUserInfo,
            Self::File => Command::TransferFile,
            Self::ComplicationUserInfo => Command::TransferComplicationUserInfo,
        }
    }
}

/// Progress of an in-flight transfer, in abstract units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Units completed so far
    pub completed: u64,
    /// Total units in the transfer
    pub total: u64,
}

impl TransferProgress {
    /// A transfer that has not moved yet.
    #[must_use]
    pub const fn starting(total: u64) -> Self {
        Self { completed: 0, total }
    }

    /// Completion as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            self.completed * 100 / self.total
        }
    }

    /// Whether every unit is done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

impl std::fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}% completed", self.percentage())
    }
}

/// Opaque reference to an in-flight transfer, owned by the transport.
///
/// Cloning the handle does not extend the transfer's lifetime; it only
/// clones the view onto its progress stream.
#[derive(Clone)]
pub struct TransferHandle {
    id: Uuid,
    kind: TransferKind,
    file_name: Option<String>,
    progress: watch::Receiver<TransferProgress>,
}

impl TransferHandle {
    /// Create a handle and the sender that drives its progress stream.
    ///
    /// Intended for transport implementations; the core only ever observes.
    #[must_use]
    pub fn channel(
        kind: TransferKind,
        file_name: Option<String>,
        total_units: u64,
    ) -> (Self, watch::Sender<TransferProgress>) {
        let (tx, rx) = watch::channel(TransferProgress::starting(total_units));
        let handle = Self {
            id: Uuid::new_v4(),
            kind,
            file_name,
            progress: rx,
        };
        (handle, tx)
    }

    /// Unique id of the underlying transfer.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// What kind of transfer this is.
    #[must_use]
    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// File name, for file transfers.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// A fresh view onto the progress stream.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<TransferProgress> {
        self.progress.clone()
    }

    /// The most recently reported progress.
    #[must_use]
    pub fn latest_progress(&self) -> TransferProgress {
        *self.progress.borrow()
    }
}

impl std::fmt::Debug for TransferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

/// The bidirectional session between the paired endpoints.
///
/// All methods are non-blocking; results of the asynchronous operations
/// arrive through the supplied callbacks, which may fire on any thread.
pub trait SessionTransport: Send + Sync {
    /// Whether the session has completed activation.
    fn is_activated(&self) -> bool;

    /// Whether the counterpart is currently reachable.
    ///
    /// Only meaningful while the session is activated.
    fn is_reachable(&self) -> bool;

    /// Replace the shared application context. Synchronous.
    fn update_context(&self, context: Payload) -> Result<()>;

    /// Send a message; exactly one of the callbacks fires later.
    fn send_message(&self, message: Payload, on_reply: ReplyHandler, on_error: ErrorHandler);

    /// Send a binary message; exactly one of the callbacks fires later.
    fn send_message_data(
        &self,
        data: Vec<u8>,
        on_reply: DataReplyHandler,
        on_error: ErrorHandler,
    );

    /// Start a user-info transfer and return its handle.
    fn transfer_user_info(&self, user_info: Payload) -> TransferHandle;

    /// Start a file transfer and return its handle.
    fn transfer_file(&self, file: &Path, metadata: Payload) -> TransferHandle;

    /// Start a complication user-info transfer and return its handle.
    ///
    /// Callers gate on [`Self::is_complication_capable`] first.
    fn transfer_complication_user_info(&self, user_info: Payload) -> TransferHandle;

    /// The most recently received application context, if any.
    fn received_context(&self) -> Option<Payload>;

    /// Number of file transfers accepted but not yet completed.
    fn outstanding_file_transfers(&self) -> usize;

    /// Number of user-info transfers accepted but not yet completed.
    fn outstanding_user_info_transfers(&self) -> usize;

    /// Whether the counterpart currently accepts complication updates.
    fn is_complication_capable(&self) -> bool;
}
