//! Commands, phrases, and the command status record.
//!
//! A [`CommandStatus`] is the normalized outcome of one command attempt.
//! The dispatcher creates one per attempt, fills it in before publication,
//! and broadcasts it over the event bus; consumers treat published records
//! as immutable.

use crate::payload::TimedColor;
use crate::session::TransferHandle;

/// One of the seven operations a user can issue against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    /// Replace the shared application context
    UpdateContext,
    /// Send a message and await a reply
    SendMessage,
    /// Send a binary message and await a reply
    SendMessageData,
    /// Transfer a file
    TransferFile,
    /// Transfer a piece of user info
    TransferUserInfo,
    /// Transfer user info for the watch-face complication
    TransferComplicationUserInfo,
    /// Delete transferable files from the shared container
    DeleteData,
}

impl Command {
    /// All commands, in page order.
    pub const ALL: [Self; 7] = [
        Self::UpdateContext,
        Self::SendMessage,
        Self::SendMessageData,
        Self::TransferFile,
        Self::TransferUserInfo,
        Self::TransferComplicationUserInfo,
        Self::DeleteData,
    ];

    /// Stable display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UpdateContext => "updateContext",
            Self::SendMessage => "sendMessage",
            Self::SendMessageData => "sendMessageData",
            Self::TransferFile => "transferFile",
            Self::TransferUserInfo => "transferUserInfo",
            Self::TransferComplicationUserInfo => "transferComplicationUserInfo",
            Self::DeleteData => "deleteData",
        }
    }

    /// Whether this command starts a transport-level transfer.
    #[must_use]
    pub const fn is_transfer(&self) -> bool {
        matches!(
            self,
            Self::TransferFile | Self::TransferUserInfo | Self::TransferComplicationUserInfo
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a command currently stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// Shared context replaced
    Updated,
    /// Message handed to the transport, reply pending
    Sent,
    /// Counterpart replied
    Replied,
    /// Transfer in flight
    Transferring,
    /// Transfer completed
    Finished,
    /// Data arrived from the counterpart
    Received,
    /// The attempt failed
    Failed,
}

impl Phrase {
    /// Stable display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::Sent => "sent",
            Self::Replied => "replied",
            Self::Transferring => "transferring",
            Self::Finished => "finished",
            Self::Received => "received",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The normalized outcome of one command attempt.
///
/// `transfer` is present iff the command is one of the transfer commands
/// and the phrase is [`Phrase::Transferring`] or [`Phrase::Finished`].
#[derive(Debug, Clone)]
pub struct CommandStatus {
    /// The command this record describes
    pub command: Command,
    /// Lifecycle marker
    pub phrase: Phrase,
    /// Digest of the payload that flowed, if any
    pub timed_color: Option<TimedColor>,
    /// Failure text, present only on failed attempts
    pub error_message: Option<String>,
    /// Handle to the in-flight transfer, for transfer commands
    pub transfer: Option<TransferHandle>,
}

impl CommandStatus {
    /// Create a status record with no digest, error, or transfer attached.
    #[must_use]
    pub fn new(command: Command, phrase: Phrase) -> Self {
        Self {
            command,
            phrase,
            timed_color: None,
            error_message: None,
            transfer: None,
        }
    }

    /// Create a failed record carrying the given error text.
    #[must_use]
    pub fn failed(command: Command, message: impl Into<String>) -> Self {
        let mut status = Self::new(command, Phrase::Failed);
        status.error_message = Some(message.into());
        status
    }

    /// Attach a payload digest.
    #[must_use]
    pub fn with_timed_color(mut self, timed_color: Option<TimedColor>) -> Self {
        self.timed_color = timed_color;
        self
    }

    /// Whether this record describes a failed attempt.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_lists_every_command_once() {
        let mut labels: Vec<&str> = Command::ALL.iter().map(Command::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 7);
    }

    #[test]
    fn test_transfer_commands() {
        assert!(Command::TransferFile.is_transfer());
        assert!(Command::TransferUserInfo.is_transfer());
        assert!(Command::TransferComplicationUserInfo.is_transfer());
        assert!(!Command::SendMessage.is_transfer());
        assert!(!Command::DeleteData.is_transfer());
    }

    #[test]
    fn test_failed_record() {
        let status = CommandStatus::failed(Command::UpdateContext, "counterpart gone");
        assert_eq!(status.phrase, Phrase::Failed);
        assert!(status.is_error());
        assert!(status.transfer.is_none());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Command::TransferComplicationUserInfo.to_string(), "transferComplicationUserInfo");
        assert_eq!(Phrase::Transferring.to_string(), "transferring");
    }
}
