//! Command dispatcher.
//!
//! Translates each user-initiated command into exactly one call against
//! the session transport and always produces at least one status record
//! on the bus. Transport failures never surface as errors to the caller:
//! they are folded into the record's `error_message` and the published
//! record is the only caller-visible signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bus::{EventBus, SessionEvent};
use crate::file;
use crate::payload::{Payload, TimedColor};
use crate::session::SessionTransport;
use crate::status::{Command, CommandStatus, Phrase};
use crate::SESSION_NOT_ACTIVATED;

/// Capabilities resolved once at startup.
///
/// The complication flag is a build-target concern: phone-side builds
/// carry the `complication` cargo feature, wrist-side builds do not.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// Whether this build can issue complication transfers at all
    pub complication: bool,
}

impl Capabilities {
    /// Capabilities of the running build.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            complication: cfg!(feature = "complication"),
        }
    }

    /// A build with no optional capabilities (the wrist-side profile).
    #[must_use]
    pub const fn none() -> Self {
        Self { complication: false }
    }
}

/// Issues commands against the session transport and publishes their
/// status records.
pub struct CommandDispatcher {
    transport: Arc<dyn SessionTransport>,
    bus: EventBus,
    capabilities: Capabilities,
    container: PathBuf,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given transport.
    ///
    /// `container` is the shared directory that `transfer_outbox` reads
    /// and `delete_data` sweeps.
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        bus: EventBus,
        capabilities: Capabilities,
        container: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            bus,
            capabilities,
            container: container.into(),
        }
    }

    /// The shared container directory this dispatcher operates on.
    #[must_use]
    pub fn container(&self) -> &Path {
        &self.container
    }

    /// Replace the shared application context.
    ///
    /// Synchronous: publishes `updated`, or `failed` with the transport's
    /// error text.
    pub fn update_context(&self, context: Payload) {
        let mut status = CommandStatus::new(Command::UpdateContext, Phrase::Updated)
            .with_timed_color(context.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        if let Err(e) = self.transport.update_context(context) {
            status.phrase = Phrase::Failed;
            status.error_message = Some(e.to_string());
        }
        self.publish(status);
    }

    /// Send a message.
    ///
    /// Publishes an optimistic `sent` record synchronously; exactly one
    /// `replied` or `failed` record follows once the transport resolves.
    pub fn send_message(&self, message: Payload) {
        let status = CommandStatus::new(Command::SendMessage, Phrase::Sent)
            .with_timed_color(message.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        self.publish(status.clone());

        let reply_bus = self.bus.clone();
        let reply_base = status.clone();
        let error_bus = self.bus.clone();
        self.transport.send_message(
            message,
            Box::new(move |reply| {
                let mut resolved = reply_base;
                resolved.phrase = Phrase::Replied;
                resolved.timed_color = reply.timed_color();
                reply_bus.publish(&SessionEvent::DataFlowed(resolved));
            }),
            Box::new(move |error| {
                let mut resolved = status;
                resolved.phrase = Phrase::Failed;
                resolved.error_message = Some(error);
                error_bus.publish(&SessionEvent::DataFlowed(resolved));
            }),
        );
    }

    /// Send a binary message.
    ///
    /// Same two-record contract as [`Self::send_message`].
    pub fn send_message_data(&self, data: Vec<u8>) {
        let status = CommandStatus::new(Command::SendMessageData, Phrase::Sent)
            .with_timed_color(TimedColor::from_bytes(&data));
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        self.publish(status.clone());

        let reply_bus = self.bus.clone();
        let reply_base = status.clone();
        let error_bus = self.bus.clone();
        self.transport.send_message_data(
            data,
            Box::new(move |reply| {
                let mut resolved = reply_base;
                resolved.phrase = Phrase::Replied;
                resolved.timed_color = TimedColor::from_bytes(&reply);
                reply_bus.publish(&SessionEvent::DataFlowed(resolved));
            }),
            Box::new(move |error| {
                let mut resolved = status;
                resolved.phrase = Phrase::Failed;
                resolved.error_message = Some(error);
                error_bus.publish(&SessionEvent::DataFlowed(resolved));
            }),
        );
    }

    /// Start a user-info transfer.
    pub fn transfer_user_info(&self, user_info: Payload) {
        let mut status = CommandStatus::new(Command::TransferUserInfo, Phrase::Transferring)
            .with_timed_color(user_info.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        status.transfer = Some(self.transport.transfer_user_info(user_info));
        self.publish(status);
    }

    /// Start a file transfer.
    pub fn transfer_file(&self, file: &Path, metadata: Payload) {
        let status = CommandStatus::new(Command::TransferFile, Phrase::Transferring)
            .with_timed_color(metadata.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        self.transfer_file_activated(file, metadata);
    }

    /// Transfer every transferable file staged in the shared container.
    ///
    /// One `transferring` record per file. An empty or unreadable
    /// container produces no records.
    pub fn transfer_outbox(&self, metadata: Payload) {
        let status = CommandStatus::new(Command::TransferFile, Phrase::Transferring)
            .with_timed_color(metadata.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }
        for path in file::transferable_files(&self.container) {
            self.transfer_file_activated(&path, metadata.clone());
        }
    }

    fn transfer_file_activated(&self, file: &Path, metadata: Payload) {
        let mut status = CommandStatus::new(Command::TransferFile, Phrase::Transferring)
            .with_timed_color(metadata.timed_color());
        status.transfer = Some(self.transport.transfer_file(file, metadata));
        self.publish(status);
    }

    /// Start a complication user-info transfer.
    ///
    /// Gated twice: the build must carry the capability, and the
    /// transport's counterpart must currently accept complication
    /// updates. Either gate missing publishes `failed` without touching
    /// the transport.
    pub fn transfer_complication_user_info(&self, user_info: Payload) {
        let mut status =
            CommandStatus::new(Command::TransferComplicationUserInfo, Phrase::Failed)
                .with_timed_color(user_info.timed_color());
        if !self.transport.is_activated() {
            return self.fail_unactivated(status);
        }

        if !self.capabilities.complication {
            status.error_message = Some("complication transfers are not supported in this build".into());
        } else if !self.transport.is_complication_capable() {
            status.error_message = Some("complication is not enabled".into());
        } else {
            status.phrase = Phrase::Transferring;
            status.transfer = Some(self.transport.transfer_complication_user_info(user_info));
        }
        self.publish(status);
    }

    /// Delete every transferable file from the shared container.
    ///
    /// Side-effect only: no status record is published. Per-file failures
    /// are logged and swallowed.
    pub fn delete_data(&self) {
        let removed = file::remove_transferable_files(&self.container);
        tracing::debug!(removed, container = %self.container.display(), "shared container swept");
    }

    fn publish(&self, status: CommandStatus) {
        self.bus.publish(&SessionEvent::DataFlowed(status));
    }

    fn fail_unactivated(&self, mut status: CommandStatus) {
        status.phrase = Phrase::Failed;
        status.error_message = Some(SESSION_NOT_ACTIVATED.into());
        status.transfer = None;
        self.publish(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_profiles() {
        assert!(!Capabilities::none().complication);
        #[cfg(feature = "complication")]
        assert!(Capabilities::detect().complication);
        #[cfg(not(feature = "complication"))]
        assert!(!Capabilities::detect().complication);
    }
}
