//! Common test utilities for Wristlink integration tests.
//!
//! Provides a scriptable mock session transport: tests flip its state,
//! inspect what the dispatcher called, and resolve pending message
//! replies by hand.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

use wristlink_core::error::{Error, Result};
use wristlink_core::payload::Payload;
use wristlink_core::session::{
    DataReplyHandler, ErrorHandler, ReplyHandler, SessionTransport, TransferHandle, TransferKind,
    TransferProgress,
};

/// A message handed to the transport, waiting to be resolved by the test.
pub struct PendingMessage {
    pub message: Payload,
    pub on_reply: ReplyHandler,
    pub on_error: ErrorHandler,
}

/// A binary message handed to the transport, waiting to be resolved.
pub struct PendingData {
    pub data: Vec<u8>,
    pub on_reply: DataReplyHandler,
    pub on_error: ErrorHandler,
}

/// A transfer the dispatcher started.
pub struct StartedTransfer {
    pub kind: TransferKind,
    pub file: Option<PathBuf>,
    pub handle: TransferHandle,
    pub progress: watch::Sender<TransferProgress>,
}

/// Scriptable in-memory session transport.
#[derive(Default)]
pub struct MockTransport {
    pub activated: AtomicBool,
    pub reachable: AtomicBool,
    pub complication_capable: AtomicBool,
    pub outstanding_files: AtomicUsize,
    pub outstanding_user_info: AtomicUsize,
    /// When set, `update_context` fails with this text
    pub context_error: Mutex<Option<String>>,
    pub updated_contexts: Mutex<Vec<Payload>>,
    pub received: Mutex<Option<Payload>>,
    pub pending_messages: Mutex<Vec<PendingMessage>>,
    pub pending_data: Mutex<Vec<PendingData>>,
    pub transfers: Mutex<Vec<StartedTransfer>>,
}

impl MockTransport {
    /// An unactivated transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// An activated, reachable transport.
    pub fn activated() -> Self {
        let transport = Self::default();
        transport.activated.store(true, Ordering::SeqCst);
        transport.reachable.store(true, Ordering::SeqCst);
        transport
    }

    /// Total calls that reached the transport.
    pub fn call_count(&self) -> usize {
        self.updated_contexts.lock().unwrap().len()
            + self.pending_messages.lock().unwrap().len()
            + self.pending_data.lock().unwrap().len()
            + self.transfers.lock().unwrap().len()
    }

    /// Resolve the oldest pending message with a reply.
    pub fn resolve_message(&self, reply: Payload) {
        let pending = self.pending_messages.lock().unwrap().remove(0);
        (pending.on_reply)(reply);
    }

    /// Fail the oldest pending message.
    pub fn fail_message(&self, error: &str) {
        let pending = self.pending_messages.lock().unwrap().remove(0);
        (pending.on_error)(error.to_string());
    }

    /// Resolve the oldest pending binary message with a reply.
    pub fn resolve_data(&self, reply: Vec<u8>) {
        let pending = self.pending_data.lock().unwrap().remove(0);
        (pending.on_reply)(reply);
    }

    /// Fail the oldest pending binary message.
    pub fn fail_data(&self, error: &str) {
        let pending = self.pending_data.lock().unwrap().remove(0);
        (pending.on_error)(error.to_string());
    }

    fn start_transfer(&self, kind: TransferKind, file: Option<PathBuf>) -> TransferHandle {
        let file_name = file
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        let (handle, progress) = TransferHandle::channel(kind, file_name, 4);
        self.transfers.lock().unwrap().push(StartedTransfer {
            kind,
            file,
            handle: handle.clone(),
            progress,
        });
        handle
    }
}

impl SessionTransport for MockTransport {
    fn is_activated(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn update_context(&self, context: Payload) -> Result<()> {
        if let Some(error) = self.context_error.lock().unwrap().clone() {
            return Err(Error::Transport(error));
        }
        self.updated_contexts.lock().unwrap().push(context);
        Ok(())
    }

    fn send_message(&self, message: Payload, on_reply: ReplyHandler, on_error: ErrorHandler) {
        self.pending_messages.lock().unwrap().push(PendingMessage {
            message,
            on_reply,
            on_error,
        });
    }

    fn send_message_data(
        &self,
        data: Vec<u8>,
        on_reply: DataReplyHandler,
        on_error: ErrorHandler,
    ) {
        self.pending_data.lock().unwrap().push(PendingData {
            data,
            on_reply,
            on_error,
        });
    }

    fn transfer_user_info(&self, _user_info: Payload) -> TransferHandle {
        self.start_transfer(TransferKind::UserInfo, None)
    }

    fn transfer_file(&self, file: &Path, _metadata: Payload) -> TransferHandle {
        self.start_transfer(TransferKind::File, Some(file.to_path_buf()))
    }

    fn transfer_complication_user_info(&self, _user_info: Payload) -> TransferHandle {
        self.start_transfer(TransferKind::ComplicationUserInfo, None)
    }

    fn received_context(&self) -> Option<Payload> {
        self.received.lock().unwrap().clone()
    }

    fn outstanding_file_transfers(&self) -> usize {
        self.outstanding_files.load(Ordering::SeqCst)
    }

    fn outstanding_user_info_transfers(&self) -> usize {
        self.outstanding_user_info.load(Ordering::SeqCst)
    }

    fn is_complication_capable(&self) -> bool {
        self.complication_capable.load(Ordering::SeqCst)
    }
}

/// Create a temporary directory for test files.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test file with the given content.
pub fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}
