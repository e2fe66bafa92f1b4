//! In-process loopback transport.
//!
//! Pairs two endpoints over tokio channels so the demo and the
//! integration tests can exercise the full command surface without a
//! radio. Each endpoint owns its event bus, activation flag, received
//! context, outstanding-transfer counters, and an inbox directory for
//! files arriving from the counterpart.
//!
//! Transfers complete asynchronously: the driver task steps the progress
//! stream, hands the data to the peer, then publishes a `finished` record
//! on the sender's bus and a `received` record on the peer's.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::bus::{EventBus, SessionEvent};
use crate::error::{Error, Result};
use crate::payload::{Payload, TimedColor};
use crate::session::{
    DataReplyHandler, ErrorHandler, ReplyHandler, SessionTransport, TransferHandle, TransferKind,
    TransferProgress,
};
use crate::status::{Command, CommandStatus, Phrase};
use crate::TRANSFER_PROGRESS_STEPS;

/// Which side of the pair an endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The phone-side app
    Phone,
    /// The wrist-side companion
    Watch,
}

impl Role {
    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Watch => "watch",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-endpoint settings for [`LoopbackEndpoint::pair`].
pub struct EndpointConfig {
    /// Bus this endpoint publishes its events on
    pub bus: EventBus,
    /// Directory receiving files from the counterpart
    pub inbox: PathBuf,
    /// Whether the counterpart accepts complication updates from this side
    pub complication_capable: bool,
}

/// What actually crosses between the endpoints.
enum WireFrame {
    Context(Payload),
    Message(Payload, oneshot::Sender<Payload>),
    MessageData(Vec<u8>, oneshot::Sender<Vec<u8>>),
    UserInfo { payload: Payload, complication: bool },
    File { name: String, bytes: Vec<u8>, metadata: Payload },
}

struct EndpointShared {
    role: Role,
    bus: EventBus,
    activated: AtomicBool,
    received_context: Mutex<Option<Payload>>,
    outstanding_files: AtomicUsize,
    outstanding_user_info: AtomicUsize,
    inbox: PathBuf,
    complication_capable: bool,
}

/// One side of an in-process session pair.
pub struct LoopbackEndpoint {
    shared: Arc<EndpointShared>,
    peer: Arc<EndpointShared>,
    to_peer: mpsc::UnboundedSender<WireFrame>,
    step_delay: Duration,
}

impl LoopbackEndpoint {
    /// Create a connected phone/watch pair.
    ///
    /// Spawns one receive task per endpoint, so this must run inside a
    /// tokio runtime. Inbox directories are created if missing.
    pub fn pair(
        phone: EndpointConfig,
        watch: EndpointConfig,
        step_delay: Duration,
    ) -> Result<(Arc<Self>, Arc<Self>)> {
        std::fs::create_dir_all(&phone.inbox)?;
        std::fs::create_dir_all(&watch.inbox)?;

        let phone_shared = Arc::new(EndpointShared {
            role: Role::Phone,
            bus: phone.bus,
            activated: AtomicBool::new(false),
            received_context: Mutex::new(None),
            outstanding_files: AtomicUsize::new(0),
            outstanding_user_info: AtomicUsize::new(0),
            inbox: phone.inbox,
            complication_capable: phone.complication_capable,
        });
        let watch_shared = Arc::new(EndpointShared {
            role: Role::Watch,
            bus: watch.bus,
            activated: AtomicBool::new(false),
            received_context: Mutex::new(None),
            outstanding_files: AtomicUsize::new(0),
            outstanding_user_info: AtomicUsize::new(0),
            inbox: watch.inbox,
            complication_capable: watch.complication_capable,
        });

        let (to_watch, watch_rx) = mpsc::unbounded_channel();
        let (to_phone, phone_rx) = mpsc::unbounded_channel();

        tokio::spawn(receive_loop(Arc::clone(&phone_shared), phone_rx));
        tokio::spawn(receive_loop(Arc::clone(&watch_shared), watch_rx));

        let phone_endpoint = Arc::new(Self {
            shared: Arc::clone(&phone_shared),
            peer: Arc::clone(&watch_shared),
            to_peer: to_watch,
            step_delay,
        });
        let watch_endpoint = Arc::new(Self {
            shared: watch_shared,
            peer: phone_shared,
            to_peer: to_phone,
            step_delay,
        });
        Ok((phone_endpoint, watch_endpoint))
    }

    /// Which side this endpoint plays.
    #[must_use]
    pub fn role(&self) -> Role {
        self.shared.role
    }

    /// The bus this endpoint publishes on.
    #[must_use]
    pub fn bus(&self) -> EventBus {
        self.shared.bus.clone()
    }

    /// Directory where files from the counterpart land.
    #[must_use]
    pub fn inbox(&self) -> &Path {
        &self.shared.inbox
    }

    /// Complete activation for this side.
    ///
    /// Publishes `ActivationCompleted` on this endpoint's bus; once both
    /// sides are up, each side also sees `ReachabilityChanged`.
    pub fn activate(&self) {
        self.shared.activated.store(true, Ordering::SeqCst);
        tracing::info!(role = %self.shared.role, "session activated");
        self.shared.bus.publish(&SessionEvent::ActivationCompleted);

        if self.peer.activated.load(Ordering::SeqCst) {
            self.shared.bus.publish(&SessionEvent::ReachabilityChanged);
            self.peer.bus.publish(&SessionEvent::ReachabilityChanged);
        }
    }

    fn spawn_transfer(
        &self,
        kind: TransferKind,
        payload: Payload,
        file: Option<PathBuf>,
    ) -> TransferHandle {
        let file_name = file
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned());
        let (handle, progress_tx) =
            TransferHandle::channel(kind, file_name.clone(), TRANSFER_PROGRESS_STEPS);

        let counter = match kind {
            TransferKind::File => &self.shared.outstanding_files,
            TransferKind::UserInfo | TransferKind::ComplicationUserInfo => {
                &self.shared.outstanding_user_info
            }
        };
        counter.fetch_add(1, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let to_peer = self.to_peer.clone();
        let step_delay = self.step_delay;
        let driver_handle = handle.clone();
        tokio::spawn(async move {
            let command = kind.command();
            let digest = payload.timed_color();
            let counter = match kind {
                TransferKind::File => &shared.outstanding_files,
                TransferKind::UserInfo | TransferKind::ComplicationUserInfo => {
                    &shared.outstanding_user_info
                }
            };

            let frame = match (kind, file) {
                (TransferKind::File, Some(path)) => match tokio::fs::read(&path).await {
                    Ok(bytes) => WireFrame::File {
                        name: file_name.unwrap_or_default(),
                        bytes,
                        metadata: payload,
                    },
                    Err(e) => {
                        counter.fetch_sub(1, Ordering::SeqCst);
                        let status = CommandStatus::failed(
                            command,
                            format!("cannot read {}: {e}", path.display()),
                        )
                        .with_timed_color(digest);
                        shared.bus.publish(&SessionEvent::DataFlowed(status));
                        return;
                    }
                },
                _ => WireFrame::UserInfo {
                    payload,
                    complication: kind == TransferKind::ComplicationUserInfo,
                },
            };

            for step in 1..=TRANSFER_PROGRESS_STEPS {
                tokio::time::sleep(step_delay).await;
                let _ = progress_tx.send(TransferProgress {
                    completed: step,
                    total: TRANSFER_PROGRESS_STEPS,
                });
            }

            counter.fetch_sub(1, Ordering::SeqCst);

            if to_peer.send(frame).is_err() {
                let status = CommandStatus::failed(command, "counterpart session is gone")
                    .with_timed_color(digest);
                shared.bus.publish(&SessionEvent::DataFlowed(status));
                return;
            }

            let mut status = CommandStatus::new(command, Phrase::Finished).with_timed_color(digest);
            status.transfer = Some(driver_handle);
            shared.bus.publish(&SessionEvent::DataFlowed(status));
        });

        handle
    }
}

impl SessionTransport for LoopbackEndpoint {
    fn is_activated(&self) -> bool {
        self.shared.activated.load(Ordering::SeqCst)
    }

    fn is_reachable(&self) -> bool {
        self.is_activated() && self.peer.activated.load(Ordering::SeqCst)
    }

    fn update_context(&self, context: Payload) -> Result<()> {
        self.to_peer
            .send(WireFrame::Context(context))
            .map_err(|_| Error::Transport("counterpart session is gone".into()))
    }

    fn send_message(&self, message: Payload, on_reply: ReplyHandler, on_error: ErrorHandler) {
        if !self.is_reachable() {
            on_error("counterpart is not reachable".into());
            return;
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.to_peer.send(WireFrame::Message(message, reply_tx)).is_err() {
            on_error("counterpart session is gone".into());
            return;
        }
        tokio::spawn(async move {
            match reply_rx.await {
                Ok(reply) => on_reply(reply),
                Err(_) => on_error("no reply from counterpart".into()),
            }
        });
    }

    fn send_message_data(
        &self,
        data: Vec<u8>,
        on_reply: DataReplyHandler,
        on_error: ErrorHandler,
    ) {
        if !self.is_reachable() {
            on_error("counterpart is not reachable".into());
            return;
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .to_peer
            .send(WireFrame::MessageData(data, reply_tx))
            .is_err()
        {
            on_error("counterpart session is gone".into());
            return;
        }
        tokio::spawn(async move {
            match reply_rx.await {
                Ok(reply) => on_reply(reply),
                Err(_) => on_error("no reply from counterpart".into()),
            }
        });
    }

    fn transfer_user_info(&self, user_info: Payload) -> TransferHandle {
        self.spawn_transfer(TransferKind::UserInfo, user_info, None)
    }

    fn transfer_file(&self, file: &Path, metadata: Payload) -> TransferHandle {
        self.spawn_transfer(TransferKind::File, metadata, Some(file.to_path_buf()))
    }

    fn transfer_complication_user_info(&self, user_info: Payload) -> TransferHandle {
        self.spawn_transfer(TransferKind::ComplicationUserInfo, user_info, None)
    }

    fn received_context(&self) -> Option<Payload> {
        self.shared
            .received_context
            .lock()
            .expect("context lock poisoned")
            .clone()
    }

    fn outstanding_file_transfers(&self) -> usize {
        self.shared.outstanding_files.load(Ordering::SeqCst)
    }

    fn outstanding_user_info_transfers(&self) -> usize {
        self.shared.outstanding_user_info.load(Ordering::SeqCst)
    }

    fn is_complication_capable(&self) -> bool {
        self.shared.complication_capable
    }
}

/// Drain frames arriving from the counterpart and surface them on the bus.
async fn receive_loop(shared: Arc<EndpointShared>, mut rx: mpsc::UnboundedReceiver<WireFrame>) {
    while let Some(frame) = rx.recv().await {
        match frame {
            WireFrame::Context(payload) => {
                let digest = payload.timed_color();
                *shared
                    .received_context
                    .lock()
                    .expect("context lock poisoned") = Some(payload);
                publish_received(&shared, Command::UpdateContext, digest);
            }
            WireFrame::Message(payload, reply_tx) => {
                publish_received(&shared, Command::SendMessage, payload.timed_color());
                let _ = reply_tx.send(Payload::timed_now());
            }
            WireFrame::MessageData(bytes, reply_tx) => {
                publish_received(&shared, Command::SendMessageData, TimedColor::from_bytes(&bytes));
                let _ = reply_tx.send(Payload::timed_now().to_bytes());
            }
            WireFrame::UserInfo { payload, complication } => {
                let command = if complication {
                    Command::TransferComplicationUserInfo
                } else {
                    Command::TransferUserInfo
                };
                publish_received(&shared, command, payload.timed_color());
            }
            WireFrame::File { name, bytes, metadata } => {
                let target = shared.inbox.join(&name);
                match tokio::fs::write(&target, &bytes).await {
                    Ok(()) => {
                        tracing::info!(role = %shared.role, file = %name, "file received");
                        publish_received(&shared, Command::TransferFile, metadata.timed_color());
                    }
                    Err(e) => {
                        tracing::warn!(role = %shared.role, file = %name, error = %e, "failed to store received file");
                    }
                }
            }
        }
    }
}

fn publish_received(shared: &EndpointShared, command: Command, digest: Option<TimedColor>) {
    let status = CommandStatus::new(command, Phrase::Received).with_timed_color(digest);
    shared.bus.publish(&SessionEvent::DataFlowed(status));
}
