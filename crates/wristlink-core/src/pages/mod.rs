//! Presentation adapters.
//!
//! Two ways to watch the same stream of status records:
//!
//! - [`PageCoordinator`] models the wrist interface: one page per command
//!   in a registry owned by the coordinator. A record for the visible
//!   page updates it in place; a record for any other page makes that
//!   page current and updates it, so every page reflects the latest state
//!   whenever the user navigates to it.
//! - [`FlowLog`] models the phone interface: an append-only log of
//!   rendered status lines.
//!
//! Rendering is pure; the coordinator queries the transport for
//! outstanding-transfer counts at render time.

use std::sync::{Arc, Mutex};

use crate::bus::SessionEvent;
use crate::delivery::DeliveryHandle;
use crate::observers::TransferObservers;
use crate::payload::StatusColor;
use crate::session::{SessionTransport, TransferProgress};
use crate::status::{Command, CommandStatus, Phrase};

/// Render the status line for one record.
///
/// `outstanding` is the transport's current outstanding-transfer count
/// for the record's command (zero for non-transfer commands).
#[must_use]
pub fn render_status_line(status: &CommandStatus, outstanding: usize) -> String {
    if let Some(message) = &status.error_message {
        return format!("! {message}");
    }
    let Some(timed_color) = &status.timed_color else {
        return String::new();
    };

    let counts_outstanding = matches!(
        status.command,
        Command::TransferFile | Command::TransferUserInfo
    ) && outstanding > 0;
    if counts_outstanding {
        match status.phrase {
            Phrase::Transferring => {
                return format!(
                    "{} at\n{}\nOutstanding: {outstanding}\nTap to view",
                    status.phrase, timed_color.timestamp
                );
            }
            Phrase::Finished => {
                return format!("Outstanding: {outstanding}\nTap to view");
            }
            _ => {}
        }
    }

    format!("{} at\n{}", status.phrase, timed_color.timestamp)
}

/// Render a progress line for an observed file transfer.
#[must_use]
pub fn render_progress_line(phrase: Phrase, file_name: &str, progress: TransferProgress) -> String {
    format!("{phrase}\n{file_name}\n{progress}")
}

/// Snapshot of one page, ready to paint.
#[derive(Debug, Clone)]
pub struct PageView {
    /// The command this page is bound to
    pub command: Command,
    /// Rendered status text (empty until data flows)
    pub status_line: String,
    /// Color of the last payload that flowed through this page
    pub color: Option<StatusColor>,
    /// Whether this page is the visible one
    pub is_current: bool,
}

struct Page {
    command: Command,
    line: String,
    color: Option<StatusColor>,
}

struct PageTable {
    current: Command,
    pages: Vec<Page>,
}

impl PageTable {
    fn page_mut(&mut self, command: Command) -> &mut Page {
        self.pages
            .iter_mut()
            .find(|page| page.command == command)
            .expect("every command has a page")
    }
}

/// Routes status records to command-bound pages.
pub struct PageCoordinator {
    transport: Arc<dyn SessionTransport>,
    observers: TransferObservers,
    table: Arc<Mutex<PageTable>>,
}

impl PageCoordinator {
    /// Create a coordinator with one idle page per command.
    ///
    /// Progress updates for observed transfers are marshaled through
    /// `delivery`; drain that queue from the same loop that feeds
    /// [`Self::handle_event`].
    #[must_use]
    pub fn new(transport: Arc<dyn SessionTransport>, delivery: DeliveryHandle) -> Self {
        let pages = Command::ALL
            .iter()
            .map(|&command| Page {
                command,
                line: String::new(),
                color: None,
            })
            .collect();
        Self {
            transport,
            observers: TransferObservers::new(delivery),
            table: Arc::new(Mutex::new(PageTable {
                current: Command::ALL[0],
                pages,
            })),
        }
    }

    /// The command bound to the currently visible page.
    #[must_use]
    pub fn current(&self) -> Command {
        self.table.lock().expect("page table lock poisoned").current
    }

    /// Whether the counterpart is reachable.
    ///
    /// Reachability is only consulted once the session is activated.
    #[must_use]
    pub fn is_counterpart_reachable(&self) -> bool {
        self.transport.is_activated() && self.transport.is_reachable()
    }

    /// Feed one bus event through the coordinator.
    pub fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::DataFlowed(status) => self.route(status),
            SessionEvent::ActivationCompleted | SessionEvent::ReachabilityChanged => {
                tracing::debug!(
                    activated = self.transport.is_activated(),
                    reachable = self.is_counterpart_reachable(),
                    "session lifecycle changed"
                );
            }
        }
    }

    /// The user navigated to a page; refresh it from transport state.
    ///
    /// The context page re-reads the received application context;
    /// transfer pages re-read their outstanding counts.
    pub fn activate_page(&self, command: Command) {
        {
            let mut table = self.table.lock().expect("page table lock poisoned");
            table.current = command;
        }
        match command {
            Command::UpdateContext => {
                if let Some(context) = self.transport.received_context() {
                    if !context.is_empty() {
                        let status = CommandStatus::new(command, Phrase::Received)
                            .with_timed_color(context.timed_color());
                        self.update_page(&status);
                    }
                }
            }
            Command::TransferFile => {
                let outstanding = self.transport.outstanding_file_transfers();
                if outstanding > 0 {
                    self.set_line(command, format!("Outstanding: {outstanding}\nTap to view"));
                }
            }
            Command::TransferUserInfo => {
                let outstanding = self.transport.outstanding_user_info_transfers();
                if outstanding > 0 {
                    self.set_line(command, format!("Outstanding: {outstanding}\nTap to view"));
                }
            }
            _ => {}
        }
    }

    /// Snapshot every page for painting.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PageView> {
        let table = self.table.lock().expect("page table lock poisoned");
        table
            .pages
            .iter()
            .map(|page| PageView {
                command: page.command,
                status_line: page.line.clone(),
                color: page.color,
                is_current: page.command == table.current,
            })
            .collect()
    }

    fn route(&self, status: &CommandStatus) {
        {
            let mut table = self.table.lock().expect("page table lock poisoned");
            if table.current != status.command {
                table.current = status.command;
            }
        }
        self.update_page(status);
    }

    fn update_page(&self, status: &CommandStatus) {
        let outstanding = match status.command {
            Command::TransferFile => self.transport.outstanding_file_transfers(),
            Command::TransferUserInfo => self.transport.outstanding_user_info_transfers(),
            _ => 0,
        };
        let line = render_status_line(status, outstanding);
        {
            let mut table = self.table.lock().expect("page table lock poisoned");
            let page = table.page_mut(status.command);
            page.line = line;
            if let Some(timed_color) = &status.timed_color {
                page.color = Some(timed_color.color);
            }
        }

        // Follow file-transfer progress while it flows; stop when it ends.
        if status.command == Command::TransferFile {
            if let Some(handle) = &status.transfer {
                match status.phrase {
                    Phrase::Transferring => {
                        let table = Arc::clone(&self.table);
                        let phrase = status.phrase;
                        let file_name = handle.file_name().unwrap_or("file").to_string();
                        self.observers.observe(handle, move |progress| {
                            let mut table = table.lock().expect("page table lock poisoned");
                            table.page_mut(Command::TransferFile).line =
                                render_progress_line(phrase, &file_name, progress);
                        });
                    }
                    Phrase::Finished => self.observers.unobserve(handle),
                    _ => {}
                }
            }
        }
    }

    fn set_line(&self, command: Command, line: String) {
        let mut table = self.table.lock().expect("page table lock poisoned");
        table.page_mut(command).line = line;
    }
}

/// Append-only log of rendered status lines (the phone interface).
#[derive(Debug, Default)]
pub struct FlowLog {
    lines: Vec<String>,
}

impl FlowLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rendered line for a record and return it.
    ///
    /// Records without an error and without a payload digest render
    /// nothing and return `None`.
    pub fn record(&mut self, status: &CommandStatus) -> Option<&str> {
        let line = if let Some(message) = &status.error_message {
            format!("! {}...{message}", status.command)
        } else if let Some(timed_color) = &status.timed_color {
            format!("#{}...\n{} at {}", status.command, status.phrase, timed_color.timestamp)
        } else {
            return None;
        };
        self.lines.push(line);
        self.lines.last().map(String::as_str)
    }

    /// Every line recorded so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Discard all recorded lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery;
    use crate::error::Result;
    use crate::payload::Payload;
    use crate::session::{
        DataReplyHandler, ErrorHandler, ReplyHandler, TransferHandle, TransferKind,
    };

    fn timed_status(command: Command, phrase: Phrase) -> CommandStatus {
        CommandStatus::new(command, phrase).with_timed_color(Payload::timed_now().timed_color())
    }

    /// Transport stub with fixed counts; never actually called asynchronously.
    #[derive(Default)]
    struct StubTransport {
        files_outstanding: usize,
        user_info_outstanding: usize,
        context: Option<Payload>,
    }

    impl SessionTransport for StubTransport {
        fn is_activated(&self) -> bool {
            true
        }
        fn is_reachable(&self) -> bool {
            true
        }
        fn update_context(&self, _context: Payload) -> Result<()> {
            Ok(())
        }
        fn send_message(&self, _message: Payload, _on_reply: ReplyHandler, _on_error: ErrorHandler) {}
        fn send_message_data(
            &self,
            _data: Vec<u8>,
            _on_reply: DataReplyHandler,
            _on_error: ErrorHandler,
        ) {
        }
        fn transfer_user_info(&self, _user_info: Payload) -> TransferHandle {
            TransferHandle::channel(TransferKind::UserInfo, None, 4).0
        }
        fn transfer_file(&self, _file: &std::path::Path, _metadata: Payload) -> TransferHandle {
            TransferHandle::channel(TransferKind::File, None, 4).0
        }
        fn transfer_complication_user_info(&self, _user_info: Payload) -> TransferHandle {
            TransferHandle::channel(TransferKind::ComplicationUserInfo, None, 4).0
        }
        fn received_context(&self) -> Option<Payload> {
            self.context.clone()
        }
        fn outstanding_file_transfers(&self) -> usize {
            self.files_outstanding
        }
        fn outstanding_user_info_transfers(&self) -> usize {
            self.user_info_outstanding
        }
        fn is_complication_capable(&self) -> bool {
            false
        }
    }

    fn coordinator_over(transport: StubTransport) -> PageCoordinator {
        let (handle, _queue) = delivery::channel();
        PageCoordinator::new(Arc::new(transport), handle)
    }

    #[test]
    fn test_routing_makes_bound_page_current() {
        let coordinator = coordinator_over(StubTransport::default());
        assert_eq!(coordinator.current(), Command::UpdateContext);

        let status = timed_status(Command::SendMessageData, Phrase::Sent);
        coordinator.handle_event(&SessionEvent::DataFlowed(status));

        assert_eq!(coordinator.current(), Command::SendMessageData);
        let snapshot = coordinator.snapshot();
        let page = snapshot
            .iter()
            .find(|page| page.command == Command::SendMessageData)
            .unwrap();
        assert!(page.is_current);
        assert!(page.status_line.starts_with("sent at\n"));
        assert!(page.color.is_some());

        // Other pages stay idle but keep their slots.
        let idle = snapshot
            .iter()
            .find(|page| page.command == Command::DeleteData)
            .unwrap();
        assert!(idle.status_line.is_empty());
    }

    #[test]
    fn test_update_in_place_for_current_page() {
        let coordinator = coordinator_over(StubTransport::default());
        coordinator.handle_event(&SessionEvent::DataFlowed(timed_status(
            Command::SendMessage,
            Phrase::Sent,
        )));
        coordinator.handle_event(&SessionEvent::DataFlowed(timed_status(
            Command::SendMessage,
            Phrase::Replied,
        )));

        assert_eq!(coordinator.current(), Command::SendMessage);
        let snapshot = coordinator.snapshot();
        let page = snapshot
            .iter()
            .find(|page| page.command == Command::SendMessage)
            .unwrap();
        assert!(page.status_line.starts_with("replied at\n"));
    }

    #[test]
    fn test_activate_page_shows_outstanding_backlog() {
        let coordinator = coordinator_over(StubTransport {
            files_outstanding: 2,
            ..StubTransport::default()
        });

        coordinator.activate_page(Command::TransferFile);

        assert_eq!(coordinator.current(), Command::TransferFile);
        let snapshot = coordinator.snapshot();
        let page = snapshot
            .iter()
            .find(|page| page.command == Command::TransferFile)
            .unwrap();
        assert_eq!(page.status_line, "Outstanding: 2\nTap to view");
    }

    #[test]
    fn test_activate_page_restores_received_context() {
        let coordinator = coordinator_over(StubTransport {
            context: Some(Payload::timed_now()),
            ..StubTransport::default()
        });

        coordinator.activate_page(Command::UpdateContext);

        let snapshot = coordinator.snapshot();
        let page = snapshot
            .iter()
            .find(|page| page.command == Command::UpdateContext)
            .unwrap();
        assert!(page.status_line.starts_with("received at\n"));
    }

    #[test]
    fn test_render_plain_status() {
        let status = timed_status(Command::SendMessage, Phrase::Sent);
        let line = render_status_line(&status, 0);
        assert!(line.starts_with("sent at\n"));
    }

    #[test]
    fn test_render_error_wins() {
        let status = CommandStatus::failed(Command::UpdateContext, "session not activated");
        assert_eq!(render_status_line(&status, 0), "! session not activated");
    }

    #[test]
    fn test_render_outstanding_while_transferring() {
        let status = timed_status(Command::TransferFile, Phrase::Transferring);
        let line = render_status_line(&status, 3);
        assert!(line.starts_with("transferring at\n"));
        assert!(line.ends_with("\nOutstanding: 3\nTap to view"));
    }

    #[test]
    fn test_render_outstanding_when_finished() {
        let status = timed_status(Command::TransferFile, Phrase::Finished);
        assert_eq!(render_status_line(&status, 3), "Outstanding: 3\nTap to view");
    }

    #[test]
    fn test_render_no_outstanding_for_non_transfer_commands() {
        let status = timed_status(Command::SendMessage, Phrase::Sent);
        let line = render_status_line(&status, 5);
        assert!(!line.contains("Outstanding"));
    }

    #[test]
    fn test_render_idle_page_is_blank() {
        let status = CommandStatus::new(Command::DeleteData, Phrase::Finished);
        assert_eq!(render_status_line(&status, 0), "");
    }

    #[test]
    fn test_progress_line() {
        let progress = TransferProgress { completed: 2, total: 4 };
        assert_eq!(
            render_progress_line(Phrase::Transferring, "voice.wav", progress),
            "transferring\nvoice.wav\n50% completed"
        );
    }

    #[test]
    fn test_flow_log_formats() {
        let mut log = FlowLog::new();

        let error = CommandStatus::failed(Command::SendMessage, "counterpart is not reachable");
        assert_eq!(
            log.record(&error),
            Some("! sendMessage...counterpart is not reachable")
        );

        let sent = timed_status(Command::SendMessage, Phrase::Sent);
        let line = log.record(&sent).unwrap();
        assert!(line.starts_with("#sendMessage...\nsent at "));

        let silent = CommandStatus::new(Command::DeleteData, Phrase::Finished);
        assert_eq!(log.record(&silent), None);
        assert_eq!(log.lines().len(), 2);

        log.clear();
        assert!(log.lines().is_empty());
    }
}
