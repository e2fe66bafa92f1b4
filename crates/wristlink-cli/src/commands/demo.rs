//! The scripted phone/watch exchange.
//!
//! Builds a loopback session pair, points a dispatcher at each side, and
//! walks through every command while the two user interfaces - the
//! phone's flow log and the watch's paged status view - consume the
//! published records.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{sleep_until, Instant};

use wristlink_core::bus::{EventBus, EventStream, SessionEvent};
use wristlink_core::commands::{Capabilities, CommandDispatcher};
use wristlink_core::delivery::{self, DeliveryQueue};
use wristlink_core::pages::{FlowLog, PageCoordinator};
use wristlink_core::payload::Payload;
use wristlink_core::session::loopback::{EndpointConfig, LoopbackEndpoint};
use wristlink_core::session::SessionTransport;
use wristlink_core::status::Command;

use super::DemoArgs;
use crate::ui;

/// How long each script step waits for events to settle.
const SETTLE: Duration = Duration::from_millis(400);

/// Run the demo command.
pub async fn run(args: DemoArgs) -> Result<()> {
    let config = super::load_config();
    let step = args
        .step_ms
        .map_or(config.demo.transfer_step(), Duration::from_millis);
    let root = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => config.data_dir().context("failed to resolve data directory")?,
    }
    .join("demo");

    let phone_container = root.join("phone/container");
    let watch_container = root.join("watch/container");
    std::fs::create_dir_all(&phone_container)?;
    std::fs::create_dir_all(&watch_container)?;

    // Stage what each side will transfer.
    let voice_memo = phone_container.join("voice-memo.wav");
    std::fs::write(&voice_memo, b"fake pcm data")?;
    std::fs::write(watch_container.join("workout-log.txt"), b"3km, 18:12")?;

    let phone_bus = EventBus::new();
    let watch_bus = EventBus::new();
    let phone_events = phone_bus.subscribe();
    let watch_events = watch_bus.subscribe();

    let (phone, watch) = LoopbackEndpoint::pair(
        EndpointConfig {
            bus: phone_bus.clone(),
            inbox: root.join("phone/inbox"),
            complication_capable: true,
        },
        EndpointConfig {
            bus: watch_bus.clone(),
            inbox: root.join("watch/inbox"),
            complication_capable: false,
        },
        step,
    )
    .context("failed to pair loopback endpoints")?;

    let phone_dispatcher = CommandDispatcher::new(
        Arc::clone(&phone) as Arc<dyn SessionTransport>,
        phone_bus,
        Capabilities::detect(),
        &phone_container,
    );
    let watch_dispatcher = CommandDispatcher::new(
        Arc::clone(&watch) as Arc<dyn SessionTransport>,
        watch_bus,
        Capabilities::none(),
        &watch_container,
    );

    let (watch_delivery, watch_queue) = delivery::channel();
    let mut screens = Screens {
        phone_log: FlowLog::new(),
        watch_pages: PageCoordinator::new(
            Arc::clone(&watch) as Arc<dyn SessionTransport>,
            watch_delivery,
        ),
        watch_queue,
        phone_events,
        watch_events,
        last_watch_line: String::new(),
    };

    ui::section("before activation");
    phone_dispatcher.update_context(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("activation");
    phone.activate();
    watch.activate();
    screens.pump(SETTLE).await;
    println!(
        "reachable: phone={} watch={}",
        phone.is_reachable(),
        watch.is_reachable()
    );

    ui::section("updateContext");
    phone_dispatcher.update_context(Payload::timed_now());
    screens.pump(SETTLE).await;
    screens.watch_pages.activate_page(Command::UpdateContext);

    ui::section("sendMessage");
    phone_dispatcher.send_message(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("sendMessageData");
    phone_dispatcher.send_message_data(Payload::timed_now().to_bytes());
    screens.pump(SETTLE).await;

    ui::section("transferUserInfo");
    phone_dispatcher.transfer_user_info(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("transferFile (phone -> watch)");
    phone_dispatcher.transfer_file(&voice_memo, Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("transferFile (watch outbox -> phone)");
    watch_dispatcher.transfer_outbox(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("transferComplicationUserInfo (phone)");
    phone_dispatcher.transfer_complication_user_info(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("transferComplicationUserInfo (watch build, unsupported)");
    watch_dispatcher.transfer_complication_user_info(Payload::timed_now());
    screens.pump(SETTLE).await;

    ui::section("deleteData (watch container)");
    list_dir("before", &watch_container);
    watch_dispatcher.delete_data();
    screens.pump(SETTLE).await;
    list_dir("after", &watch_container);

    ui::section("watch pages");
    ui::render_pages(&screens.watch_pages.snapshot());

    ui::section("inboxes");
    list_dir("phone", phone.inbox());
    list_dir("watch", watch.inbox());

    if args.keep_files {
        println!("\nfiles kept under {}", root.display());
    } else {
        let _ = std::fs::remove_dir_all(&root);
    }
    Ok(())
}

/// What a single pump iteration yielded.
enum Pumped {
    Quiet,
    Phone(SessionEvent),
    Watch(SessionEvent),
    Delivered,
}

/// The two user interfaces and their event plumbing.
struct Screens {
    phone_log: FlowLog,
    watch_pages: PageCoordinator,
    watch_queue: DeliveryQueue,
    phone_events: EventStream,
    watch_events: EventStream,
    last_watch_line: String,
}

impl Screens {
    /// Drain events from both endpoints until things go quiet.
    async fn pump(&mut self, quiet: Duration) {
        let deadline = Instant::now() + quiet;
        loop {
            let step = tokio::select! {
                () = sleep_until(deadline) => Pumped::Quiet,
                event = self.phone_events.next() => {
                    event.map_or(Pumped::Quiet, Pumped::Phone)
                }
                event = self.watch_events.next() => {
                    event.map_or(Pumped::Quiet, Pumped::Watch)
                }
                ran = self.watch_queue.run_next() => {
                    if ran { Pumped::Delivered } else { Pumped::Quiet }
                }
            };
            match step {
                Pumped::Quiet => break,
                Pumped::Phone(event) => self.on_phone_event(&event),
                Pumped::Watch(event) => self.on_watch_event(&event),
                Pumped::Delivered => {}
            }
        }
        self.print_watch_page();
    }

    fn on_phone_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::DataFlowed(status) => {
                if let Some(line) = self.phone_log.record(status) {
                    ui::endpoint_lines("phone", line);
                }
            }
            SessionEvent::ActivationCompleted => ui::endpoint_lines("phone", "session activated"),
            SessionEvent::ReachabilityChanged => {
                ui::endpoint_lines("phone", "reachability changed");
            }
        }
    }

    fn on_watch_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ActivationCompleted => ui::endpoint_lines("watch", "session activated"),
            SessionEvent::ReachabilityChanged => {
                ui::endpoint_lines("watch", "reachability changed");
            }
            SessionEvent::DataFlowed(_) => {}
        }
        self.watch_pages.handle_event(event);
    }

    /// Print the visible watch page whenever its text changes.
    fn print_watch_page(&mut self) {
        let current = self.watch_pages.current();
        let Some(page) = self
            .watch_pages
            .snapshot()
            .into_iter()
            .find(|page| page.is_current)
        else {
            return;
        };
        if page.status_line.is_empty() {
            return;
        }
        let rendered = format!("{current}\n{}", page.status_line);
        if rendered != self.last_watch_line {
            ui::endpoint_lines("watch", &rendered);
            self.last_watch_line = rendered;
        }
    }
}

fn list_dir(label: &str, dir: &Path) {
    let names = read_names(dir);
    if names.is_empty() {
        println!("{label}: (empty)");
    } else {
        println!("{label}: {}", names.join(", "));
    }
}

fn read_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_names_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        assert_eq!(read_names(dir.path()), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_read_names_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_names(&dir.path().join("missing")).is_empty());
    }
}
