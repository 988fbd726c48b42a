//! Host-side demo: drives a sync session against a scripted in-memory host.
//!
//! Run with `RUST_LOG=debug` to watch the request/chunk exchange.

use keepwatch_core::{
    display::DisplayListener,
    session::{Session, SessionMode},
    store::ItemKind,
};
use log::info;

use host_fixture::ScriptedHost;

#[path = "main/host_fixture.rs"]
mod host_fixture;

struct ConsoleDisplay;

impl DisplayListener for ConsoleDisplay {
    fn on_store_reset(&mut self) {
        info!("display: store reset");
    }

    fn on_items_available(&mut self, items: core::ops::Range<usize>) {
        info!("display: rows {}..{} ready", items.start, items.end);
    }

    fn on_fetch_complete(&mut self) {
        info!("display: fetch complete");
    }

    fn on_mode_changed(&mut self, mode: SessionMode) {
        info!("display: mode {mode:?}");
    }
}

/// Exchange messages until the session has nothing left to ask. Each reply
/// is fed back in before the next request is taken, the same
/// one-message-at-a-time cadence the real channel has.
fn pump(session: &mut Session<ConsoleDisplay>, host: &mut ScriptedHost) {
    while let Some(request) = session.take_request() {
        match host.answer(&request) {
            Some(reply) => session.handle_message(&reply),
            None => info!("host: request left unanswered"),
        }
    }
}

fn render(session: &Session<ConsoleDisplay>) {
    match session.mode() {
        SessionMode::ViewingNote => {
            println!("--- note ---");
            println!("{}", session.note_text());
        }
        SessionMode::Browsing => {
            let suffix = if session.is_loading() { " (loading)" } else { "" };
            println!("--- {} items{suffix} ---", session.item_count());
            for index in 0..session.item_count() {
                let Some(record) = session.item_at(index) else {
                    continue;
                };
                let marker = match record.kind {
                    ItemKind::NestedList => ">",
                    ItemKind::Note if record.checked => "x",
                    ItemKind::Note => " ",
                };
                println!("[{marker}] {}", record.label.as_str());
            }
        }
    }
}

fn main() {
    env_logger::init();

    let mut host = ScriptedHost::new();
    let mut session = Session::new(ConsoleDisplay);

    // Open the top-level list and pick a row before it finished loading;
    // the deferred pick fires on its own once the list completes.
    session.start();
    session.select_item(1);
    pump(&mut session, &mut host);
    render(&session);

    // The pick resolved into a nested checklist. Toggle its first entry;
    // the host serves the refreshed list and the session refetches it.
    session.select_item(0);
    pump(&mut session, &mut host);
    render(&session);

    // Back out to the top-level list, then read a plain note.
    session.start();
    pump(&mut session, &mut host);
    session.select_item(0);
    pump(&mut session, &mut host);
    render(&session);
}
