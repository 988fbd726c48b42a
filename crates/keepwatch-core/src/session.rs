//! Session state machine: one fetch-and-display cycle at a time.

use heapless::{Deque, String};
use log::{debug, warn};

use crate::{
    codec::{self, Inbound, ListChunk, NoteChunk, Request},
    display::DisplayListener,
    fetch::{FetchContext, FetchProgress, ListFetch},
    store::{ItemRecord, ItemStore},
    wire::Message,
};

/// Capacity of the assembled note body.
pub const NOTE_TEXT_BYTES: usize = 480;

/// Requests that can sit queued between handler turns. A message handler
/// emits at most one request; the spare slot absorbs a user selection landing
/// in the same turn.
const OUTBOX_REQUESTS: usize = 2;

/// Top-level presentation mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionMode {
    Browsing,
    ViewingNote,
}

/// Which item store the browsing mode is bound to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActiveList {
    TopLevel,
    Checklist,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SessionState {
    LoadingList,
    ReadyList,
    /// Selection request sent; the reply's discriminant decides whether a
    /// note or a nested checklist comes next.
    AwaitingSelection {
        from: ActiveList,
    },
    LoadingChecklist,
    ReadyChecklist,
    ViewingNote {
        from: ActiveList,
    },
}

/// One fetch-and-display cycle bound to a display listener.
///
/// All mutation happens synchronously inside
/// [`handle_message`](Session::handle_message),
/// [`select_item`](Session::select_item) and [`start`](Session::start);
/// outbound requests are drained by the enclosing application through
/// [`take_request`](Session::take_request).
pub struct Session<D: DisplayListener> {
    display: D,
    items: ItemStore,
    checklist: ItemStore,
    note: String<NOTE_TEXT_BYTES>,
    state: SessionState,
    fetch: ListFetch,
    pending_selection: Option<u8>,
    outbox: Deque<Message, OUTBOX_REQUESTS>,
    tag: u8,
}

impl<D: DisplayListener> Session<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            items: ItemStore::new(),
            checklist: ItemStore::new(),
            note: String::new(),
            state: SessionState::LoadingList,
            fetch: ListFetch::new(FetchContext::TopLevelList),
            pending_selection: None,
            outbox: Deque::new(),
            tag: 0,
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self.state {
            SessionState::ViewingNote { .. } => SessionMode::ViewingNote,
            _ => SessionMode::Browsing,
        }
    }

    /// While loading, selection input is remembered but not acted upon.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            SessionState::LoadingList
                | SessionState::LoadingChecklist
                | SessionState::AwaitingSelection { .. }
        )
    }

    pub fn active_list(&self) -> ActiveList {
        match self.state {
            SessionState::LoadingList | SessionState::ReadyList => ActiveList::TopLevel,
            SessionState::LoadingChecklist | SessionState::ReadyChecklist => ActiveList::Checklist,
            SessionState::AwaitingSelection { from } | SessionState::ViewingNote { from } => from,
        }
    }

    /// Records written to the active list so far. Grows while chunks arrive,
    /// so partial lists render as they load.
    pub fn item_count(&self) -> usize {
        self.active_store().len()
    }

    pub fn item_at(&self, index: usize) -> Option<&ItemRecord> {
        self.active_store().get(index)
    }

    /// Declared total of the active list, once its first chunk arrived.
    pub fn declared_total(&self) -> Option<u8> {
        self.active_store().total()
    }

    pub fn note_text(&self) -> &str {
        self.note.as_str()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn active_store(&self) -> &ItemStore {
        match self.active_list() {
            ActiveList::TopLevel => &self.items,
            ActiveList::Checklist => &self.checklist,
        }
    }
}

mod inbound;
mod lifecycle;
