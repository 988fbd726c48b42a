use super::*;

impl<D: DisplayListener> Session<D> {
    /// Feed one raw message from the transport. Runs to completion before
    /// the next message is processed; every failure is absorbed here and
    /// surfaces, at most, as a session still loading.
    pub fn handle_message(&mut self, message: &Message) {
        if let Some(tag) = codec::session_tag(message) {
            if tag != self.tag {
                warn!("session: stale reply tag={tag} current={}, dropped", self.tag);
                return;
            }
        }
        match codec::decode_chunk(message) {
            Ok(Inbound::List(chunk)) => self.handle_list_chunk(&chunk),
            Ok(Inbound::Note(chunk)) => self.handle_note_chunk(&chunk),
            Err(err) => warn!("session: undecodable message {err:?}, dropped"),
        }
    }

    fn handle_list_chunk(&mut self, chunk: &ListChunk) {
        match self.state {
            SessionState::LoadingList => self.apply_list_chunk(chunk, ActiveList::TopLevel),
            SessionState::LoadingChecklist => self.apply_list_chunk(chunk, ActiveList::Checklist),
            SessionState::AwaitingSelection { .. } => {
                // The selection resolved to a nested checklist; its first
                // chunk seeds a fresh fetch against the second store.
                self.checklist.reset();
                self.fetch = ListFetch::new(FetchContext::Checklist);
                self.state = SessionState::LoadingChecklist;
                self.display.on_store_reset();
                self.apply_list_chunk(chunk, ActiveList::Checklist);
            }
            SessionState::ReadyList | SessionState::ReadyChecklist | SessionState::ViewingNote { .. } => {
                warn!(
                    "session: list chunk outside a fetch start={}, dropped",
                    chunk.start
                );
            }
        }
    }

    fn apply_list_chunk(&mut self, chunk: &ListChunk, target: ActiveList) {
        let store = match target {
            ActiveList::TopLevel => &mut self.items,
            ActiveList::Checklist => &mut self.checklist,
        };
        match self.fetch.apply_chunk(store, chunk) {
            FetchProgress::Continue { request, written } => {
                if !written.is_empty() {
                    self.display.on_items_available(written);
                }
                self.queue(request);
            }
            FetchProgress::Complete { written } => {
                if !written.is_empty() {
                    self.display.on_items_available(written);
                }
                let ready = match target {
                    ActiveList::TopLevel => SessionState::ReadyList,
                    ActiveList::Checklist => SessionState::ReadyChecklist,
                };
                self.finish_fetch(ready);
            }
            FetchProgress::Ignored => {}
        }
    }

    /// Note bodies arrive as a single-shot transfer; a fresh chunk replaces
    /// the buffer wholesale and the view is complete as soon as it lands.
    fn handle_note_chunk(&mut self, chunk: &NoteChunk) {
        let from = match self.state {
            SessionState::AwaitingSelection { from } => from,
            SessionState::ViewingNote { from } => from,
            _ => {
                warn!(
                    "session: note chunk outside a selection start={}, dropped",
                    chunk.start
                );
                return;
            }
        };
        let entering = !matches!(self.state, SessionState::ViewingNote { .. });

        self.note.clear();
        'fill: for part in chunk.parts.iter() {
            for ch in part.chars() {
                if self.note.push(ch).is_err() {
                    warn!("session: note body truncated at {} bytes", self.note.len());
                    break 'fill;
                }
            }
        }

        if let Some(index) = self.pending_selection.take() {
            warn!("session: deferred selection index={index} preempted by note, dropped");
        }

        self.state = SessionState::ViewingNote { from };
        if entering {
            self.display.on_mode_changed(SessionMode::ViewingNote);
        }
        self.display.on_fetch_complete();
        debug!(
            "session: note body loaded bytes={} start={}",
            self.note.len(),
            chunk.start
        );
    }
}
