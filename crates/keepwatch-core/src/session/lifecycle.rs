use super::*;

impl<D: DisplayListener> Session<D> {
    /// Begin a fresh browsing session: both stores reset, a new session tag,
    /// and the opening list request queued. Cancelling an in-flight fetch is
    /// exactly this, replies to the old tag no longer match.
    pub fn start(&mut self) {
        self.tag = self.tag.wrapping_add(1);
        self.items.reset();
        self.checklist.reset();
        self.note.clear();
        self.pending_selection = None;
        self.outbox = Deque::new();
        self.state = SessionState::LoadingList;
        self.fetch = ListFetch::new(FetchContext::TopLevelList);
        debug!("session: start tag={}", self.tag);
        self.display.on_store_reset();
        self.display.on_mode_changed(SessionMode::Browsing);
        self.queue(Request::BeginItemList);
    }

    /// User picked row `index`. While the active fetch is still loading the
    /// pick is remembered and fires once loading completes; only the most
    /// recent pick before completion is honored.
    pub fn select_item(&mut self, index: u8) {
        match self.state {
            SessionState::LoadingList
            | SessionState::LoadingChecklist
            | SessionState::AwaitingSelection { .. } => {
                debug!("session: selection deferred index={index}");
                self.pending_selection = Some(index);
            }
            SessionState::ReadyList | SessionState::ReadyChecklist => {
                self.send_selection(index);
            }
            SessionState::ViewingNote { .. } => {
                warn!("session: selection while viewing note ignored index={index}");
            }
        }
    }

    /// Next outbound request, encoded and ready for the transport.
    /// Fire-and-forget: the protocol acknowledges nothing but the next
    /// chunk's arrival.
    pub fn take_request(&mut self) -> Option<Message> {
        self.outbox.pop_front()
    }

    pub(super) fn send_selection(&mut self, index: u8) {
        let from = self.active_list();
        self.state = SessionState::AwaitingSelection { from };
        debug!("session: selection sent index={index} from={from:?}");
        self.queue(Request::Select { index });
    }

    /// A list fetch reached its declared end. A deferred selection fires now
    /// or never; an index past the fetched count cannot name a row and is
    /// dropped with a trace.
    pub(super) fn finish_fetch(&mut self, ready: SessionState) {
        self.state = ready;
        self.display.on_fetch_complete();
        if let Some(index) = self.pending_selection.take() {
            if (index as usize) < self.item_count() {
                self.send_selection(index);
            } else {
                warn!(
                    "session: deferred selection index={index} beyond count={}, dropped",
                    self.item_count()
                );
            }
        }
    }

    pub(super) fn queue(&mut self, request: Request) {
        debug!("session: request queued {request:?} tag={}", self.tag);
        if self.outbox.push_back(request.encode(self.tag)).is_err() {
            warn!("session: outbox full, request {request:?} dropped");
        }
    }
}
