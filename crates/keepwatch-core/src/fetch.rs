//! Fetch-loop decision logic: merge chunks, decide continuation or completion.

use core::ops::Range;

use log::{debug, warn};

use crate::{
    codec::{CHUNK_ITEMS, ListChunk, Request},
    store::ItemStore,
};

/// Which list a fetch is filling; decides the continuation opcode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchContext {
    TopLevelList,
    Checklist,
}

impl FetchContext {
    fn continuation(self, index: u8) -> Request {
        match self {
            FetchContext::TopLevelList => Request::ContinueItemList { index },
            FetchContext::Checklist => Request::ContinueChecklist { index },
        }
    }
}

/// Outcome of merging one chunk. `written` is the absolute range of slots
/// this chunk filled, for partial-render notifications.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchProgress {
    /// More data pending; emit this continuation request.
    Continue {
        request: Request,
        written: Range<usize>,
    },
    /// The fetch reached the declared end.
    Complete { written: Range<usize> },
    /// Stray chunk dropped; the cursor keeps its last known-good value.
    Ignored,
}

/// Drives one paginated list fetch against a store.
///
/// The declared total is only learned from the first chunk; completion needs
/// two independent checks, the early stop on padding past the declared end
/// and the exact-multiple boundary where a chunk reaches the end with no
/// early stop. Checking only one of them either never terminates on
/// exact-multiple totals or over-requests on the rest.
#[derive(Clone, Debug)]
pub struct ListFetch {
    context: FetchContext,
    next_index: u8,
    declared_total: Option<u8>,
    complete: bool,
}

impl ListFetch {
    pub const fn new(context: FetchContext) -> Self {
        Self {
            context,
            next_index: 0,
            declared_total: None,
            complete: false,
        }
    }

    pub fn context(&self) -> FetchContext {
        self.context
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Merge one decoded chunk into `store` and decide the next step.
    pub fn apply_chunk(&mut self, store: &mut ItemStore, chunk: &ListChunk) -> FetchProgress {
        if self.complete {
            warn!("fetch: chunk after completion start={} dropped", chunk.start);
            return FetchProgress::Ignored;
        }
        if chunk.start != self.next_index {
            warn!(
                "fetch: unexpected chunk start={} expected={}, dropped",
                chunk.start, self.next_index
            );
            return FetchProgress::Ignored;
        }

        match self.declared_total {
            None => {
                self.declared_total = Some(chunk.total);
                store.set_total(chunk.total);
            }
            Some(declared) if declared != chunk.total => {
                warn!(
                    "fetch: total changed mid-fetch declared={} now={}, keeping declared",
                    declared, chunk.total
                );
            }
            Some(_) => {}
        }

        // Clamped by the store, so the cursor can never run past capacity.
        let total = store.total().unwrap_or(0) as usize;
        let start = chunk.start as usize;

        if total == 0 {
            self.complete = true;
            debug!("fetch: complete context={:?} total=0", self.context);
            return FetchProgress::Complete { written: 0..0 };
        }

        let mut finished = false;
        let mut written_end = start;
        for (offset, raw) in chunk.items.iter().take(CHUNK_ITEMS).enumerate() {
            let index = start + offset;
            if index > total - 1 {
                // Padding past the declared end; non-multiple totals stop here.
                finished = true;
                break;
            }
            match store.write(index, raw.as_str()) {
                Ok(()) => written_end = index + 1,
                Err(err) => warn!("fetch: write index={index} failed err={err:?}, skipped"),
            }
        }

        // Exact-multiple boundary: the chunk reached the end with no early stop.
        if start + CHUNK_ITEMS == total {
            finished = true;
        }

        if finished {
            self.complete = true;
            debug!(
                "fetch: complete context={:?} total={} written={}..{} store_filled={}",
                self.context,
                total,
                start,
                written_end,
                written_end > start && store.is_complete(written_end - 1)
            );
            return FetchProgress::Complete {
                written: start..written_end,
            };
        }

        self.next_index = (start + CHUNK_ITEMS) as u8;
        debug!(
            "fetch: continue context={:?} next={} total={} written={}..{}",
            self.context, self.next_index, total, start, written_end
        );
        FetchProgress::Continue {
            request: self.context.continuation(self.next_index),
            written: start..written_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::{String, Vec};

    use crate::wire::FIELD_TEXT_BYTES;

    fn chunk(start: u8, total: u8, items: &[&str]) -> ListChunk {
        let mut copied: Vec<String<FIELD_TEXT_BYTES>, CHUNK_ITEMS> = Vec::new();
        for raw in items {
            let mut text = String::new();
            let _ = text.push_str(raw);
            let _ = copied.push(text);
        }
        ListChunk {
            start,
            total,
            items: copied,
        }
    }

    /// Serve synthetic chunks until the engine stops asking, the host's side
    /// of the loop. Like the real companion, every chunk carries all three
    /// item fields, padded past the true end. Returns how many Complete
    /// outcomes were observed.
    fn drive_to_completion(total: u8, store: &mut ItemStore, fetch: &mut ListFetch) -> usize {
        let mut completions = 0;
        let mut cursor = 0u8;
        loop {
            let mut items: std::vec::Vec<std::string::String> = std::vec::Vec::new();
            for offset in 0..CHUNK_ITEMS as u8 {
                let index = cursor + offset;
                if index < total {
                    items.push(format!("-Item {index}"));
                } else {
                    items.push("-pad".to_string());
                }
            }
            let borrowed: std::vec::Vec<&str> =
                items.iter().map(std::string::String::as_str).collect();
            match fetch.apply_chunk(store, &chunk(cursor, total, &borrowed)) {
                FetchProgress::Continue { request, .. } => match request {
                    Request::ContinueItemList { index } => cursor = index,
                    other => panic!("unexpected continuation {other:?}"),
                },
                FetchProgress::Complete { .. } => {
                    completions += 1;
                    return completions;
                }
                FetchProgress::Ignored => panic!("in-order chunk ignored"),
            }
        }
    }

    #[test]
    fn every_total_up_to_capacity_terminates_exactly_once() {
        for total in 0..=crate::store::STORE_CAPACITY as u8 {
            let mut store = ItemStore::new();
            let mut fetch = ListFetch::new(FetchContext::TopLevelList);
            let completions = drive_to_completion(total, &mut store, &mut fetch);

            assert_eq!(completions, 1, "total={total}");
            assert_eq!(store.total(), Some(total), "total={total}");
            assert_eq!(store.len(), total as usize, "total={total}");
            assert!(fetch.is_complete(), "total={total}");
        }
    }

    #[test]
    fn exact_multiple_total_finishes_on_the_boundary_check() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        let first = fetch.apply_chunk(&mut store, &chunk(0, 6, &["-A", "-B", "-C"]));
        assert_eq!(
            first,
            FetchProgress::Continue {
                request: Request::ContinueItemList { index: 3 },
                written: 0..3,
            }
        );

        // All three items land; only start + 3 == total can end this fetch.
        let second = fetch.apply_chunk(&mut store, &chunk(3, 6, &["-D", "-E", "-F"]));
        assert_eq!(second, FetchProgress::Complete { written: 3..6 });
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn non_multiple_total_finishes_on_the_early_stop() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        fetch.apply_chunk(&mut store, &chunk(0, 5, &["-A", "-B", "-C"]));
        let second = fetch.apply_chunk(&mut store, &chunk(3, 5, &["-D", "-E", "-pad"]));

        assert_eq!(second, FetchProgress::Complete { written: 3..5 });
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn zero_total_completes_with_no_writes_and_no_requests() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        let progress = fetch.apply_chunk(&mut store, &chunk(0, 0, &[]));

        assert_eq!(progress, FetchProgress::Complete { written: 0..0 });
        assert!(store.is_empty());
        assert_eq!(store.total(), Some(0));
    }

    #[test]
    fn total_below_one_chunk_never_continues() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        let progress = fetch.apply_chunk(&mut store, &chunk(0, 2, &["-A", "-B", "-pad"]));

        assert_eq!(progress, FetchProgress::Complete { written: 0..2 });
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn checklist_context_continues_with_its_own_opcode() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::Checklist);
        assert_eq!(fetch.context(), FetchContext::Checklist);

        let progress = fetch.apply_chunk(&mut store, &chunk(0, 7, &["+A", "-B", "+C"]));

        assert_eq!(
            progress,
            FetchProgress::Continue {
                request: Request::ContinueChecklist { index: 3 },
                written: 0..3,
            }
        );
    }

    #[test]
    fn cursor_mismatch_is_ignored_and_cursor_survives() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        fetch.apply_chunk(&mut store, &chunk(0, 9, &["-A", "-B", "-C"]));
        assert_eq!(
            fetch.apply_chunk(&mut store, &chunk(6, 9, &["-X", "-Y", "-Z"])),
            FetchProgress::Ignored
        );
        assert_eq!(store.len(), 3);

        // The in-order chunk still lands after the stray one was dropped.
        let progress = fetch.apply_chunk(&mut store, &chunk(3, 9, &["-D", "-E", "-F"]));
        assert_eq!(
            progress,
            FetchProgress::Continue {
                request: Request::ContinueItemList { index: 6 },
                written: 3..6,
            }
        );
    }

    #[test]
    fn mid_fetch_total_change_keeps_the_declared_total() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        fetch.apply_chunk(&mut store, &chunk(0, 5, &["-A", "-B", "-C"]));
        let second = fetch.apply_chunk(&mut store, &chunk(3, 99, &["-D", "-E", "-pad"]));

        assert_eq!(second, FetchProgress::Complete { written: 3..5 });
        assert_eq!(store.total(), Some(5));
    }

    #[test]
    fn chunks_after_completion_are_ignored() {
        let mut store = ItemStore::new();
        let mut fetch = ListFetch::new(FetchContext::TopLevelList);

        fetch.apply_chunk(&mut store, &chunk(0, 2, &["-A", "-B", "-pad"]));
        assert!(fetch.is_complete());
        assert_eq!(
            fetch.apply_chunk(&mut store, &chunk(0, 2, &["-A", "-B", "-pad"])),
            FetchProgress::Ignored
        );
    }
}
