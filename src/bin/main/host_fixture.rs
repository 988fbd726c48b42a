//! In-memory paired host answering protocol requests from fixture data.

use keepwatch_core::{
    codec::{self, CHUNK_ITEMS, Request},
    wire::{
        FIELD_INDEX, FIELD_ITEM_BASE, FIELD_OPCODE, FIELD_SESSION_TAG, FIELD_TEXT_BYTES,
        FIELD_TOTAL, Message,
    },
};
use log::{debug, warn};

struct ChecklistEntry {
    label: &'static str,
    checked: bool,
}

enum FixtureItem {
    Note {
        label: &'static str,
        body: &'static str,
    },
    Checklist {
        label: &'static str,
        entries: Vec<ChecklistEntry>,
    },
}

/// Stands in for the companion on the far side of the channel: keeps a small
/// note tree and answers one request at a time, three items per chunk.
pub struct ScriptedHost {
    items: Vec<FixtureItem>,
    open_checklist: Option<usize>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        let items = vec![
            FixtureItem::Note {
                label: "Shopping note",
                body: "Remember the milk, and check the pantry for coffee before Saturday.",
            },
            FixtureItem::Checklist {
                label: "Groceries",
                entries: vec![
                    ChecklistEntry {
                        label: "Milk",
                        checked: false,
                    },
                    ChecklistEntry {
                        label: "Eggs",
                        checked: true,
                    },
                    ChecklistEntry {
                        label: "Coffee",
                        checked: false,
                    },
                    ChecklistEntry {
                        label: "Bread",
                        checked: false,
                    },
                ],
            },
            FixtureItem::Note {
                label: "Meeting notes",
                body: "Standup moved to 9:30. Bring the budget sheet.",
            },
            FixtureItem::Note {
                label: "Ideas",
                body: "A reading lamp that dims with the sunset.",
            },
            FixtureItem::Checklist {
                label: "Packing",
                entries: vec![
                    ChecklistEntry {
                        label: "Charger",
                        checked: false,
                    },
                    ChecklistEntry {
                        label: "Passport",
                        checked: true,
                    },
                ],
            },
        ];
        Self {
            items,
            open_checklist: None,
        }
    }

    /// Answer one request the way the paired companion does. Requests the
    /// fixture cannot serve return `None` and the client stays loading.
    pub fn answer(&mut self, request: &Message) -> Option<Message> {
        let tag = codec::session_tag(request);
        let request = match codec::decode_request(request) {
            Ok(request) => request,
            Err(err) => {
                warn!("host: undecodable request {err:?}");
                return None;
            }
        };
        debug!("host: answering {request:?}");
        match request {
            Request::BeginItemList => {
                self.open_checklist = None;
                Some(self.top_chunk(0, tag))
            }
            Request::ContinueItemList { index } => Some(self.top_chunk(index, tag)),
            Request::ContinueChecklist { index } => {
                let open = self.open_checklist?;
                Some(self.checklist_chunk(open, index, tag))
            }
            Request::Select { index } => self.answer_selection(index, tag),
        }
    }

    fn answer_selection(&mut self, index: u8, tag: Option<u8>) -> Option<Message> {
        if let Some(open) = self.open_checklist {
            // Selecting inside an open checklist toggles the entry; the
            // refreshed list is served again from the top.
            let FixtureItem::Checklist { entries, .. } = &mut self.items[open] else {
                return None;
            };
            let entry = entries.get_mut(index as usize)?;
            entry.checked = !entry.checked;
            debug!("host: toggled {} checked={}", entry.label, entry.checked);
            return Some(self.checklist_chunk(open, 0, tag));
        }
        match self.items.get(index as usize)? {
            FixtureItem::Note { label, body } => {
                debug!("host: serving note {label}");
                Some(note_chunk(body, tag))
            }
            FixtureItem::Checklist { label, .. } => {
                debug!("host: opening checklist {label}");
                self.open_checklist = Some(index as usize);
                Some(self.checklist_chunk(index as usize, 0, tag))
            }
        }
    }

    fn top_chunk(&self, start: u8, tag: Option<u8>) -> Message {
        let raws: Vec<String> = self
            .items
            .iter()
            .map(|item| match item {
                FixtureItem::Note { label, .. } => format!("-{label}"),
                FixtureItem::Checklist { label, .. } => format!("L{label}"),
            })
            .collect();
        list_chunk(&raws, start, tag)
    }

    fn checklist_chunk(&self, open: usize, start: u8, tag: Option<u8>) -> Message {
        let FixtureItem::Checklist { entries, .. } = &self.items[open] else {
            unreachable!("open_checklist always points at a checklist");
        };
        let raws: Vec<String> = entries
            .iter()
            .map(|entry| {
                let flag = if entry.checked { '+' } else { '-' };
                format!("{flag}{}", entry.label)
            })
            .collect();
        list_chunk(&raws, start, tag)
    }
}

// Every chunk carries all three item fields; slots past the true end hold
// padding the client is expected to stop before.
fn list_chunk(raws: &[String], start: u8, tag: Option<u8>) -> Message {
    let mut reply = Message::new();
    reply
        .push_u8(FIELD_OPCODE, 0)
        .push_u8(FIELD_INDEX, start)
        .push_u8(FIELD_TOTAL, raws.len() as u8);
    for slot in 0..CHUNK_ITEMS {
        let raw = raws
            .get(start as usize + slot)
            .map(String::as_str)
            .unwrap_or("-");
        reply.push_text(FIELD_ITEM_BASE + slot as u8, raw);
    }
    if let Some(tag) = tag {
        reply.push_u8(FIELD_SESSION_TAG, tag);
    }
    reply
}

fn note_chunk(body: &str, tag: Option<u8>) -> Message {
    let mut reply = Message::new();
    reply.push_u8(FIELD_OPCODE, 1).push_u8(FIELD_INDEX, 0);
    let mut remaining = body;
    for slot in 0..CHUNK_ITEMS as u8 {
        if remaining.is_empty() {
            break;
        }
        let mut split = FIELD_TEXT_BYTES.min(remaining.len());
        while !remaining.is_char_boundary(split) {
            split -= 1;
        }
        let (part, rest) = remaining.split_at(split);
        reply.push_text(FIELD_ITEM_BASE + slot, part);
        remaining = rest;
    }
    if let Some(tag) = tag {
        reply.push_u8(FIELD_SESSION_TAG, tag);
    }
    reply
}
