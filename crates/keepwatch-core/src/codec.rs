//! Translation between typed requests/chunks and flat wire messages.

use heapless::{String, Vec};

use crate::wire::{
    FIELD_INDEX, FIELD_ITEM_BASE, FIELD_OPCODE, FIELD_SESSION_TAG, FIELD_TEXT_BYTES, FIELD_TOTAL,
    Message,
};

/// Items carried by one list chunk.
pub const CHUNK_ITEMS: usize = 3;

const OPCODE_BEGIN_ITEM_LIST: u8 = 0;
const OPCODE_CONTINUE_ITEM_LIST: u8 = 1;
const OPCODE_SELECT: u8 = 2;
const OPCODE_CONTINUE_CHECKLIST: u8 = 3;

const DISCRIMINANT_LIST: u8 = 0;
const DISCRIMINANT_NOTE: u8 = 1;

/// Outgoing request. Requests are only ever constructed locally, so encoding
/// has no error path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Request {
    BeginItemList,
    ContinueItemList { index: u8 },
    Select { index: u8 },
    ContinueChecklist { index: u8 },
}

impl Request {
    /// Encode as a wire message tagged with the current session identity.
    /// A begin-list request carries no index field.
    pub fn encode(self, session_tag: u8) -> Message {
        let mut message = Message::new();
        match self {
            Request::BeginItemList => {
                message.push_u8(FIELD_OPCODE, OPCODE_BEGIN_ITEM_LIST);
            }
            Request::ContinueItemList { index } => {
                message.push_u8(FIELD_OPCODE, OPCODE_CONTINUE_ITEM_LIST);
                message.push_u8(FIELD_INDEX, index);
            }
            Request::Select { index } => {
                message.push_u8(FIELD_OPCODE, OPCODE_SELECT);
                message.push_u8(FIELD_INDEX, index);
            }
            Request::ContinueChecklist { index } => {
                message.push_u8(FIELD_OPCODE, OPCODE_CONTINUE_CHECKLIST);
                message.push_u8(FIELD_INDEX, index);
            }
        }
        message.push_u8(FIELD_SESSION_TAG, session_tag);
        message
    }
}

/// Item-list chunk: absolute start index, declared total, raw item strings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListChunk {
    pub start: u8,
    pub total: u8,
    pub items: Vec<String<FIELD_TEXT_BYTES>, CHUNK_ITEMS>,
}

/// Note-body content. A single-shot transfer; parts concatenate in field
/// order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NoteChunk {
    pub start: u8,
    pub parts: Vec<String<FIELD_TEXT_BYTES>, CHUNK_ITEMS>,
}

/// One decoded inbound message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inbound {
    List(ListChunk),
    Note(NoteChunk),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// A field required for the message's discriminant is absent.
    MissingField { field: u8 },
    /// Field 0 names no known chunk discriminant or request opcode.
    UnknownDiscriminant { value: u8 },
}

/// Session tag echoed by the host, when present.
pub fn session_tag(message: &Message) -> Option<u8> {
    message.u8_field(FIELD_SESSION_TAG)
}

/// Decode an inbound chunk message. List chunks require fields 0..=2, note
/// chunks fields 0 and 1; item strings are optional and collected in field
/// order. String length is not validated here, the store truncates at its
/// fixed width.
pub fn decode_chunk(message: &Message) -> Result<Inbound, DecodeError> {
    let discriminant = require_u8(message, FIELD_OPCODE)?;
    let start = require_u8(message, FIELD_INDEX)?;

    match discriminant {
        DISCRIMINANT_LIST => {
            let total = require_u8(message, FIELD_TOTAL)?;
            Ok(Inbound::List(ListChunk {
                start,
                total,
                items: item_fields(message),
            }))
        }
        DISCRIMINANT_NOTE => Ok(Inbound::Note(NoteChunk {
            start,
            parts: item_fields(message),
        })),
        value => Err(DecodeError::UnknownDiscriminant { value }),
    }
}

/// Decode an outgoing request, the host side of the exchange. Used by host
/// fixtures and tests that stand in for the paired device.
pub fn decode_request(message: &Message) -> Result<Request, DecodeError> {
    let opcode = require_u8(message, FIELD_OPCODE)?;
    match opcode {
        OPCODE_BEGIN_ITEM_LIST => Ok(Request::BeginItemList),
        OPCODE_CONTINUE_ITEM_LIST => Ok(Request::ContinueItemList {
            index: require_u8(message, FIELD_INDEX)?,
        }),
        OPCODE_SELECT => Ok(Request::Select {
            index: require_u8(message, FIELD_INDEX)?,
        }),
        OPCODE_CONTINUE_CHECKLIST => Ok(Request::ContinueChecklist {
            index: require_u8(message, FIELD_INDEX)?,
        }),
        value => Err(DecodeError::UnknownDiscriminant { value }),
    }
}

fn require_u8(message: &Message, field: u8) -> Result<u8, DecodeError> {
    message
        .u8_field(field)
        .ok_or(DecodeError::MissingField { field })
}

fn item_fields(message: &Message) -> Vec<String<FIELD_TEXT_BYTES>, CHUNK_ITEMS> {
    let mut items = Vec::new();
    for slot in 0..CHUNK_ITEMS as u8 {
        let Some(text) = message.text_field(FIELD_ITEM_BASE + slot) else {
            break;
        };
        let mut copy = String::new();
        let _ = copy.push_str(text);
        let _ = items.push(copy);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_request_carries_no_index() {
        let message = Request::BeginItemList.encode(7);

        assert_eq!(message.u8_field(FIELD_OPCODE), Some(0));
        assert_eq!(message.u8_field(FIELD_INDEX), None);
        assert_eq!(message.u8_field(FIELD_SESSION_TAG), Some(7));
    }

    #[test]
    fn continuation_and_selection_opcodes() {
        let continue_list = Request::ContinueItemList { index: 3 }.encode(1);
        assert_eq!(continue_list.u8_field(FIELD_OPCODE), Some(1));
        assert_eq!(continue_list.u8_field(FIELD_INDEX), Some(3));

        let select = Request::Select { index: 2 }.encode(1);
        assert_eq!(select.u8_field(FIELD_OPCODE), Some(2));
        assert_eq!(select.u8_field(FIELD_INDEX), Some(2));

        let continue_checklist = Request::ContinueChecklist { index: 6 }.encode(1);
        assert_eq!(continue_checklist.u8_field(FIELD_OPCODE), Some(3));
        assert_eq!(continue_checklist.u8_field(FIELD_INDEX), Some(6));
    }

    #[test]
    fn requests_round_trip_through_the_host_side() {
        for request in [
            Request::BeginItemList,
            Request::ContinueItemList { index: 3 },
            Request::Select { index: 2 },
            Request::ContinueChecklist { index: 9 },
        ] {
            assert_eq!(decode_request(&request.encode(0)), Ok(request));
        }
    }

    #[test]
    fn list_chunk_decodes_with_partial_item_fields() {
        let mut message = Message::new();
        message
            .push_u8(FIELD_OPCODE, 0)
            .push_u8(FIELD_INDEX, 3)
            .push_u8(FIELD_TOTAL, 5)
            .push_text(FIELD_ITEM_BASE, "-Ideas")
            .push_text(FIELD_ITEM_BASE + 1, "LPacking");

        let Ok(Inbound::List(chunk)) = decode_chunk(&message) else {
            panic!("expected list chunk");
        };
        assert_eq!(chunk.start, 3);
        assert_eq!(chunk.total, 5);
        assert_eq!(chunk.items.len(), 2);
        assert_eq!(chunk.items[0].as_str(), "-Ideas");
        assert_eq!(chunk.items[1].as_str(), "LPacking");
    }

    #[test]
    fn list_chunk_without_total_is_rejected() {
        let mut message = Message::new();
        message.push_u8(FIELD_OPCODE, 0).push_u8(FIELD_INDEX, 0);

        assert_eq!(
            decode_chunk(&message),
            Err(DecodeError::MissingField { field: FIELD_TOTAL })
        );
    }

    #[test]
    fn note_chunk_needs_no_total() {
        let mut message = Message::new();
        message
            .push_u8(FIELD_OPCODE, 1)
            .push_u8(FIELD_INDEX, 0)
            .push_text(FIELD_ITEM_BASE, "Remember the milk.");

        let Ok(Inbound::Note(chunk)) = decode_chunk(&message) else {
            panic!("expected note chunk");
        };
        assert_eq!(chunk.start, 0);
        assert_eq!(chunk.parts.len(), 1);
        assert_eq!(chunk.parts[0].as_str(), "Remember the milk.");
    }

    #[test]
    fn truncated_message_is_rejected_without_panic() {
        let mut message = Message::new();
        message.push_u8(FIELD_OPCODE, 1);

        assert_eq!(
            decode_chunk(&message),
            Err(DecodeError::MissingField { field: FIELD_INDEX })
        );
    }

    #[test]
    fn unknown_discriminant_is_surfaced() {
        let mut message = Message::new();
        message.push_u8(FIELD_OPCODE, 9).push_u8(FIELD_INDEX, 0);

        assert_eq!(
            decode_chunk(&message),
            Err(DecodeError::UnknownDiscriminant { value: 9 })
        );
    }
}
