//! Field-indexed wire messages exchanged with the paired host.

use heapless::{String, Vec};

/// Maximum number of fields one message carries.
pub const MESSAGE_MAX_FIELDS: usize = 8;
/// Capacity of a single text field value.
pub const FIELD_TEXT_BYTES: usize = 96;

/// Field 0: request opcode, or response discriminant.
pub const FIELD_OPCODE: u8 = 0;
/// Field 1: absolute item index (absent on a begin-list request).
pub const FIELD_INDEX: u8 = 1;
/// Field 2: declared total count, list chunks only.
pub const FIELD_TOTAL: u8 = 2;
/// Fields 3..=5: raw flag+label item strings.
pub const FIELD_ITEM_BASE: u8 = 3;
/// Field 6: monotonic session tag, echoed by tag-aware hosts.
pub const FIELD_SESSION_TAG: u8 = 6;

/// One field value: a small scalar or bounded text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    U8(u8),
    Text(String<FIELD_TEXT_BYTES>),
}

impl Value {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::U8(value) => Some(*value),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::U8(_) => None,
            Value::Text(text) => Some(text.as_str()),
        }
    }
}

/// Flat key/value message, the channel's unit of transfer.
///
/// Duplicate keys keep the first occurrence; lookups never fail mid-read.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    entries: Vec<(u8, Value), MESSAGE_MAX_FIELDS>,
}

impl Message {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn field(&self, key: u8) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry_key, _)| *entry_key == key)
            .map(|(_, value)| value)
    }

    pub fn u8_field(&self, key: u8) -> Option<u8> {
        self.field(key).and_then(Value::as_u8)
    }

    pub fn text_field(&self, key: u8) -> Option<&str> {
        self.field(key).and_then(Value::as_text)
    }

    /// Append a scalar field. A full message drops the write silently, the
    /// same way the bounded channel would.
    pub fn push_u8(&mut self, key: u8, value: u8) -> &mut Self {
        let _ = self.entries.push((key, Value::U8(value)));
        self
    }

    /// Append a text field, truncating at the field capacity.
    pub fn push_text(&mut self, key: u8, text: &str) -> &mut Self {
        let mut value = String::new();
        for ch in text.chars() {
            if value.push(ch).is_err() {
                break;
            }
        }
        let _ = self.entries.push((key, Value::Text(value)));
        self
    }
}
