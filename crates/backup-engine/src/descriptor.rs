//! Opportunistic reader for the undocumented player payload.
//!
//! The payload has no reliable framing. Reads never fail: a read past the end of the buffer
//! returns a zero value and leaves the cursor where it was, and the scan recovers from a bad
//! candidate by moving one byte forward and trying again.

use core::fmt;

use serde::{Serialize, Serializer};

/// Marks the start of a length prefixed string key.
pub const STRING_KEY_MARKER: u8 = 0x02;

/// The scan stops once fewer bytes than this remain.
const MIN_REMAINING: usize = 10;

/// Key lengths outside `(MIN_KEY_LENGTH, MAX_KEY_LENGTH)` are treated as false markers.
const MIN_KEY_LENGTH: u16 = 1;
const MAX_KEY_LENGTH: u16 = 200;

/// A key is kept if its lower case form contains any of these.
const INTERESTING_KEYS: [&str; 10] = [
    "trait",
    "profession",
    "name",
    "surname",
    "forename",
    "hour",
    "zombie",
    "kill",
    "strength",
    "fitness",
];

/// A typed value recovered from the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DescriptorValue {
    /// No value, or a type tag that is not understood.
    Null,
    /// A big endian `f64`.
    Number(f64),
    /// A length prefixed string.
    Text(String),
    /// A boolean encoded in the type tag itself.
    Bool(bool),
}

impl DescriptorValue {
    /// If the value holds something worth showing: non-empty text, a non-zero number or `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Number(number) => *number != 0.0,
            Self::Text(text) => !text.is_empty(),
            Self::Bool(value) => *value,
        }
    }
}

impl fmt::Display for DescriptorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => write!(f, "{text}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// Key value pairs in the order their keys were first found. A repeated key replaces the value
/// but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptors {
    entries: Vec<(String, DescriptorValue)>,
}

impl Descriptors {
    /// Insert or replace the value for a key.
    pub fn insert(&mut self, key: String, value: DescriptorValue) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The value for a key.
    pub fn get(&self, key: &str) -> Option<&DescriptorValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// If a key was found.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over the pairs in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DescriptorValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// The number of pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// If no pairs were found.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Descriptors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// A cursor over a player payload.
#[derive(Debug)]
pub struct DescriptorReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> DescriptorReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor, clamped to the end of the buffer.
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// The number of bytes after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read a byte, or 0 at the end of the buffer.
    pub fn read_u8(&mut self) -> u8 {
        self.take::<1>().map(u8::from_be_bytes).unwrap_or(0)
    }

    /// Read a big endian `u16`, or 0 if it would overrun.
    pub fn read_u16(&mut self) -> u16 {
        self.take::<2>().map(u16::from_be_bytes).unwrap_or(0)
    }

    /// Read a big endian `u32`, or 0 if it would overrun.
    pub fn read_u32(&mut self) -> u32 {
        self.take::<4>().map(u32::from_be_bytes).unwrap_or(0)
    }

    /// Read a big endian `f64`, or 0.0 if it would overrun.
    pub fn read_f64(&mut self) -> f64 {
        self.take::<8>().map(f64::from_be_bytes).unwrap_or(0.0)
    }

    /// Read a `u16` length prefixed string.
    ///
    /// An empty or overrunning string reads as `""`. Invalid UTF-8 is decoded one byte per
    /// character instead.
    pub fn read_string(&mut self) -> String {
        let length = self.read_u16();
        if length == 0 {
            return String::new();
        }

        match self.take_slice(usize::from(length)) {
            Some(bytes) => decode_text(bytes),
            None => String::new(),
        }
    }

    /// Read the value for a type tag. Unknown tags read as [`DescriptorValue::Null`].
    pub fn read_value(&mut self, tag: u8) -> DescriptorValue {
        match tag {
            0x01 => DescriptorValue::Number(self.read_f64()),
            0x02 => DescriptorValue::Text(self.read_string()),
            0x04 => DescriptorValue::Bool(true),
            0x05 => DescriptorValue::Bool(false),
            _ => DescriptorValue::Null,
        }
    }

    /// Scan the whole buffer for `marker, key, tag, value` tuples, keeping interesting keys.
    pub fn parse_character_data(&mut self) -> Descriptors {
        let mut descriptors = Descriptors::default();
        self.position = 0;

        while self.remaining() >= MIN_REMAINING {
            let marker_position = self.position;
            if self.read_u8() != STRING_KEY_MARKER {
                continue;
            }

            let Some(key) = self.read_key() else {
                // False marker, resume from the byte after it.
                self.position = marker_position + 1;
                continue;
            };

            let tag = self.read_u8();
            let value = self.read_value(tag);

            if is_interesting(&key) {
                descriptors.insert(key, value);
            }
        }

        descriptors
    }

    fn read_key(&mut self) -> Option<String> {
        let length = self.read_u16();
        if length <= MIN_KEY_LENGTH || length >= MAX_KEY_LENGTH {
            return None;
        }

        let bytes = self.take_slice(usize::from(length))?;
        core::str::from_utf8(bytes).ok().map(str::to_string)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take_slice(N)?.try_into().ok()
    }

    fn take_slice(&mut self, length: usize) -> Option<&'a [u8]> {
        let end = self.position.checked_add(length)?;
        let bytes = self.data.get(self.position..end)?;
        self.position = end;
        Some(bytes)
    }
}

/// Scan a player payload for interesting descriptors.
pub fn parse_descriptors(data: &[u8]) -> Descriptors {
    DescriptorReader::new(data).parse_character_data()
}

fn is_interesting(key: &str) -> bool {
    let key = key.to_lowercase();
    INTERESTING_KEYS.iter().any(|keyword| key.contains(keyword))
}

fn decode_text(bytes: &[u8]) -> String {
    match core::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}
