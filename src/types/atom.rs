//! Per-car field values and their bounded text storage

use serde::{Deserialize, Serialize};

use super::wire_codes::colour as codes;

/// Text of one atom, never longer than [`AtomText::CAPACITY`] bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(try_from = "String", into = "String")]
pub struct AtomText(String);

impl AtomText {
    /// Longest text an atom can hold, in bytes.
    ///
    /// The widest board column (driver name) is 14 characters.
    pub const CAPACITY: usize = 31;

    /// Decode a payload, or `None` if it does not fit.
    ///
    /// The payload is read up to the first NUL byte. Invalid UTF-8 is replaced
    /// rather than rejected, and the capacity is checked after replacement.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let text = String::from_utf8_lossy(&payload[..end]);
        (text.len() <= Self::CAPACITY).then(|| Self(text.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for AtomText {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() <= Self::CAPACITY {
            Ok(Self(value))
        } else {
            Err(format!("atom text longer than {} bytes", Self::CAPACITY))
        }
    }
}

impl From<AtomText> for String {
    fn from(text: AtomText) -> Self {
        text.0
    }
}

impl std::fmt::Display for AtomText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of offering new text to an atom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextUpdate {
    Replaced,
    /// Payload too long; the previous text was kept
    Rejected,
}

/// Last known value of one field of one car
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Atom {
    /// Colour or status code sent with the value
    pub colour: i32,
    pub text: AtomText,
}

impl Atom {
    /// Replace the text with a decoded payload, keeping the old text if the
    /// payload exceeds the capacity.
    pub fn offer_text(&mut self, payload: &[u8]) -> TextUpdate {
        match AtomText::from_payload(payload) {
            Some(text) => {
                self.text = text;
                TextUpdate::Replaced
            }
            None => TextUpdate::Rejected,
        }
    }

    /// Colour decoded against the feed's colour catalogue.
    pub fn colour_kind(&self) -> AtomColour {
        AtomColour::from_code(self.colour)
    }
}

/// Display colours the feed assigns to atom values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum AtomColour {
    Empty,
    /// Most recent value
    Latest,
    /// Car is in the pit lane
    Pit,
    /// Personal best
    Best,
    /// Session record
    Record,
    Data,
    Old,
    Unknown(i32),
}

impl AtomColour {
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::EMPTY => AtomColour::Empty,
            codes::LATEST => AtomColour::Latest,
            codes::PIT => AtomColour::Pit,
            codes::BEST => AtomColour::Best,
            codes::RECORD => AtomColour::Record,
            codes::DATA => AtomColour::Data,
            codes::OLD => AtomColour::Old,
            other => AtomColour::Unknown(other),
        }
    }
}
