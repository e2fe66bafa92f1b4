//! Payload dictionaries and timed-color digests.
//!
//! Every piece of data the demo moves between endpoints - application
//! context, messages, user info, file metadata - is a [`Payload`]: an
//! ordered string-keyed JSON map. The demo stamps each payload with a
//! display color and a wall-clock timestamp; the UI extracts that pair as
//! a [`TimedColor`] and paints labels with it, so a glance shows which
//! command last flowed and when.

use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Payload key holding the wall-clock timestamp.
pub const KEY_TIMESTAMP: &str = "timestamp";

/// Payload key holding the display color.
pub const KEY_COLOR: &str = "color";

/// Timestamp format used for payload stamps ("14:03:27.512").
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// An RGB display color carried inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl StatusColor {
    /// Pick a random color.
    #[must_use]
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        }
    }

    /// Render as a `#rrggbb` hex string.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse a `#rrggbb` hex string.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex())
    }
}

/// The color/timestamp pair extracted from a payload.
///
/// This is the digest the presentation layer shows: the color tints the
/// command label, the timestamp tells the user when the data flowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedColor {
    /// Display color
    pub color: StatusColor,
    /// Wall-clock timestamp, already formatted for display
    pub timestamp: String,
}

impl TimedColor {
    /// Stamp the given color with the current wall-clock time.
    #[must_use]
    pub fn now(color: StatusColor) -> Self {
        Self {
            color,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Extract the color/timestamp pair from a payload, if present.
    #[must_use]
    pub fn from_payload(payload: &Payload) -> Option<Self> {
        let color = payload
            .get(KEY_COLOR)
            .and_then(Value::as_str)
            .and_then(StatusColor::from_hex)?;
        let timestamp = payload.get(KEY_TIMESTAMP).and_then(Value::as_str)?;
        Some(Self {
            color,
            timestamp: timestamp.to_string(),
        })
    }

    /// Extract the color/timestamp pair from an encoded payload.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        Payload::from_bytes(bytes)
            .ok()
            .as_ref()
            .and_then(Self::from_payload)
    }
}

/// A string-keyed dictionary exchanged between the paired endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Map<String, Value>);

impl Payload {
    /// Create an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a payload stamped with the given color and the current time.
    #[must_use]
    pub fn timed(color: StatusColor) -> Self {
        let stamp = TimedColor::now(color);
        let mut payload = Self::new();
        payload.insert(KEY_COLOR, Value::String(stamp.color.hex()));
        payload.insert(KEY_TIMESTAMP, Value::String(stamp.timestamp));
        payload
    }

    /// Create a payload stamped with a random color and the current time.
    #[must_use]
    pub fn timed_now() -> Self {
        Self::timed(StatusColor::random())
    }

    /// Insert a value under the given key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Look up the value stored under the given key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the payload holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries in the payload.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Encode as JSON bytes (the wire form used for message data).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Extract the color/timestamp digest, if this payload carries one.
    #[must_use]
    pub fn timed_color(&self) -> Option<TimedColor> {
        TimedColor::from_payload(self)
    }
}

impl From<serde_json::Map<String, Value>> for Payload {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }
}
