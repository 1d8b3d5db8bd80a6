//! Code decoding and record layout.
//!
//! A code is three uppercase ASCII letters followed by three ASCII digits
//! (`ABC123`). Every well-formed code maps to a unique key in
//! `0..MAX_KEYS`:
//!
//! ```text
//! key = (L0-'A')*676000 + (L1-'A')*26000 + (L2-'A')*1000
//!     + (D0-'0')*100 + (D1-'0')*10 + (D2-'0')
//! ```
//!
//! The mapping is dense, so a plain bitset of `MAX_KEYS` bits can record
//! membership without hashing.
//!
//! # Example
//!
//! ```
//! use codedupe::detect::code::{decode_key, encode_key};
//!
//! let key = decode_key(b"ABC123\r\n");
//! assert_eq!(key, 28_123);
//! assert_eq!(&encode_key(key), b"ABC123");
//! ```

use serde::{Deserialize, Serialize};

use super::ScanError;

/// Number of distinct codes: 26^3 * 10^3.
pub const MAX_KEYS: usize = 17_576_000;

/// Number of bytes of a record that carry the code itself.
pub const CODE_LEN: usize = 6;

const LETTER_WEIGHTS: [u32; 3] = [676_000, 26_000, 1_000];
const DIGIT_WEIGHTS: [u32; 3] = [100, 10, 1];

/// Decode the code at the start of `record` into its dense key.
///
/// Only the first [`CODE_LEN`] bytes are read; any terminator bytes are
/// ignored. No validation is performed: bytes outside `A..=Z` / `0..=9`
/// produce an arbitrary key (possibly `>= MAX_KEYS`). Callers that cannot
/// trust their input should run [`is_well_formed`] first.
///
/// # Panics
///
/// Panics if `record` is shorter than [`CODE_LEN`] bytes.
#[inline]
#[must_use]
pub fn decode_key(record: &[u8]) -> u32 {
    let code = &record[..CODE_LEN];
    let mut key = 0u32;
    for (byte, weight) in code[..3].iter().zip(LETTER_WEIGHTS) {
        key = key.wrapping_add(u32::from(byte.wrapping_sub(b'A')).wrapping_mul(weight));
    }
    for (byte, weight) in code[3..].iter().zip(DIGIT_WEIGHTS) {
        key = key.wrapping_add(u32::from(byte.wrapping_sub(b'0')).wrapping_mul(weight));
    }
    key
}

/// Inverse of [`decode_key`]: render a key back into its six code bytes.
///
/// `key` must be below [`MAX_KEYS`].
#[must_use]
pub fn encode_key(key: u32) -> [u8; CODE_LEN] {
    debug_assert!((key as usize) < MAX_KEYS, "key {key} out of range");
    let mut rest = key;
    let mut code = [0u8; CODE_LEN];
    for (slot, weight) in LETTER_WEIGHTS.iter().enumerate() {
        code[slot] = b'A' + (rest / weight) as u8;
        rest %= weight;
    }
    for (slot, weight) in DIGIT_WEIGHTS.iter().enumerate() {
        code[3 + slot] = b'0' + (rest / weight) as u8;
        rest %= weight;
    }
    code
}

/// Whether the first [`CODE_LEN`] bytes of `record` form a valid code.
#[must_use]
pub fn is_well_formed(record: &[u8]) -> bool {
    record.len() >= CODE_LEN
        && record[..3].iter().all(u8::is_ascii_uppercase)
        && record[3..CODE_LEN].iter().all(u8::is_ascii_digit)
}

/// Line terminator convention of a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` - two terminator bytes, 8-byte records.
    #[default]
    Crlf,
    /// `\n` - one terminator byte, 7-byte records.
    Lf,
}

impl LineEnding {
    /// Number of terminator bytes following each code.
    #[must_use]
    pub fn terminator_len(self) -> usize {
        match self {
            Self::Crlf => 2,
            Self::Lf => 1,
        }
    }
}

impl std::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crlf => write!(f, "crlf"),
            Self::Lf => write!(f, "lf"),
        }
    }
}

/// Fixed width of one record (code plus terminator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    width: usize,
}

impl RecordLayout {
    /// Layout for codes followed by the given line ending.
    #[must_use]
    pub fn new(line_ending: LineEnding) -> Self {
        Self {
            width: CODE_LEN + line_ending.terminator_len(),
        }
    }

    /// Layout with an explicit record width.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] if `width` cannot hold a code.
    pub fn with_width(width: usize) -> Result<Self, ScanError> {
        if width < CODE_LEN {
            return Err(ScanError::InvalidConfig(format!(
                "record width {width} is smaller than the {CODE_LEN}-byte code"
            )));
        }
        Ok(Self { width })
    }

    /// Bytes per record.
    #[must_use]
    pub fn width(self) -> usize {
        self.width
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self::new(LineEnding::default())
    }
}
