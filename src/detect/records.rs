//! Read-only indexed view over a buffer of fixed-width records.

use super::code::{decode_key, is_well_formed, RecordLayout, CODE_LEN};
use super::ScanError;

/// Borrowed view of `record_count` records laid out back to back.
///
/// The last record may omit its terminator; only the code bytes are ever
/// read. Records are never copied out of the buffer.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    buffer: &'a [u8],
    layout: RecordLayout,
    record_count: usize,
}

impl<'a> RecordView<'a> {
    /// Create a view, checking once that every record's code is in bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::BufferTooShort`] if the buffer cannot hold
    /// `record_count` codes at the layout's stride.
    pub fn new(
        buffer: &'a [u8],
        record_count: usize,
        layout: RecordLayout,
    ) -> Result<Self, ScanError> {
        let required = required_len(record_count, layout);
        if buffer.len() < required {
            return Err(ScanError::BufferTooShort {
                required,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            buffer,
            layout,
            record_count,
        })
    }

    /// Number of records in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.record_count
    }

    /// Whether the view holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Layout used to stride through the buffer.
    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// The code bytes of record `index`.
    #[inline]
    #[must_use]
    pub fn code(&self, index: usize) -> &'a [u8] {
        let start = index * self.layout.width();
        &self.buffer[start..start + CODE_LEN]
    }

    /// Dense key of record `index`.
    #[inline]
    #[must_use]
    pub fn key(&self, index: usize) -> u32 {
        decode_key(self.code(index))
    }

    /// Keys of records `start..start + count`.
    pub fn keys(&self, start: usize, count: usize) -> impl Iterator<Item = u32> + 'a {
        let view = *self;
        (start..start + count).map(move |index| view.key(index))
    }

    /// Check every record holds a well-formed code.
    ///
    /// This is an opt-in pass; the scan itself never validates.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MalformedRecord`] for the first bad record.
    pub fn validate(&self) -> Result<(), ScanError> {
        for index in 0..self.record_count {
            let code = self.code(index);
            if !is_well_formed(code) {
                return Err(ScanError::MalformedRecord {
                    index,
                    record: String::from_utf8_lossy(code).into_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Minimum buffer length holding `record_count` codes.
fn required_len(record_count: usize, layout: RecordLayout) -> usize {
    match record_count {
        0 => 0,
        n => (n - 1) * layout.width() + CODE_LEN,
    }
}
