//! Record file acquisition.
//!
//! Opens a record file, settles its layout, and exposes its bytes to the
//! detection engine either through a read-only memory map or a plain read
//! into memory.
//!
//! # Example
//!
//! ```no_run
//! use codedupe::input::{RecordFile, RecordFileOptions};
//! use std::path::Path;
//!
//! let file = RecordFile::open(Path::new("codes.txt"), &RecordFileOptions::default())?;
//! println!("{} records of {} bytes", file.record_count(), file.layout().width());
//! # Ok::<(), codedupe::input::InputError>(())
//! ```

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use memmap2::Mmap;

use crate::detect::code::{LineEnding, RecordLayout, CODE_LEN, MAX_KEYS};

/// Errors that can occur while opening a record file.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    /// The file could not be opened, read or mapped.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The path exists but is not a regular file.
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// The first record is not followed by a recognised line ending.
    #[error("Unrecognised line ending after first code in {path}: byte 0x{byte:02x}")]
    UnknownLineEnding {
        /// File being inspected
        path: PathBuf,
        /// Byte found where a terminator was expected
        byte: u8,
    },

    /// The file length is not a whole number of records.
    #[error("{path}: length {len} is not a multiple of the {width}-byte record width")]
    MisalignedLength {
        /// File being opened
        path: PathBuf,
        /// File length in bytes
        len: u64,
        /// Expected record width
        width: usize,
    },
}

/// How to open a record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFileOptions {
    /// Fixed line ending, or `None` to infer it from the first record.
    pub line_ending: Option<LineEnding>,
    /// Memory-map the file instead of reading it into memory.
    pub mmap: bool,
}

impl Default for RecordFileOptions {
    fn default() -> Self {
        Self {
            line_ending: None,
            mmap: true,
        }
    }
}

impl RecordFileOptions {
    /// Use a fixed line ending instead of inferring one.
    #[must_use]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = Some(line_ending);
        self
    }

    /// Enable or disable memory mapping.
    #[must_use]
    pub fn with_mmap(mut self, enabled: bool) -> Self {
        self.mmap = enabled;
        self
    }
}

enum Contents {
    Mapped(Mmap),
    Read(Vec<u8>),
    /// Not loaded: empty, or large enough to prove a repeat by length.
    Skipped,
}

/// An opened record file.
pub struct RecordFile {
    path: PathBuf,
    contents: Contents,
    layout: RecordLayout,
    record_count: usize,
}

impl std::fmt::Debug for RecordFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let contents = match self.contents {
            Contents::Mapped(_) => "<mapped>",
            Contents::Read(_) => "<read>",
            Contents::Skipped => "<skipped>",
        };
        f.debug_struct("RecordFile")
            .field("path", &self.path)
            .field("contents", &contents)
            .field("layout", &self.layout)
            .field("record_count", &self.record_count)
            .finish()
    }
}

impl RecordFile {
    /// Open `path` as a record file.
    ///
    /// Files too large to hold distinct codes are not loaded at all; their
    /// [`bytes`](Self::bytes) are empty and the record count alone settles
    /// the verdict.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] if the file cannot be read, is not a regular
    /// file, has an unknown line ending, or is not a whole number of records.
    pub fn open(path: &Path, options: &RecordFileOptions) -> Result<Self, InputError> {
        let io_err = |source: std::io::Error| InputError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(path).map_err(io_err)?;
        if !metadata.is_file() {
            return Err(InputError::NotAFile(path.to_path_buf()));
        }
        let len = metadata.len();
        let mut file = File::open(path).map_err(io_err)?;

        let layout = match options.line_ending {
            Some(line_ending) => RecordLayout::new(line_ending),
            None => RecordLayout::new(detect_line_ending(path, &mut file, len)?),
        };
        let width = layout.width() as u64;

        log::debug!(
            "Opening {} ({}, {}-byte records)",
            path.display(),
            ByteSize::b(len),
            width
        );

        if len / width > MAX_KEYS as u64 {
            log::debug!("{} holds more records than distinct codes", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                contents: Contents::Skipped,
                layout,
                record_count: (len / width) as usize,
            });
        }

        let records = match len % width {
            0 => len / width,
            rem if rem == CODE_LEN as u64 => len / width + 1,
            _ => {
                return Err(InputError::MisalignedLength {
                    path: path.to_path_buf(),
                    len,
                    width: layout.width(),
                })
            }
        };
        let record_count = records as usize;

        let contents = if len == 0 {
            Contents::Skipped
        } else if options.mmap {
            // SAFETY: the map is read-only and lives no longer than `self`.
            // Concurrent truncation of the file by another process is outside
            // what this tool guards against.
            Contents::Mapped(unsafe { Mmap::map(&file) }.map_err(io_err)?)
        } else {
            Contents::Read(fs::read(path).map_err(io_err)?)
        };

        Ok(Self {
            path: path.to_path_buf(),
            contents,
            layout,
            record_count,
        })
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file bytes (empty if the file was not loaded).
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match &self.contents {
            Contents::Mapped(map) => &map[..],
            Contents::Read(data) => data.as_slice(),
            Contents::Skipped => &[],
        }
    }

    /// Record layout in effect.
    #[must_use]
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Number of records in the file.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Whether the bytes were loaded (mapped or read).
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !matches!(self.contents, Contents::Skipped)
    }
}

/// Infer the line ending from the byte following the first code.
///
/// Empty files and files holding a single unterminated code default to CRLF.
fn detect_line_ending(path: &Path, file: &mut File, len: u64) -> Result<LineEnding, InputError> {
    if len <= CODE_LEN as u64 {
        return Ok(LineEnding::default());
    }

    let mut head = [0u8; CODE_LEN + 1];
    file.read_exact(&mut head).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match head[CODE_LEN] {
        b'\r' => Ok(LineEnding::Crlf),
        b'\n' => Ok(LineEnding::Lf),
        byte => Err(InputError::UnknownLineEnding {
            path: path.to_path_buf(),
            byte,
        }),
    }
}
