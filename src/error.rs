//! Error types for invocation and sysfs transactions

use std::path::PathBuf;
use thiserror::Error;

/// Invalid command line. Always fatal, before any side effect.
#[derive(Debug, Error)]
pub enum CliError {
    /// Wrong number of arguments
    #[error("expected exactly one argument (suspend|resume), got {count}")]
    ArgCount {
        /// Number of arguments after the program name
        count: usize,
    },

    /// Argument rejected by the parser
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

/// A single sysfs read or write that did not complete.
#[derive(Debug, Error)]
pub enum SysfsError {
    /// Open, seek, read or write failed at the OS level
    #[error("{}: {source}", path.display())]
    Io {
        /// Attribute file involved
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Kernel accepted fewer bytes than were offered
    #[error("{}: short write ({written} of {expected} bytes)", path.display())]
    ShortWrite {
        /// Attribute file involved
        path: PathBuf,
        /// Bytes actually transferred
        written: usize,
        /// Bytes offered
        expected: usize,
    },

    /// Nothing to read, or nothing to upload
    #[error("{}: empty PP table", path.display())]
    EmptyTable {
        /// Attribute file involved
        path: PathBuf,
    },

    /// Seeking back to the start landed elsewhere
    #[error("{}: rewind landed at offset {position}", path.display())]
    RewindFailed {
        /// Attribute file involved
        path: PathBuf,
        /// Offset reported after the seek
        position: u64,
    },

    /// Attribute content is not in the expected format
    #[error("{}: cannot parse {content:?}", path.display())]
    Parse {
        /// Attribute file involved
        path: PathBuf,
        /// Trimmed file content
        content: String,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl SysfsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        Self::Parse {
            path: path.into(),
            content: content.trim().to_string(),
        }
    }
}

/// Contract violations on [`crate::pp_table::PpTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Capacity was already reserved
    #[error("buffer already holds {capacity} bytes")]
    AlreadyAllocated {
        /// Existing capacity
        capacity: usize,
    },

    /// Committed size negative or beyond capacity
    #[error("size {size} outside 0..={capacity}")]
    SizeOutOfRange {
        /// Requested size
        size: isize,
        /// Current capacity
        capacity: usize,
    },
}
