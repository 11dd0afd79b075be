use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which length-prefixed field of an AVCC configuration record ran past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    SpsLength,
    Sps,
    PpsCount,
    PpsLength,
    Pps,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::SpsLength => write!(f, "SPS length"),
            RecordKind::Sps => write!(f, "SPS"),
            RecordKind::PpsCount => write!(f, "PPS count"),
            RecordKind::PpsLength => write!(f, "PPS length"),
            RecordKind::Pps => write!(f, "PPS"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("AVCC configuration record needs at least {expected} bytes, found {found}")]
    TruncatedHeader { expected: usize, found: usize },

    #[error(
        "truncated {kind} #{index} at offset {offset}: needed {needed} bytes, {remaining} remaining"
    )]
    TruncatedRecord {
        kind: RecordKind,
        index: usize,
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("truncated NAL unit at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedUnit {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("NAL length prefix must be 1 to 4 bytes wide, got {0}")]
    InvalidLengthSize(u8),
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("An error occurred when opening `{path}`")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("An error occurred when reading `{path}`")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Input file `{0}` is empty")]
    EmptyInput(PathBuf),

    #[error("An error occurred when writing `{path}`")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("An error occurred parsing the AVCC input")]
    Parse(#[from] ParseError),
}
