use std::fmt::Display;

use serde::{de, ser};

/// The three non-overlapping failure classes of the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The buffer ended early. Retry once more bytes have arrived.
    IncompleteData,
    /// The bytes (or the value) are present but invalid.
    Value,
    /// A term was built from parts of the wrong type.
    Type,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("incomplete data: need more bytes for {needed}")]
    Incomplete { needed: &'static str },
    #[error("bad version number: {0}")]
    BadVersion(u8),
    #[error("unsupported data tag: {0}")]
    UnknownTag(u8),
    #[error("invalid atom length: {0}")]
    AtomTooLong(usize),
    #[error("improper list head is empty")]
    EmptyHead,
    #[error("improper list tail can't be a list")]
    ListTail,
    #[error("term nesting exceeds {0} levels")]
    DepthExceeded(usize),
    #[error("invalid opaque object: {0}")]
    InvalidOpaque(&'static str),
    #[error("invalid compressed term: {0}")]
    Compressed(String),
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("invalid float representation")]
    InvalidFloat,
    #[error("unsupported data type: {0}")]
    Unsupported(&'static str),
    #[error("{0} is too large to encode")]
    TooLarge(&'static str),
    #[error(transparent)]
    Native(anyhow::Error),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Incomplete { .. } => ErrorKind::IncompleteData,
            Error::ListTail => ErrorKind::Type,
            _ => ErrorKind::Value,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        self.kind() == ErrorKind::IncompleteData
    }

    pub(crate) fn incomplete(needed: &'static str) -> Self {
        Error::Incomplete { needed }
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
