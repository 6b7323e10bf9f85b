//! Error types for Transit decoding.
//!
//! Every failure that can abort a read is reported through the single
//! [`Error`] enum, whether it comes from the underlying tokenizer, the rolling
//! cache, or a read handler.
//!
//! ## Error Categories
//!
//! - **Syntax Errors**: the bytes are not valid for the selected encoding
//!   (line/column for JSON, byte offset for MessagePack)
//! - **Cache Errors**: a cache code refers to an entry never assigned in this stream
//! - **Representation Errors**: a registered handler could not interpret its rep
//! - **I/O Errors**: the input source failed
//!
//! Tags without a registered handler are *not* errors; they are routed to the
//! default handler.
//!
//! ## Examples
//!
//! ```rust
//! use serde_transit::{Error, Format, Reader};
//!
//! let mut reader = Reader::new(Format::Json, &b"[\"^0\"]"[..]);
//! match reader.read() {
//!     Err(Error::UnknownCacheCode(code)) => assert_eq!(code, "^0"),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while reading Transit data.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while reading the input source
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed text input, with position
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// Malformed binary input, with byte offset
    #[error("Invalid format at byte {offset}: {msg}")]
    InvalidFormat { offset: usize, msg: String },

    /// Input ended in the middle of a value
    #[error("Unexpected end of input at line {line}, column {col}\nExpected: {expected}")]
    UnexpectedEof {
        line: usize,
        col: usize,
        expected: String,
    },

    /// A cache code was used before anything was cached under it
    #[error("Unknown cache code: {0:?}")]
    UnknownCacheCode(String),

    /// A read handler rejected the shape of its representation
    #[error("Malformed representation for tag {tag:?}: {msg}")]
    MalformedRepresentation { tag: String, msg: String },

    /// Format name not recognised by [`crate::Format`]
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::Error;
    ///
    /// let err = Error::syntax(10, 5, "unexpected token");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates an invalid format error for malformed binary input.
    pub fn invalid_format(offset: usize, msg: &str) -> Self {
        Error::InvalidFormat {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    ///
    /// Binary input has no lines, so MessagePack reports line 0 and the byte
    /// offset as the column.
    pub fn unexpected_eof(line: usize, col: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            line,
            col,
            expected: expected.to_string(),
        }
    }

    /// Creates an error for a cache code that has no cached referent.
    pub fn unknown_cache_code(code: &str) -> Self {
        Error::UnknownCacheCode(code.to_string())
    }

    /// Creates the error a read handler returns when its rep has the wrong shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::Error;
    ///
    /// let err = Error::malformed("point", "expected two coordinates");
    /// assert!(err.to_string().contains("\"point\""));
    /// ```
    pub fn malformed<T: fmt::Display>(tag: &str, msg: T) -> Self {
        Error::MalformedRepresentation {
            tag: tag.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an error for an unrecognised format name.
    pub fn unsupported_format(name: &str) -> Self {
        Error::UnsupportedFormat(name.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for read failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
