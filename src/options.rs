//! Configuration for reading Transit data.
//!
//! This module provides types to choose the wire encoding and to install
//! read handlers:
//!
//! - [`Format`]: Which encoding the input uses (JSON, verbose JSON, MessagePack)
//! - [`ReaderOptions`]: Handler registry shared by the readers built from it
//!
//! ## Examples
//!
//! ```rust
//! use serde_transit::{Format, Reader, ReaderOptions, Result, Value};
//!
//! let options = ReaderOptions::new()
//!     .with_handler("point", |rep: Value| -> Result<Value> {
//!         let coords = rep.as_array().map(Vec::len).unwrap_or(0);
//!         Ok(Value::from(coords as i64))
//!     });
//!
//! let mut reader = Reader::with_options(Format::Json, &br#"["~#point",[1,2]]"#[..], options);
//! assert_eq!(reader.read().unwrap(), Value::from(2));
//! ```

use crate::handlers::{DefaultHandler, HandlerRegistry, ReadHandler};
use crate::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Wire encoding of a Transit stream.
///
/// # Examples
///
/// ```rust
/// use serde_transit::Format;
///
/// assert_eq!("msgpack".parse::<Format>().unwrap(), Format::MsgPack);
/// assert_eq!(Format::JsonVerbose.as_str(), "json_verbose");
/// assert!("yaml".parse::<Format>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Json,
    JsonVerbose,
    MsgPack,
}

impl Format {
    /// Returns the conventional name of this format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::JsonVerbose => "json_verbose",
            Format::MsgPack => "msgpack",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "json_verbose" => Ok(Format::JsonVerbose),
            "msgpack" => Ok(Format::MsgPack),
            other => Err(Error::unsupported_format(other)),
        }
    }
}

/// Options applied to every [`crate::Reader`] built from them.
///
/// Handlers live in an immutable [`HandlerRegistry`] behind an [`Arc`], so
/// cloning options or opening many readers never copies the registry.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{ReaderOptions, Value};
///
/// // Built-in handlers only
/// let options = ReaderOptions::new();
/// assert!(options.handlers().contains("set"));
///
/// // Unknown tags collapse to their rep
/// let options = ReaderOptions::new().with_default_handler(|_tag: &str, rep: Value| rep);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReaderOptions {
    handlers: Arc<HandlerRegistry>,
}

impl ReaderOptions {
    /// Creates options with the built-in handlers and the tagged-value default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `tag`, replacing any handler already there.
    #[must_use]
    pub fn with_handler<H>(mut self, tag: impl Into<String>, handler: H) -> Self
    where
        H: ReadHandler + 'static,
    {
        Arc::make_mut(&mut self.handlers).insert(tag, handler);
        self
    }

    /// Replaces the handler used for tags with no registered handler.
    #[must_use]
    pub fn with_default_handler<D>(mut self, handler: D) -> Self
    where
        D: DefaultHandler + 'static,
    {
        let registry = HandlerRegistry::clone(&self.handlers).with_default_handler(handler);
        self.handlers = Arc::new(registry);
        self
    }

    /// Uses an already built registry.
    #[must_use]
    pub fn with_handlers(mut self, handlers: Arc<HandlerRegistry>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }
}
