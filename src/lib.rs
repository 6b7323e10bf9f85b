//! # serde_transit
//!
//! A reader for the Transit data format, with a serde bridge.
//!
//! ## What is Transit?
//!
//! Transit carries values richer than JSON (keywords, symbols, sets, lists,
//! dates, UUIDs, big numbers, maps with composite keys, user-defined
//! extensions) over JSON or MessagePack. Extensions are tagged
//! representations built from base values, and repeated map keys and tag
//! identifiers are shortened to cache codes that only make sense relative to
//! what came before them in the same stream.
//!
//! ## Key Features
//!
//! - **Streaming**: values are built while the input is tokenized, and a
//!   stream of top-level values is read one value at a time
//! - **Three encodings**: `json`, `json_verbose` and `msgpack`
//! - **Pluggable handlers**: any tag can be mapped to your own type
//! - **Serde Compatible**: decode straight into `#[derive(Deserialize)]` types
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_transit::from_str;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct User {
//!     id: u32,
//!     name: String,
//! }
//!
//! let user: User = from_str(r#"["^ ","~:id",123,"~:name","Alice"]"#).unwrap();
//! assert_eq!(user, User { id: 123, name: "Alice".to_string() });
//! ```
//!
//! ### Dynamic values
//!
//! ```rust
//! use serde_transit::{Format, Reader, Value};
//!
//! let input = br#"[{"~:color":"red"},{"^0":"blue"}]"#;
//! let value = Reader::new(Format::Json, &input[..]).read().unwrap();
//!
//! let colors: Vec<&str> = value
//!     .as_array()
//!     .unwrap()
//!     .iter()
//!     .filter_map(|m| m.as_map()?.get(&Value::Keyword("color".into()))?.as_str())
//!     .collect();
//! assert_eq!(colors, vec!["red", "blue"]);
//! ```
//!
//! ## Wire grammar
//!
//! | Form | Meaning |
//! |---|---|
//! | `"~~x"`, `"~^x"`, `` "~`x" `` | the string with its leading `~` removed |
//! | `"~Cx"` | scalar extension with one-character tag `C` and rep `"x"` |
//! | `"~#tag"` | tag identifier, in `[tag, rep]` or `{tag: rep}` |
//! | `"^ "` | first element of a map written as `[^ , k, v, ...]` |
//! | `"^0"`, `"^1"`, ... | cache code for a previously seen string |
//!
//! Map keys of four or more characters, and any keyword, symbol or tag
//! identifier of that length, are cached in first-seen order; the cache holds
//! 1936 entries and restarts when full.

pub mod builder;
pub mod cache;
pub mod de;
pub mod decoder;
pub mod error;
pub mod handlers;
mod json;
pub mod macros;
pub mod map;
mod msgpack;
pub mod options;
pub mod reader;
pub mod value;

pub use builder::{ArrayBuilder, HashBuilder, StructureBuilder};
pub use cache::RollingCache;
pub use de::Deserializer;
pub use decoder::{Decoder, Element, Token};
pub use error::{Error, Result};
pub use handlers::{DefaultHandler, HandlerRegistry, ReadHandler, TaggedValueHandler};
pub use map::{TransitMap, TransitSet};
pub use options::{Format, ReaderOptions};
pub use reader::{Reader, Values};
pub use value::{Link, Number, Object, TaggedValue, Value};

use serde::de::DeserializeOwned;
use std::io;

/// Deserialize an instance of type `T` from a decoded [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde_transit::{from_value, transit};
///
/// let pair: (i32, String) = from_value(transit!([1, "one"])).unwrap();
/// assert_eq!(pair, (1, "one".to_string()));
/// ```
///
/// # Errors
///
/// Returns an error if the value does not have the shape `T` expects.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(value))
}

/// Deserialize an instance of type `T` from the first value of a Transit
/// JSON string.
///
/// # Examples
///
/// ```rust
/// use serde_transit::from_str;
/// use std::collections::BTreeSet;
///
/// let set: BTreeSet<i32> = from_str(r#"["~#set",[3,1,2]]"#).unwrap();
/// assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if the input is empty or malformed, or if the value
/// cannot be deserialized to type `T`. Syntax errors carry line and column.
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_slice(Format::Json, s.as_bytes())
}

/// Deserialize an instance of type `T` from the first value of a byte slice
/// in the given format.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{from_slice, Format};
///
/// // [1, true] in MessagePack
/// let pair: (u8, bool) = from_slice(Format::MsgPack, &[0x92, 0x01, 0xc3]).unwrap();
/// assert_eq!(pair, (1, true));
/// ```
///
/// # Errors
///
/// Returns an error if the bytes are not valid for `format` or cannot be
/// deserialized to type `T`.
pub fn from_slice<T>(format: Format, v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_reader(format, v)
}

/// Deserialize an instance of type `T` from the first value of an I/O stream.
///
/// # Errors
///
/// Returns an error if reading fails, the input is not valid for `format`,
/// or the value cannot be deserialized to type `T`.
pub fn from_reader<R, T>(format: Format, reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let value = Reader::new(format, reader).read()?;
    from_value(value)
}
