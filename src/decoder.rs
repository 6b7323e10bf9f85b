//! Scalar decoding and composite dispatch.
//!
//! The [`Decoder`] owns the stream's [`RollingCache`] and a shared
//! [`HandlerRegistry`]. It interprets one raw scalar at a time, given whether
//! the scalar sits in a map-key position, and decides what a finished array
//! or map stands for: a plain collection, a tagged extension value, or a map
//! written as an array.

use crate::cache::{RollingCache, MAP_AS_ARRAY};
use crate::{Error, HandlerRegistry, Number, Result, TransitMap, Value};
use num_bigint::BigInt;
use std::sync::Arc;

const ESC: char = '~';
const TAG: &str = "~#";

/// A primitive item delivered by a tokenizer.
///
/// Scalars arrive exactly as the underlying syntax spelled them; containers
/// arrive already resolved by the [`crate::StructureBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Composite(Value),
}

/// The result of decoding one token in context.
///
/// Tags and the map-as-array sentinel steer composite resolution and are
/// never handed to callers as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Value(Value),
    Tag(String),
    MapAsArray,
}

impl Element {
    /// Lowers a marker that ended up outside a position where it means
    /// anything back to the string it was written as.
    pub fn into_value(self) -> Value {
        match self {
            Element::Value(v) => v,
            Element::Tag(tag) => Value::String(format!("{}{}", TAG, tag)),
            Element::MapAsArray => Value::String(MAP_AS_ARRAY.to_string()),
        }
    }
}

/// Per-stream decoding state.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{Decoder, Element, Token, Value};
///
/// let mut decoder = Decoder::default();
/// let key = decoder.decode_scalar(Token::Str("~:name".into()), true).unwrap();
/// assert_eq!(key, Element::Value(Value::Keyword("name".into())));
///
/// // The keyword was cached on first sight, so its code now resolves to it
/// let again = decoder.decode_scalar(Token::Str("^0".into()), true).unwrap();
/// assert_eq!(again, key);
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    cache: RollingCache,
    handlers: Arc<HandlerRegistry>,
}

impl Decoder {
    pub fn new(handlers: Arc<HandlerRegistry>) -> Self {
        Decoder {
            cache: RollingCache::new(),
            handlers,
        }
    }

    /// Forgets every cached string.
    pub fn reset(&mut self) {
        self.cache = RollingCache::new();
    }

    /// Decodes one token.
    ///
    /// Strings first pass through the rolling cache (resolving codes and
    /// recording cacheable strings), then through the escape grammar.
    pub fn decode_scalar(&mut self, token: Token, as_map_key: bool) -> Result<Element> {
        let value = match token {
            Token::Str(s) => {
                let s = self.cache.decode(s, as_map_key)?;
                return self.parse_string(s);
            }
            Token::Null => Value::Null,
            Token::Bool(b) => Value::Bool(b),
            Token::Int(i) => Value::Number(Number::Integer(i)),
            Token::UInt(u) => match i64::try_from(u) {
                Ok(i) => Value::Number(Number::Integer(i)),
                Err(_) => Value::BigInt(BigInt::from(u)),
            },
            Token::Float(f) => Value::Number(Number::from_f64(f)),
            Token::Bytes(b) => Value::Bytes(b),
            Token::Composite(v) => v,
        };
        Ok(Element::Value(value))
    }

    fn parse_string(&self, s: String) -> Result<Element> {
        if s == MAP_AS_ARRAY {
            return Ok(Element::MapAsArray);
        }
        if !s.starts_with(ESC) {
            return Ok(Element::Value(Value::String(s)));
        }
        let body = &s[ESC.len_utf8()..];
        if let Some(tag) = body.strip_prefix('#') {
            return Ok(Element::Tag(tag.to_string()));
        }
        let mut chars = body.chars();
        let Some(tag) = chars.next() else {
            return Ok(Element::Value(self.handlers.dispatch("", Value::from(""))?));
        };
        if matches!(tag, '~' | '^' | '`') {
            return Ok(Element::Value(Value::String(body.to_string())));
        }
        let mut buf = [0u8; 4];
        let rep = Value::String(chars.as_str().to_string());
        Ok(Element::Value(self.handlers.dispatch(tag.encode_utf8(&mut buf), rep)?))
    }

    /// Resolves a finished array.
    ///
    /// `[MapAsArray, k, v, ...]` becomes a map, `[Tag, rep]` goes to the tag's
    /// handler, anything else stays an array.
    pub fn resolve_array(&self, elements: Vec<Element>) -> Result<Value> {
        let mut iter = elements.into_iter();
        match iter.next() {
            Some(Element::MapAsArray) => {
                if iter.len() % 2 != 0 {
                    return Err(Error::malformed(MAP_AS_ARRAY, "odd number of keys and values"));
                }
                let mut entries = Vec::with_capacity(iter.len() / 2);
                while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
                    entries.push((k, v.into_value()));
                }
                self.resolve_map(entries)
            }
            Some(Element::Tag(tag)) => {
                let rep = iter.next().map_or(Value::Null, Element::into_value);
                self.handlers.dispatch(&tag, rep)
            }
            first => Ok(Value::Array(
                first.into_iter().chain(iter).map(Element::into_value).collect(),
            )),
        }
    }

    /// Resolves a finished map.
    ///
    /// A single entry keyed by a tag is an extension value; any other map is
    /// returned as a [`TransitMap`].
    pub fn resolve_map(&self, mut entries: Vec<(Element, Value)>) -> Result<Value> {
        if entries.len() == 1 && matches!(entries[0].0, Element::Tag(_)) {
            if let Some((Element::Tag(tag), rep)) = entries.pop() {
                return self.handlers.dispatch(&tag, rep);
            }
        }
        let map: TransitMap = entries
            .into_iter()
            .map(|(k, v)| (k.into_value(), v))
            .collect();
        Ok(Value::Map(map))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new(Arc::new(HandlerRegistry::new()))
    }
}
