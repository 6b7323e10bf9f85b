//! Incremental container construction.
//!
//! Tokenizers report what they see as a stream of events: a container
//! starts, an element is appended, a map entry is set, a container ends, a
//! top-level value is complete. [`StructureBuilder`] receives those events,
//! decodes each token at the moment it is attached (its position decides how
//! it is decoded), and resolves every finished container before it is handed
//! to its parent. Resolution is therefore bottom-up: innermost containers
//! become extension values or maps before the containers that hold them are
//! finished.
//!
//! ## Position rules
//!
//! | Position | Decoded as map key? |
//! |---|---|
//! | array element 0 | yes |
//! | array element 1 | only if element 0 is the map-as-array sentinel |
//! | array element 2 and later | no |
//! | map key | yes |
//! | map value | no |
//! | top-level scalar | no |

use crate::decoder::{Decoder, Element, Token};
use crate::{Error, Result, Value};
use std::fmt;

/// An array under construction. Owned by the tokenizer frame that opened it.
#[derive(Debug, Default)]
pub struct ArrayBuilder {
    elements: Vec<Element>,
}

impl ArrayBuilder {
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A map under construction. Keys are kept as [`Element`]s until the map is
/// finished, since a single tag key turns the map into an extension value.
#[derive(Debug, Default)]
pub struct HashBuilder {
    entries: Vec<(Element, Value)>,
    pending: Option<Element>,
}

impl HashBuilder {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Event sink shared by the JSON and MessagePack tokenizers.
///
/// # Examples
///
/// Driving the builder by hand with the events a tokenizer would emit for
/// `["^ ", "a", 1]`:
///
/// ```rust
/// use serde_transit::{Decoder, StructureBuilder, Token, Value};
///
/// let mut builder = StructureBuilder::new(Decoder::default());
/// let mut array = builder.array_start(Some(3));
/// builder.array_append(&mut array, Token::Str("^ ".into())).unwrap();
/// builder.array_append(&mut array, Token::Str("a".into())).unwrap();
/// builder.array_append(&mut array, Token::Int(1)).unwrap();
/// let token = builder.array_end(array).unwrap();
/// let value = builder.add_value(token).unwrap();
///
/// assert_eq!(value.as_map().and_then(|m| m.get_str("a")), Some(&Value::from(1)));
/// ```
pub struct StructureBuilder {
    decoder: Decoder,
    failure: Option<Error>,
}

impl StructureBuilder {
    pub fn new(decoder: Decoder) -> Self {
        StructureBuilder {
            decoder,
            failure: None,
        }
    }

    pub fn array_start(&mut self, size_hint: Option<usize>) -> ArrayBuilder {
        ArrayBuilder {
            elements: Vec::with_capacity(capped(size_hint)),
        }
    }

    /// Decodes `token` according to its index and appends it.
    pub fn array_append(&mut self, array: &mut ArrayBuilder, token: Token) -> Result<()> {
        let as_map_key = match array.elements.as_slice() {
            [] => true,
            [first] => *first == Element::MapAsArray,
            _ => false,
        };
        let element = self.decoder.decode_scalar(token, as_map_key)?;
        array.elements.push(element);
        Ok(())
    }

    /// Seals an array and resolves what it stands for.
    pub fn array_end(&mut self, array: ArrayBuilder) -> Result<Token> {
        self.decoder
            .resolve_array(array.elements)
            .map(Token::Composite)
    }

    pub fn hash_start(&mut self, size_hint: Option<usize>) -> HashBuilder {
        HashBuilder {
            entries: Vec::with_capacity(capped(size_hint)),
            pending: None,
        }
    }

    /// Decodes a key (as a map key) and its value, in that order.
    pub fn hash_set(&mut self, hash: &mut HashBuilder, key: Token, value: Token) -> Result<()> {
        self.hash_key(hash, key)?;
        self.hash_value(hash, value)
    }

    /// Decodes a key as soon as it is read.
    ///
    /// Streaming tokenizers call this before reading the value, so that a
    /// cache code inside the value can already refer to the key.
    pub fn hash_key(&mut self, hash: &mut HashBuilder, key: Token) -> Result<()> {
        if hash.pending.is_some() {
            return Err(Error::custom("map key read twice without a value"));
        }
        hash.pending = Some(self.decoder.decode_scalar(key, true)?);
        Ok(())
    }

    /// Pairs `value` with the key read by the last [`hash_key`](Self::hash_key).
    pub fn hash_value(&mut self, hash: &mut HashBuilder, value: Token) -> Result<()> {
        let key = hash
            .pending
            .take()
            .ok_or_else(|| Error::custom("map value read without a key"))?;
        let value = self.decoder.decode_scalar(value, false)?.into_value();
        hash.entries.push((key, value));
        Ok(())
    }

    /// Seals a map and resolves what it stands for.
    pub fn hash_end(&mut self, hash: HashBuilder) -> Result<Token> {
        if hash.pending.is_some() {
            return Err(Error::custom("map ended between a key and its value"));
        }
        self.decoder.resolve_map(hash.entries).map(Token::Composite)
    }

    /// Finishes a top-level value.
    pub fn add_value(&mut self, token: Token) -> Result<Value> {
        Ok(self.decoder.decode_scalar(token, false)?.into_value())
    }

    /// Parks `err` so it can be recovered after a tokenizer that only
    /// understands its own error type has unwound.
    pub(crate) fn fail(&mut self, err: Error) -> String {
        let msg = err.to_string();
        self.failure = Some(err);
        msg
    }

    pub(crate) fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }

    /// Drops all per-stream state.
    pub(crate) fn reset(&mut self) {
        self.decoder.reset();
        self.failure = None;
    }
}

impl fmt::Debug for StructureBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructureBuilder")
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

// Length prefixes come from untrusted input.
fn capped(size_hint: Option<usize>) -> usize {
    size_hint.unwrap_or(0).min(4096)
}
