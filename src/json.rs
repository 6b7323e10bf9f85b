//! JSON tokenizer.
//!
//! `serde_json` does the lexing. Instead of materializing a
//! `serde_json::Value`, a [`DeserializeSeed`] drives the parser and reports
//! every scalar and container boundary to the [`StructureBuilder`] while the
//! parse is still in progress, so cache codes are resolved in document order.
//! The same tokenizer reads both `json` and `json_verbose` input.

use crate::builder::StructureBuilder;
use crate::decoder::Token;
use crate::{Error, Result, Value};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::de::IoRead;
use serde_json::error::Category;
use std::fmt;
use std::io;

pub(crate) struct JsonTokenizer<R: io::Read> {
    de: serde_json::Deserializer<IoRead<R>>,
}

impl<R: io::Read> JsonTokenizer<R> {
    pub(crate) fn new(reader: R) -> Self {
        JsonTokenizer {
            de: serde_json::Deserializer::from_reader(reader),
        }
    }

    /// Reads the next whitespace-separated top-level value.
    ///
    /// Returns `Ok(None)` once only whitespace remains.
    pub(crate) fn next_value(&mut self, builder: &mut StructureBuilder) -> Result<Option<Value>> {
        match self.de.end() {
            Ok(()) => return Ok(None),
            Err(err) if err.is_io() => return Err(translate(err)),
            Err(_) => {}
        }
        let token = TokenSeed { builder: &mut *builder }
            .deserialize(&mut self.de)
            .map_err(|err| builder.take_failure().unwrap_or_else(|| translate(err)))?;
        builder.add_value(token).map(Some)
    }
}

/// Parses one JSON value into a [`Token`], feeding nested structure to the
/// builder on the way.
struct TokenSeed<'b> {
    builder: &'b mut StructureBuilder,
}

impl<'de, 'b> DeserializeSeed<'de> for TokenSeed<'b> {
    type Value = Token;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Token, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, 'b> Visitor<'de> for TokenSeed<'b> {
    type Value = Token;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Token, E> {
        Ok(Token::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Token, E> {
        Ok(Token::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Token, E> {
        Ok(Token::UInt(v))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Token, E> {
        Ok(Token::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Token, E> {
        Ok(Token::Str(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Token, E> {
        Ok(Token::Str(v))
    }

    fn visit_unit<E>(self) -> std::result::Result<Token, E> {
        Ok(Token::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Token, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let builder = self.builder;
        let mut array = builder.array_start(seq.size_hint());
        while let Some(token) = seq.next_element_seed(TokenSeed { builder: &mut *builder })? {
            builder
                .array_append(&mut array, token)
                .map_err(|err| de::Error::custom(builder.fail(err)))?;
        }
        builder
            .array_end(array)
            .map_err(|err| de::Error::custom(builder.fail(err)))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Token, A::Error>
    where
        A: MapAccess<'de>,
    {
        let builder = self.builder;
        let mut hash = builder.hash_start(map.size_hint());
        while let Some(key) = map.next_key_seed(TokenSeed { builder: &mut *builder })? {
            builder
                .hash_key(&mut hash, key)
                .map_err(|err| de::Error::custom(builder.fail(err)))?;
            let value = map.next_value_seed(TokenSeed { builder: &mut *builder })?;
            builder
                .hash_value(&mut hash, value)
                .map_err(|err| de::Error::custom(builder.fail(err)))?;
        }
        builder
            .hash_end(hash)
            .map_err(|err| de::Error::custom(builder.fail(err)))
    }
}

fn translate(err: serde_json::Error) -> Error {
    let (line, col) = (err.line(), err.column());
    match err.classify() {
        Category::Io => Error::io(&err.to_string()),
        Category::Eof => Error::unexpected_eof(line, col, "a complete JSON value"),
        Category::Syntax | Category::Data => {
            let msg = err.to_string();
            let msg = msg.find(" at line ").map_or(msg.as_str(), |at| &msg[..at]);
            Error::syntax(line, col, msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decoder;

    fn read_all(input: &str) -> Result<Vec<Value>> {
        let mut builder = StructureBuilder::new(Decoder::default());
        let mut tokenizer = JsonTokenizer::new(input.as_bytes());
        let mut values = Vec::new();
        while let Some(value) = tokenizer.next_value(&mut builder)? {
            values.push(value);
        }
        Ok(values)
    }

    #[test]
    fn test_scalars() {
        let values = read_all("1 -2 2.5 true null \"s\"").unwrap();
        assert_eq!(
            values,
            vec![
                Value::from(1),
                Value::from(-2),
                Value::from(2.5),
                Value::Bool(true),
                Value::Null,
                Value::from("s"),
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_values() {
        assert!(read_all("").unwrap().is_empty());
        assert!(read_all("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_cache_spans_top_level_values() {
        let values = read_all(r#"["^ ","name",1] ["^ ","^0",2]"#).unwrap();
        assert_eq!(values[1].as_map().and_then(|m| m.get_str("name")), Some(&Value::from(2)));
    }

    #[test]
    fn test_nested_value_sees_outer_key() {
        let values = read_all(r#"{"abcd":{"^0":1}}"#).unwrap();
        let inner = values[0].as_map().and_then(|m| m.get_str("abcd")).unwrap();
        assert_eq!(inner.as_map().and_then(|m| m.get_str("abcd")), Some(&Value::from(1)));
    }

    #[test]
    fn test_builder_error_survives_unwinding() {
        let err = read_all(r#"[1, ["^7"]]"#).unwrap_err();
        assert!(matches!(err, Error::UnknownCacheCode(ref code) if code == "^7"));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = read_all("[1,\n  }").unwrap_err();
        match err {
            Error::Syntax { line, col, msg } => {
                assert_eq!(line, 2);
                assert!(col > 0);
                assert!(!msg.contains(" at line "));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_input() {
        let err = read_all("[1, 2").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let input = format!("{}{}", "[".repeat(200), "]".repeat(200));
        assert!(read_all(&input).is_err());
    }
}
