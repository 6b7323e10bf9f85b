//! Deserializing Rust types from decoded Transit values.
//!
//! [`Deserializer`] walks a [`Value`] and drives any `serde::Deserialize`
//! implementation from it. Transit's richer types are presented through
//! serde's data model:
//!
//! - keywords, symbols, URIs, UUIDs and dates are visited as strings
//! - lists and sets are sequences; maps may have keys of any type
//! - links are maps with `href`, `rel` and the optional fields present
//! - tagged values are single-entry maps `{tag: rep}`, which is also how an
//!   externally tagged enum variant is read
//!
//! ## Usage
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_transit::from_str;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, tags: Vec<String> }
//!
//! let data: Data = from_str(r#"["^ ","~:x",1,"~:tags",["~#set",["~:a"]]]"#).unwrap();
//! assert_eq!(data, Data { x: 1, tags: vec!["a".to_string()] });
//! ```

use crate::{Error, Link, Number, Result, TaggedValue, TransitMap, Value};
use num_traits::ToPrimitive;
use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};

/// Deserializer over an owned [`Value`].
///
/// Created with [`Deserializer::new`] or through
/// [`IntoDeserializer`](serde::de::IntoDeserializer).
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Deserializer;

    fn into_deserializer(self) -> Deserializer {
        Deserializer::new(self)
    }
}

fn link_map(link: Link) -> TransitMap {
    let mut map = TransitMap::with_capacity(5);
    map.insert(Value::from("href"), Value::Uri(link.href));
    map.insert(Value::from("rel"), Value::String(link.rel));
    let optional = [("name", link.name), ("prompt", link.prompt), ("render", link.render)];
    for (key, field) in optional {
        if let Some(field) = field {
            map.insert(Value::from(key), Value::String(field));
        }
    }
    map
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(n) => visitor.visit_f64(n.as_f64()),
            Value::BigInt(bi) => {
                if let Some(i) = bi.to_i128() {
                    visitor.visit_i128(i)
                } else if let Some(u) = bi.to_u128() {
                    visitor.visit_u128(u)
                } else {
                    visitor.visit_string(bi.to_string())
                }
            }
            Value::Decimal(s)
            | Value::String(s)
            | Value::Keyword(s)
            | Value::Symbol(s)
            | Value::Uri(s) => visitor.visit_string(s),
            Value::Char(c) => visitor.visit_char(c),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::Uuid(u) => visitor.visit_string(u.to_string()),
            Value::Date(dt) => visitor.visit_string(dt.to_rfc3339()),
            Value::Array(items) | Value::List(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Set(set) => visitor.visit_seq(SeqDeserializer::new(set.into_iter().collect())),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Link(link) => visitor.visit_map(MapDeserializer::new(link_map(*link))),
            Value::Tagged(tagged) => {
                let mut map = TransitMap::with_capacity(1);
                map.insert(Value::String(tagged.tag), tagged.rep);
                visitor.visit_map(MapDeserializer::new(map))
            }
            Value::Object(obj) => Err(Error::custom(format!(
                "cannot deserialize a {} handler object",
                obj.type_name()
            ))),
        }
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Decimal(ref s) => match s.parse::<f64>() {
                Ok(f) => visitor.visit_f64(f),
                Err(_) => Err(Error::custom(format!("invalid decimal: {}", s))),
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) | Value::Keyword(s) | Value::Symbol(s) => {
                visitor.visit_enum(EnumDeserializer::new(s, None))
            }
            Value::Tagged(tagged) => {
                let TaggedValue { tag, rep } = *tagged;
                visitor.visit_enum(EnumDeserializer::new(tag, Some(rep)))
            }
            Value::Map(map) if map.len() == 1 => {
                let mut iter = map.into_iter();
                match iter.next() {
                    Some((Value::String(k), v))
                    | Some((Value::Keyword(k), v))
                    | Some((Value::Symbol(k), v)) => visitor.visit_enum(EnumDeserializer::new(k, Some(v))),
                    _ => Err(Error::custom("enum variant key must be a string or keyword")),
                }
            }
            other => Err(Error::custom(format!(
                "expected enum as string, keyword or single-entry map, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(Deserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<Value, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: TransitMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Deserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl EnumDeserializer {
    fn new(variant: String, value: Option<Value>) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Deserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            _ => Err(Error::custom("Expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::custom("Expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(items)) | Some(Value::List(items)) => {
                visitor.visit_seq(SeqDeserializer::new(items))
            }
            _ => Err(Error::custom("Expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("Expected struct variant")),
        }
    }
}
