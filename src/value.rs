//! Dynamic value representation for decoded Transit data.
//!
//! This module provides the [`Value`] enum, the closed set of shapes a Transit
//! reader can hand back: JSON-like primitives, the format's richer scalar
//! types, its collections, and domain objects built by user read handlers.
//!
//! ## Core Types
//!
//! - [`Value`]: any decoded Transit value
//! - [`Number`]: integers and floats, including `NaN` and the infinities
//! - [`Link`]: the hypermedia `link` extension type
//! - [`TaggedValue`]: the fallback for tags nobody registered a handler for
//! - [`Object`]: a handler-produced domain object, recovered with
//!   [`Object::downcast_ref`]
//!
//! ## Usage Patterns
//!
//! ```rust
//! use serde_transit::{Number, Value};
//!
//! let value = Value::from(42);
//! assert!(value.is_number());
//! assert_eq!(value.as_i64(), Some(42));
//!
//! let keyword = Value::Keyword("status".to_string());
//! assert_eq!(keyword.as_keyword(), Some("status"));
//! assert_eq!(keyword.to_string(), ":status");
//! ```
//!
//! ## Equality and Hashing
//!
//! `Value` is `Eq + Hash` so that any value can key a [`TransitMap`] or be a
//! member of a [`TransitSet`]. Floats compare by bit pattern, which makes
//! `NaN` equal to itself and keeps `0.0` and `-0.0` apart.

use crate::{TransitMap, TransitSet};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;
use uuid::Uuid;

/// A dynamically-typed representation of any decoded Transit value.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{Format, Reader, Value};
///
/// let mut reader = Reader::new(Format::Json, &br#"["~:a", "~$b", "~i42"]"#[..]);
/// let value = reader.read().unwrap();
///
/// let items = value.as_array().unwrap();
/// assert_eq!(items[0], Value::Keyword("a".to_string()));
/// assert_eq!(items[1], Value::Symbol("b".to_string()));
/// assert_eq!(items[2].as_i64(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    BigInt(BigInt),
    /// Arbitrary-precision decimal, kept in its textual form.
    Decimal(String),
    String(String),
    Keyword(String),
    Symbol(String),
    Char(char),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Uri(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(TransitSet),
    Map(TransitMap),
    Link(Box<Link>),
    Tagged(Box<TaggedValue>),
    Object(Object),
}

/// A numeric value that can be an integer, float, or special float value.
///
/// # Examples
///
/// ```rust
/// use serde_transit::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// assert!(Number::NaN.is_special());
/// assert_eq!(Number::NaN, Number::NaN);
/// ```
#[derive(Clone, Debug)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` if this is a special value (Infinity, -Infinity, or NaN).
    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        matches!(
            self,
            Number::Infinity | Number::NegativeInfinity | Number::NaN
        )
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Returns `Some(i64)` for integers and floats with no fractional part
    /// that fit in i64 range. Returns `None` for special values and
    /// out-of-range floats.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    /// Classifies a float, folding the IEEE special values into their variants.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a.to_bits() == b.to_bits(),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Number::Integer(i) => i.hash(state),
            Number::Float(f) => f.to_bits().hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Infinity => write!(f, "INF"),
            Number::NegativeInfinity => write!(f, "-INF"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
    }
}

/// A hypermedia link, decoded from the `link` tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub name: Option<String>,
    pub prompt: Option<String>,
    /// Either `"link"` or `"image"` when present.
    pub render: Option<String>,
}

/// A value whose tag had no registered handler.
///
/// The stock default handler wraps the tag and its decoded rep in this type
/// so that unknown extensions survive a read instead of aborting it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedValue {
    pub tag: String,
    pub rep: Value,
}

impl TaggedValue {
    pub fn new(tag: impl Into<String>, rep: Value) -> Self {
        TaggedValue {
            tag: tag.into(),
            rep,
        }
    }
}

/// A domain object produced by a user-supplied read handler.
///
/// The object is shared behind an `Arc`, so cloning a `Value` holding one is
/// cheap. Two objects are equal when they hold the same type and that type's
/// `PartialEq` says so.
///
/// # Examples
///
/// ```rust
/// use serde_transit::Object;
///
/// #[derive(Debug, PartialEq)]
/// struct Point { x: i64, y: i64 }
///
/// let obj = Object::new(Point { x: 1, y: 2 });
/// assert_eq!(obj.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
/// assert!(obj.downcast_ref::<String>().is_none());
/// assert_eq!(obj, Object::new(Point { x: 1, y: 2 }));
/// ```
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    eq: fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool,
    debug: fn(&(dyn Any + Send + Sync), &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Object {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Object {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
            eq: object_eq::<T>,
            debug: object_debug::<T>,
        }
    }

    /// Returns the wrapped object if it is of type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Name of the wrapped Rust type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn inner_type_id(&self) -> TypeId {
        Any::type_id(&*self.inner)
    }
}

fn object_eq<T: Any + PartialEq>(a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn object_debug<T: Any + fmt::Debug>(
    value: &(dyn Any + Send + Sync),
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => value.fmt(f),
        None => f.write_str("<object>"),
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.inner_type_id() == other.inner_type_id() && (self.eq)(&*self.inner, &*other.inner)
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner_type_id().hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug)(&*self.inner, f)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.hash(state),
            Value::BigInt(i) => i.hash(state),
            Value::Decimal(s)
            | Value::String(s)
            | Value::Keyword(s)
            | Value::Symbol(s)
            | Value::Uri(s) => s.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Array(items) | Value::List(items) => items.hash(state),
            Value::Set(set) => set.hash(state),
            Value::Map(map) => map.hash(state),
            Value::Link(link) => link.hash(state),
            Value::Tagged(tagged) => tagged.hash(state),
            Value::Object(obj) => obj.hash(state),
        }
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns `true` if a read handler produced this value as a domain object.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        matches!(self, Value::Tagged(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// Keywords and symbols are not strings; see [`Value::as_keyword`].
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Value::Keyword(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an i64 integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&TransitMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_set(&self) -> Option<&TransitSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(bi) => Some(bi),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_tagged(&self) -> Option<&TaggedValue> {
        match self {
            Value::Tagged(tagged) => Some(tagged),
            _ => None,
        }
    }

    /// If the value is a handler-produced object of type `T`, returns it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_transit::{Object, Value};
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct Celsius(f64);
    ///
    /// let value = Value::Object(Object::new(Celsius(21.5)));
    /// assert_eq!(value.downcast_ref::<Celsius>(), Some(&Celsius(21.5)));
    /// ```
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short name of the variant, used in handler error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "big integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::Char(_) => "char",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Uri(_) => "uri",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Link(_) => "link",
            Value::Tagged(_) => "tagged value",
            Value::Object(_) => "object",
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[&Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::BigInt(bi) => write!(f, "{}N", bi),
            Value::Decimal(d) => write!(f, "{}M", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Keyword(k) => write!(f, ":{}", k),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "\\{}", c),
            Value::Bytes(b) => write!(f, "#bytes[{}]", b.len()),
            Value::Uuid(u) => write!(f, "#uuid \"{}\"", u),
            Value::Uri(u) => write!(f, "#uri \"{}\"", u),
            Value::Date(dt) => write!(f, "#inst \"{}\"", dt.to_rfc3339()),
            Value::Array(items) => write_seq(f, "[", &items.iter().collect::<Vec<_>>(), "]"),
            Value::List(items) => write_seq(f, "(", &items.iter().collect::<Vec<_>>(), ")"),
            Value::Set(set) => write_seq(f, "#{", &set.iter().collect::<Vec<_>>(), "}"),
            Value::Map(map) => {
                let flat: Vec<&Value> = map.iter().flat_map(|(k, v)| [k, v]).collect();
                write_seq(f, "{", &flat, "}")
            }
            Value::Link(link) => write!(f, "#link \"{}\"", link.href),
            Value::Tagged(tagged) => write!(f, "#{} {}", tagged.tag, tagged.rep),
            Value::Object(obj) => write!(f, "#object[{}]", obj.type_name()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{Error as _, SerializeMap, SerializeSeq};

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(n.as_f64()),
            Value::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
            Value::Decimal(s)
            | Value::String(s)
            | Value::Keyword(s)
            | Value::Symbol(s)
            | Value::Uri(s) => serializer.serialize_str(s),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Uuid(u) => serializer.serialize_str(&u.to_string()),
            Value::Date(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::Array(items) | Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Set(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for element in set.iter() {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Link(link) => {
                let mut out = serializer.serialize_map(None)?;
                out.serialize_entry("href", &link.href)?;
                out.serialize_entry("rel", &link.rel)?;
                if let Some(name) = &link.name {
                    out.serialize_entry("name", name)?;
                }
                if let Some(prompt) = &link.prompt {
                    out.serialize_entry("prompt", prompt)?;
                }
                if let Some(render) = &link.render {
                    out.serialize_entry("render", render)?;
                }
                out.end()
            }
            Value::Tagged(tagged) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry(&tagged.tag, &tagged.rep)?;
                out.end()
            }
            Value::Object(obj) => Err(S::Error::custom(format!(
                "cannot serialize handler object of type {}",
                obj.type_name()
            ))),
        }
    }
}

// TryFrom implementations for extracting values from Value
impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(Number::Integer(i)) => Ok(i),
            Value::Number(Number::Float(f)) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Ok(f as i64)
                } else {
                    Err(crate::Error::custom(format!(
                        "cannot convert float {} to i64",
                        f
                    )))
                }
            }
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(crate::Error::custom(format!(
                "expected number, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) | Value::Keyword(s) | Value::Symbol(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Integer(value as i64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from_f64(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<TransitMap> for Value {
    fn from(value: TransitMap) -> Self {
        Value::Map(value)
    }
}

impl From<TransitSet> for Value {
    fn from(value: TransitSet) -> Self {
        Value::Set(value)
    }
}

impl From<TaggedValue> for Value {
    fn from(value: TaggedValue) -> Self {
        Value::Tagged(Box::new(value))
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}
