//! Read handlers: turning a tag's representation into a value.
//!
//! A [`HandlerRegistry`] maps tag identifiers to [`ReadHandler`]s and carries
//! one [`DefaultHandler`] for tags nobody registered. The registry is built
//! once, wrapped in an `Arc`, and shared read-only by every reader that uses
//! it.
//!
//! Scalar extensions (`"~:name"`, `"~i42"`, ...) are dispatched on their
//! one-character tag with the remainder of the string as rep; composite
//! extensions (`["~#set", [...]]`, `{"~#point": [1, 2]}`) are dispatched on
//! the full tag with the decoded rep.
//!
//! ## Custom handlers
//!
//! ```rust
//! use serde_transit::{Error, Format, HandlerRegistry, Object, Reader, ReaderOptions, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point { x: i64, y: i64 }
//!
//! let options = ReaderOptions::new().with_handler("point", |rep: Value| {
//!     match rep.as_array().map(Vec::as_slice) {
//!         Some([x, y]) => match (x.as_i64(), y.as_i64()) {
//!             (Some(x), Some(y)) => Ok(Value::Object(Object::new(Point { x, y }))),
//!             _ => Err(Error::malformed("point", "coordinates must be integers")),
//!         },
//!         _ => Err(Error::malformed("point", "expected [x, y]")),
//!     }
//! });
//!
//! let mut reader = Reader::with_options(Format::Json, &br#"["~#point", [1, 2]]"#[..], options);
//! let value = reader.read().unwrap();
//! assert_eq!(value.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
//! ```

use crate::{Error, Link, Number, Result, TaggedValue, TransitMap, TransitSet, Value};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Converts the representation of one tag into a value.
///
/// Implementations validate the rep's shape and return
/// [`Error::MalformedRepresentation`] (see [`Error::malformed`]) when it does
/// not fit. Closures `Fn(Value) -> Result<Value>` implement this trait.
pub trait ReadHandler: Send + Sync {
    fn from_rep(&self, rep: Value) -> Result<Value>;
}

impl<F> ReadHandler for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn from_rep(&self, rep: Value) -> Result<Value> {
        self(rep)
    }
}

/// Handles tags with no registered [`ReadHandler`].
///
/// Must not fail: unknown tags are expected when readers and writers evolve
/// independently.
pub trait DefaultHandler: Send + Sync {
    fn from_rep(&self, tag: &str, rep: Value) -> Value;
}

impl<F> DefaultHandler for F
where
    F: Fn(&str, Value) -> Value + Send + Sync,
{
    fn from_rep(&self, tag: &str, rep: Value) -> Value {
        self(tag, rep)
    }
}

/// The stock default handler: wraps tag and rep in a [`TaggedValue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedValueHandler;

impl DefaultHandler for TaggedValueHandler {
    fn from_rep(&self, tag: &str, rep: Value) -> Value {
        Value::Tagged(Box::new(TaggedValue::new(tag, rep)))
    }
}

/// Tag-to-handler mapping plus the fallback for unregistered tags.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{HandlerRegistry, Value};
///
/// let registry = HandlerRegistry::new();
/// assert!(registry.contains(":"));
/// assert!(registry.contains("set"));
///
/// // Unknown tags fall through to the default handler
/// let value = registry.dispatch("point", Value::from(1)).unwrap();
/// assert_eq!(value.as_tagged().map(|t| t.tag.as_str()), Some("point"));
/// ```
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ReadHandler>>,
    default_handler: Arc<dyn DefaultHandler>,
}

impl HandlerRegistry {
    /// Creates a registry holding the built-in handlers.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }

    /// Creates a registry with no handlers at all; every tag goes to the
    /// default handler.
    #[must_use]
    pub fn empty() -> Self {
        HandlerRegistry {
            handlers: HashMap::new(),
            default_handler: Arc::new(TaggedValueHandler),
        }
    }

    /// Registers `handler` for `tag`, replacing any earlier handler (built-in
    /// or not) for that tag.
    #[must_use]
    pub fn with_handler<H>(mut self, tag: impl Into<String>, handler: H) -> Self
    where
        H: ReadHandler + 'static,
    {
        self.insert(tag, handler);
        self
    }

    /// Replaces the default handler.
    #[must_use]
    pub fn with_default_handler<D>(mut self, handler: D) -> Self
    where
        D: DefaultHandler + 'static,
    {
        self.default_handler = Arc::new(handler);
        self
    }

    pub fn insert<H>(&mut self, tag: impl Into<String>, handler: H)
    where
        H: ReadHandler + 'static,
    {
        self.handlers.insert(tag.into(), Arc::new(handler));
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&dyn ReadHandler> {
        self.handlers.get(tag).map(|h| &**h)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Runs the handler registered for `tag`, or the default handler.
    ///
    /// Errors from a registered handler are returned as-is; the default
    /// handler is never consulted as a fallback for a failing handler.
    pub fn dispatch(&self, tag: &str, rep: Value) -> Result<Value> {
        match self.handlers.get(tag) {
            Some(handler) => handler.from_rep(rep),
            None => {
                trace!(tag, "no handler registered, using default handler");
                Ok(self.default_handler.from_rep(tag, rep))
            }
        }
    }

    fn register_builtins(&mut self) {
        self.insert("_", |_: Value| -> Result<Value> { Ok(Value::Null) });
        self.insert("?", read_bool);
        self.insert("i", read_integer);
        self.insert("n", read_bigint);
        self.insert("d", read_float);
        self.insert("f", read_decimal);
        self.insert("z", read_special_number);
        self.insert(":", |rep: Value| -> Result<Value> {
            Ok(Value::Keyword(rep_string(":", rep)?))
        });
        self.insert("$", |rep: Value| -> Result<Value> {
            Ok(Value::Symbol(rep_string("$", rep)?))
        });
        self.insert("r", |rep: Value| -> Result<Value> { Ok(Value::Uri(rep_string("r", rep)?)) });
        self.insert("c", read_char);
        self.insert("b", read_bytes);
        self.insert("u", read_uuid);
        self.insert("t", read_rfc3339);
        self.insert("m", read_millis);
        self.insert("'", Ok::<Value, Error>);
        self.insert("set", read_set);
        self.insert("list", read_list);
        self.insert("cmap", read_cmap);
        self.insert("link", read_link);
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("HandlerRegistry").field("tags", &tags).finish()
    }
}

fn rep_string(tag: &str, rep: Value) -> Result<String> {
    match rep {
        Value::String(s) => Ok(s),
        other => Err(Error::malformed(tag, format!("expected string, found {}", other.kind()))),
    }
}

fn rep_array(tag: &str, rep: Value) -> Result<Vec<Value>> {
    match rep {
        Value::Array(items) | Value::List(items) => Ok(items),
        other => Err(Error::malformed(tag, format!("expected array, found {}", other.kind()))),
    }
}

fn read_bool(rep: Value) -> Result<Value> {
    match rep_string("?", rep)?.as_str() {
        "t" => Ok(Value::Bool(true)),
        "f" => Ok(Value::Bool(false)),
        other => Err(Error::malformed("?", format!("expected t or f, found {:?}", other))),
    }
}

fn read_integer(rep: Value) -> Result<Value> {
    match rep {
        Value::Number(Number::Integer(i)) => Ok(Value::from(i)),
        Value::BigInt(i) => Ok(Value::BigInt(i)),
        Value::String(s) => match s.parse::<i64>() {
            Ok(i) => Ok(Value::from(i)),
            Err(_) => parse_bigint("i", &s).map(Value::BigInt),
        },
        other => Err(Error::malformed("i", format!("expected integer, found {}", other.kind()))),
    }
}

fn read_bigint(rep: Value) -> Result<Value> {
    match rep {
        Value::Number(Number::Integer(i)) => Ok(Value::BigInt(BigInt::from(i))),
        Value::BigInt(i) => Ok(Value::BigInt(i)),
        Value::String(s) => parse_bigint("n", &s).map(Value::BigInt),
        other => Err(Error::malformed("n", format!("expected integer, found {}", other.kind()))),
    }
}

fn parse_bigint(tag: &str, s: &str) -> Result<BigInt> {
    s.parse::<BigInt>()
        .map_err(|_| Error::malformed(tag, format!("invalid integer {:?}", s)))
}

fn read_float(rep: Value) -> Result<Value> {
    match rep {
        Value::Number(n) => Ok(Value::Number(Number::from_f64(n.as_f64()))),
        Value::String(s) => s
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| Error::malformed("d", format!("invalid float {:?}", s))),
        other => Err(Error::malformed("d", format!("expected float, found {}", other.kind()))),
    }
}

fn read_decimal(rep: Value) -> Result<Value> {
    let s = rep_string("f", rep)?;
    let unsigned = s.strip_prefix(&['-', '+'][..]).unwrap_or(&s);
    let (mantissa, exponent) = match unsigned.split_once(|c| c == 'e' || c == 'E') {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits_ok = !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit());
    let exponent_ok = exponent.map_or(true, |e| e.parse::<i64>().is_ok());
    if digits_ok && exponent_ok {
        Ok(Value::Decimal(s))
    } else {
        Err(Error::malformed("f", format!("invalid decimal {:?}", s)))
    }
}

fn read_special_number(rep: Value) -> Result<Value> {
    match rep_string("z", rep)?.as_str() {
        "NaN" => Ok(Value::Number(Number::NaN)),
        "INF" => Ok(Value::Number(Number::Infinity)),
        "-INF" => Ok(Value::Number(Number::NegativeInfinity)),
        other => Err(Error::malformed("z", format!("unknown special number {:?}", other))),
    }
}

fn read_char(rep: Value) -> Result<Value> {
    let s = rep_string("c", rep)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Char(c)),
        _ => Err(Error::malformed("c", format!("expected one character, found {:?}", s))),
    }
}

fn read_bytes(rep: Value) -> Result<Value> {
    match rep {
        Value::Bytes(b) => Ok(Value::Bytes(b)),
        Value::String(s) => base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map(Value::Bytes)
            .map_err(|e| Error::malformed("b", e)),
        other => Err(Error::malformed("b", format!("expected base64 string, found {}", other.kind()))),
    }
}

fn read_uuid(rep: Value) -> Result<Value> {
    match rep {
        Value::String(s) => Uuid::parse_str(&s)
            .map(Value::Uuid)
            .map_err(|e| Error::malformed("u", e)),
        Value::Array(items) => match items.as_slice() {
            [hi, lo] => match (hi.as_i64(), lo.as_i64()) {
                (Some(hi), Some(lo)) => Ok(Value::Uuid(Uuid::from_u64_pair(hi as u64, lo as u64))),
                _ => Err(Error::malformed("u", "uuid halves must be 64-bit integers")),
            },
            _ => Err(Error::malformed("u", "expected [high, low] pair")),
        },
        other => Err(Error::malformed("u", format!("expected uuid, found {}", other.kind()))),
    }
}

fn read_rfc3339(rep: Value) -> Result<Value> {
    let s = rep_string("t", rep)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| Value::Date(dt.with_timezone(&Utc)))
        .map_err(|e| Error::malformed("t", format!("{} in {:?}", e, s)))
}

fn read_millis(rep: Value) -> Result<Value> {
    let millis = match rep {
        Value::Number(Number::Integer(i)) => i,
        Value::BigInt(i) => i
            .to_i64()
            .ok_or_else(|| Error::malformed("m", "timestamp out of range"))?,
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| Error::malformed("m", format!("invalid timestamp {:?}", s)))?,
        other => {
            return Err(Error::malformed(
                "m",
                format!("expected milliseconds, found {}", other.kind()),
            ))
        }
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Value::Date)
        .ok_or_else(|| Error::malformed("m", "timestamp out of range"))
}

fn read_set(rep: Value) -> Result<Value> {
    let items = rep_array("set", rep)?;
    Ok(Value::Set(items.into_iter().collect::<TransitSet>()))
}

fn read_list(rep: Value) -> Result<Value> {
    Ok(Value::List(rep_array("list", rep)?))
}

fn read_cmap(rep: Value) -> Result<Value> {
    let items = rep_array("cmap", rep)?;
    if items.len() % 2 != 0 {
        return Err(Error::malformed("cmap", "odd number of keys and values"));
    }
    let mut map = TransitMap::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        map.insert(k, v);
    }
    Ok(Value::Map(map))
}

fn read_link(rep: Value) -> Result<Value> {
    let map = match rep {
        Value::Map(map) => map,
        other => return Err(Error::malformed("link", format!("expected map, found {}", other.kind()))),
    };
    let field = |name: &str| -> Result<Option<String>> {
        match map.get_str(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) | Some(Value::Uri(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::malformed(
                "link",
                format!("field {} must be a string, found {}", name, other.kind()),
            )),
        }
    };
    let href = field("href")?.ok_or_else(|| Error::malformed("link", "missing href"))?;
    let rel = field("rel")?.ok_or_else(|| Error::malformed("link", "missing rel"))?;
    let render = field("render")?;
    if let Some(render) = render.as_deref() {
        if render != "link" && render != "image" {
            return Err(Error::malformed("link", format!("invalid render {:?}", render)));
        }
    }
    Ok(Value::Link(Box::new(Link {
        href,
        rel,
        name: field("name")?,
        prompt: field("prompt")?,
        render,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(tag: &str, rep: Value) -> Result<Value> {
        HandlerRegistry::new().dispatch(tag, rep)
    }

    #[test]
    fn test_scalar_builtins() {
        assert_eq!(dispatch("?", Value::from("t")).unwrap(), Value::Bool(true));
        assert_eq!(dispatch("i", Value::from("42")).unwrap(), Value::from(42));
        assert_eq!(dispatch(":", Value::from("kw")).unwrap(), Value::Keyword("kw".into()));
        assert_eq!(dispatch("c", Value::from("x")).unwrap(), Value::Char('x'));
        assert_eq!(dispatch("z", Value::from("-INF")).unwrap(), Value::Number(Number::NegativeInfinity));
        assert_eq!(dispatch("_", Value::from("")).unwrap(), Value::Null);
    }

    #[test]
    fn test_large_integer_becomes_bigint() {
        let value = dispatch("i", Value::from("123456789012345678901234567890")).unwrap();
        assert_eq!(
            value.as_bigint().map(ToString::to_string).as_deref(),
            Some("123456789012345678901234567890")
        );
    }

    #[test]
    fn test_decimal_validation() {
        assert_eq!(dispatch("f", Value::from("1.50")).unwrap(), Value::Decimal("1.50".into()));
        assert!(dispatch("f", Value::from("-2.5e10")).is_ok());
        assert!(matches!(
            dispatch("f", Value::from("abc")),
            Err(Error::MalformedRepresentation { .. })
        ));
    }

    #[test]
    fn test_uuid_forms_agree() {
        let text = dispatch("u", Value::from("5a2cbea3-e8c6-428b-b525-21239370dd55")).unwrap();
        let uuid = match &text {
            Value::Uuid(u) => *u,
            other => panic!("expected uuid, got {:?}", other),
        };
        let (hi, lo) = uuid.as_u64_pair();
        let pair = dispatch(
            "u",
            Value::Array(vec![Value::from(hi as i64), Value::from(lo as i64)]),
        )
        .unwrap();
        assert_eq!(text, pair);
    }

    #[test]
    fn test_time_forms_agree() {
        let iso = dispatch("t", Value::from("1985-04-12T23:20:50.520Z")).unwrap();
        let millis = dispatch("m", Value::from(482196050520i64)).unwrap();
        assert_eq!(iso, millis);
        assert_eq!(dispatch("m", Value::from("482196050520")).unwrap(), millis);
    }

    #[test]
    fn test_bytes_base64() {
        assert_eq!(
            dispatch("b", Value::from("aGVsbG8=")).unwrap(),
            Value::Bytes(b"hello".to_vec())
        );
        assert!(dispatch("b", Value::from("***")).is_err());
    }

    #[test]
    fn test_cmap_requires_pairs() {
        let ok = dispatch(
            "cmap",
            Value::Array(vec![Value::Array(vec![Value::from(1)]), Value::from("one")]),
        )
        .unwrap();
        assert_eq!(ok.as_map().map(TransitMap::len), Some(1));
        assert!(dispatch("cmap", Value::Array(vec![Value::from(1)])).is_err());
    }

    #[test]
    fn test_link_fields() {
        let mut map = TransitMap::new();
        map.insert(Value::from("href"), Value::Uri("http://example.com".into()));
        map.insert(Value::from("rel"), Value::from("self"));
        map.insert(Value::from("render"), Value::from("image"));
        let link = match dispatch("link", Value::Map(map)).unwrap() {
            Value::Link(link) => link,
            other => panic!("expected link, got {:?}", other),
        };
        assert_eq!(link.href, "http://example.com");
        assert_eq!(link.render.as_deref(), Some("image"));
        assert_eq!(link.name, None);
    }

    #[test]
    fn test_builtin_shape_errors_are_not_masked() {
        let err = dispatch("set", Value::from("nope")).unwrap_err();
        assert!(matches!(err, Error::MalformedRepresentation { ref tag, .. } if tag == "set"));
    }

    #[test]
    fn test_user_handler_overrides_builtin() {
        let registry = HandlerRegistry::new().with_handler(":", |rep: Value| -> Result<Value> { Ok(rep) });
        assert_eq!(registry.dispatch(":", Value::from("k")).unwrap(), Value::from("k"));
    }

    #[test]
    fn test_custom_default_handler() {
        let registry = HandlerRegistry::empty()
            .with_default_handler(|tag: &str, _rep: Value| Value::from(format!("unknown {}", tag)));
        assert_eq!(registry.dispatch("x", Value::Null).unwrap(), Value::from("unknown x"));
    }
}
