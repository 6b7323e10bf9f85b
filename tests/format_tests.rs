//! Built-in scalar and composite extensions, one case per tag.

use chrono::{TimeZone, Utc};
use num_bigint::BigInt;
use serde_transit::{Error, Format, Number, Reader, Value};

fn read(input: &str) -> Value {
    Reader::new(Format::Json, input.as_bytes())
        .read()
        .unwrap_or_else(|e| panic!("failed to read {}: {}", input, e))
}

fn read_err(input: &str) -> Error {
    Reader::new(Format::Json, input.as_bytes())
        .read()
        .expect_err("expected a decoding error")
}

/// Wraps a scalar in the quote tag, the way top-level scalars are written.
fn quoted(scalar: &str) -> String {
    format!(r#"["~#'","{}"]"#, scalar)
}

#[test]
fn test_null_and_bool() {
    assert_eq!(read(&quoted("~_")), Value::Null);
    assert_eq!(read(&quoted("~?t")), Value::Bool(true));
    assert_eq!(read(&quoted("~?f")), Value::Bool(false));
}

#[test]
fn test_integers() {
    assert_eq!(read(&quoted("~i42")), Value::from(42));
    assert_eq!(read(&quoted("~i-7")), Value::from(-7));
    assert_eq!(
        read(&quoted("~i123456789012345678901234567890")),
        Value::BigInt("123456789012345678901234567890".parse::<BigInt>().unwrap())
    );
    assert_eq!(read(&quoted("~n5")), Value::BigInt(BigInt::from(5)));
}

#[test]
fn test_floats_and_decimals() {
    assert_eq!(read(&quoted("~d1.5")), Value::from(1.5));
    assert_eq!(read(&quoted("~f1.10")), Value::Decimal("1.10".into()));
    assert_eq!(read(&quoted("~zINF")), Value::Number(Number::Infinity));
    assert_eq!(read(&quoted("~z-INF")), Value::Number(Number::NegativeInfinity));
    assert_eq!(read(&quoted("~zNaN")), Value::Number(Number::NaN));
}

#[test]
fn test_names() {
    assert_eq!(read(&quoted("~:key")), Value::Keyword("key".into()));
    assert_eq!(read(&quoted("~$sym")), Value::Symbol("sym".into()));
    assert_eq!(read(&quoted("~cx")), Value::Char('x'));
    assert_eq!(
        read(&quoted("~rhttp://example.com/a")),
        Value::Uri("http://example.com/a".into())
    );
}

#[test]
fn test_escapes() {
    assert_eq!(read(&quoted("~~lead")), Value::from("~lead"));
    assert_eq!(read(&quoted("~^lead")), Value::from("^lead"));
    assert_eq!(read(&quoted("~`lead")), Value::from("`lead"));
    assert_eq!(read(&quoted("plain")), Value::from("plain"));
}

#[test]
fn test_bytes() {
    assert_eq!(read(&quoted("~baGVsbG8=")), Value::Bytes(b"hello".to_vec()));
}

#[test]
fn test_uuid_forms() {
    let expected = read(&quoted("~u531a379e-31bb-4ce1-8690-158dceb64be6"));
    let uuid = match &expected {
        Value::Uuid(u) => *u,
        other => panic!("expected uuid, got {:?}", other),
    };
    let (hi, lo) = uuid.as_u64_pair();
    let pair = format!(r#"["~#u",[{},{}]]"#, hi as i64, lo as i64);
    assert_eq!(read(&pair), expected);
}

#[test]
fn test_dates() {
    let expected = Value::Date(Utc.timestamp_millis_opt(1_482_000_000_000).unwrap());
    assert_eq!(read(&quoted("~m1482000000000")), expected);
    assert_eq!(read(&quoted("~t2016-12-17T18:40:00.000Z")), expected);
    assert_eq!(read(r#"["~#m",1482000000000]"#), expected);
}

#[test]
fn test_link() {
    let value = read(r#"["~#link",{"href":"~rhttp://x.org","rel":"self","render":"image"}]"#);
    match value {
        Value::Link(link) => {
            assert_eq!(link.href, "http://x.org");
            assert_eq!(link.rel, "self");
            assert_eq!(link.render.as_deref(), Some("image"));
            assert_eq!(link.name, None);
        }
        other => panic!("expected link, got {:?}", other),
    }
}

#[test]
fn test_unregistered_scalar_tag() {
    let value = read(&quoted("~qrest"));
    let tagged = value.as_tagged().unwrap();
    assert_eq!(tagged.tag, "q");
    assert_eq!(tagged.rep, Value::from("rest"));
}

#[test]
fn test_malformed_builtin_reps() {
    for (input, tag) in [
        (quoted("~?x"), "?"),
        (quoted("~iabc"), "i"),
        (quoted("~cab"), "c"),
        (quoted("~znope"), "z"),
        (quoted("~unot-a-uuid"), "u"),
        (quoted("~tyesterday"), "t"),
        (quoted("~f1.2.3"), "f"),
        (r#"["~#set",1]"#.to_string(), "set"),
        (r#"["~#cmap",[1]]"#.to_string(), "cmap"),
        (r#"["~#link",{"rel":"self"}]"#.to_string(), "link"),
    ] {
        match read_err(&input) {
            Error::MalformedRepresentation { tag: got, .. } => assert_eq!(got, tag, "{}", input),
            other => panic!("{}: expected malformed rep, got {:?}", input, other),
        }
    }
}

#[test]
fn test_odd_map_as_array() {
    assert!(matches!(
        read_err(r#"["^ ","a"]"#),
        Error::MalformedRepresentation { ref tag, .. } if tag == "^ "
    ));
}

#[test]
fn test_stray_sentinel_is_a_string() {
    assert_eq!(
        read(r#"[1,"^ "]"#),
        Value::Array(vec![Value::from(1), Value::from("^ ")])
    );
}

#[test]
fn test_tag_without_rep() {
    assert_eq!(read(r#"["~#'"]"#), Value::Null);
}
