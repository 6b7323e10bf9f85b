use serde::Deserialize;
use serde_transit::{
    from_str, Error, Format, HandlerRegistry, Number, Object, Reader, ReaderOptions, Result,
    TaggedValue, TransitMap, Value,
};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

fn point_handler(rep: Value) -> Result<Value> {
    match rep.as_array().map(Vec::as_slice) {
        Some([x, y]) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Ok(Value::Object(Object::new(Point { x, y }))),
            _ => Err(Error::malformed("point", "coordinates must be integers")),
        },
        _ => Err(Error::malformed("point", "expected two coordinates")),
    }
}

fn read_json(input: &str) -> Result<Value> {
    Reader::new(Format::Json, input.as_bytes()).read()
}

fn read_json_with(input: &str, options: ReaderOptions) -> Result<Value> {
    Reader::with_options(Format::Json, input.as_bytes(), options).read()
}

fn map_of(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect(),
    )
}

#[test]
fn test_map_as_array() {
    let value = read_json(r#"["^ ","a",1,"b",2]"#).unwrap();
    assert_eq!(value, map_of(vec![("a", Value::from(1)), ("b", Value::from(2))]));
}

#[test]
fn test_point_with_registered_handler() {
    let options = ReaderOptions::new().with_handler("point", point_handler);
    let value = read_json_with(r#"["~#point",[1,2]]"#, options).unwrap();
    assert_eq!(value.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
}

#[test]
fn test_point_without_handler_goes_to_default() {
    let value = read_json(r#"["~#point",[1,2]]"#).unwrap();
    assert_eq!(
        value,
        Value::Tagged(Box::new(TaggedValue::new(
            "point",
            Value::Array(vec![Value::from(1), Value::from(2)])
        )))
    );
}

#[test]
fn test_custom_default_handler() {
    let options = ReaderOptions::new().with_default_handler(|tag: &str, _rep: Value| Value::from(tag));
    let value = read_json_with(r#"["~#unknown",null]"#, options).unwrap();
    assert_eq!(value, Value::from("unknown"));
}

#[test]
fn test_map_form_equals_array_form() {
    let options = ReaderOptions::new().with_handler("point", point_handler);
    let from_array = read_json_with(r#"["~#point",[1,2]]"#, options.clone()).unwrap();
    let from_map = read_json_with(r#"{"~#point":[1,2]}"#, options).unwrap();
    assert_eq!(from_array, from_map);

    let untagged_array = read_json(r#"["~#point",[1,2]]"#).unwrap();
    let untagged_map = read_json(r#"{"~#point":[1,2]}"#).unwrap();
    assert_eq!(untagged_array, untagged_map);
}

#[test]
fn test_handler_error_is_not_masked() {
    let options = ReaderOptions::new().with_handler("point", point_handler);
    let err = read_json_with(r#"["~#point",[1]]"#, options).unwrap_err();
    assert!(matches!(err, Error::MalformedRepresentation { ref tag, .. } if tag == "point"));
}

#[test]
fn test_streaming_order() {
    let mut seen = Vec::new();
    Reader::new(Format::Json, &br#"1 "a" true"#[..])
        .for_each(|value| seen.push(value))
        .unwrap();
    assert_eq!(seen, vec![Value::from(1), Value::from("a"), Value::Bool(true)]);
}

#[test]
fn test_stopping_early_leaves_input_unread() {
    let mut values = Reader::new(Format::Json, &br#"1 2 ] garbage"#[..]).into_values();
    assert_eq!(values.next().unwrap().unwrap(), Value::from(1));
    assert_eq!(values.next().unwrap().unwrap(), Value::from(2));
}

#[test]
fn test_cached_key_decodes_three_times() {
    let value = read_json(r#"[{"color":1},{"^0":2},{"^0":3}]"#).unwrap();
    let maps = value.as_array().unwrap();
    for (map, expected) in maps.iter().zip(1..) {
        assert_eq!(map.as_map().and_then(|m| m.get_str("color")), Some(&Value::from(expected)));
    }
}

#[test]
fn test_code_before_referent_fails() {
    let err = read_json(r#"[{"^0":1},{"color":2}]"#).unwrap_err();
    assert!(matches!(err, Error::UnknownCacheCode(ref code) if code == "^0"));
}

#[test]
fn test_cached_tag_identifier() {
    let value = read_json(r#"[["~#list",[1]],["^0",[2]]]"#).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![
            Value::List(vec![Value::from(1)]),
            Value::List(vec![Value::from(2)]),
        ])
    );
}

#[test]
fn test_cached_keyword_value() {
    let value = read_json(r#"["~:status","^0"]"#).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::Keyword("status".into()), Value::Keyword("status".into())])
    );
}

#[test]
fn test_plain_map_order_is_irrelevant() {
    assert_eq!(
        read_json(r#"{"a":1,"b":2}"#).unwrap(),
        read_json(r#"{"b":2,"a":1}"#).unwrap()
    );
}

#[test]
fn test_independent_streams_do_not_share_cache() {
    let input = r#"[{"color":1},{"^0":2}]"#;
    let first = read_json(input).unwrap();
    let second = read_json(input).unwrap();
    assert_eq!(first, second);

    assert!(read_json(r#"{"^0":2}"#).is_err());
}

#[test]
fn test_composite_map_keys() {
    let value = read_json(r#"["~#cmap",[[1,2],"pair",{"~:k":true},"map"]]"#).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(
        map.get(&Value::Array(vec![Value::from(1), Value::from(2)])),
        Some(&Value::from("pair"))
    );
    let mut key = TransitMap::new();
    key.insert(Value::Keyword("k".into()), Value::Bool(true));
    assert_eq!(map.get(&Value::Map(key)), Some(&Value::from("map")));
}

#[test]
fn test_sets_compare_without_order() {
    assert_eq!(
        read_json(r#"["~#set",[1,2,3]]"#).unwrap(),
        read_json(r#"["~#set",[3,1,2]]"#).unwrap()
    );
}

#[test]
fn test_nested_extensions_resolve_bottom_up() {
    let value = read_json(r#"["~#list",[["~#set",["~:a"]],"~i7"]]"#).unwrap();
    let list = match value {
        Value::List(items) => items,
        other => panic!("expected list, got {:?}", other),
    };
    assert!(list[0].as_set().unwrap().contains(&Value::Keyword("a".into())));
    assert_eq!(list[1], Value::Number(Number::Integer(7)));
}

#[test]
fn test_shared_registry_across_readers() {
    let registry = Arc::new(HandlerRegistry::new().with_handler("point", point_handler));
    let options = ReaderOptions::new().with_handlers(Arc::clone(&registry));
    for input in [r#"["~#point",[1,2]]"#, r#"{"~#point":[3,4]}"#] {
        let value = read_json_with(input, options.clone()).unwrap();
        assert!(value.downcast_ref::<Point>().is_some());
    }
}

#[test]
fn test_syntax_error_reports_position() {
    let err = read_json("[1,\n2,\n]").unwrap_err();
    match err {
        Error::Syntax { line, .. } => assert_eq!(line, 3),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_deserialize_typed_record() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Account {
        owner: String,
        balance: f64,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    let account: Account = from_str(
        r#"["^ ","~:owner","ada","~:balance",["~#'","~d12.5"],"~:tags",["~#list",["~:x","~:y"]],"~:nickname",null]"#,
    )
    .unwrap();
    assert_eq!(
        account,
        Account {
            owner: "ada".to_string(),
            balance: 12.5,
            tags: vec!["x".to_string(), "y".to_string()],
            nickname: None,
        }
    );
}
