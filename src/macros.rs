/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Map keys are any literal convertible into a `Value`; everything else
/// goes through `Value::from`.
///
/// # Examples
///
/// ```rust
/// use serde_transit::{transit, Value};
///
/// let value = transit!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     1: null
/// });
///
/// let map = value.as_map().unwrap();
/// assert_eq!(map.get_str("name"), Some(&Value::from("Alice")));
/// assert_eq!(map.get(&Value::from(1)), Some(&Value::Null));
/// ```
#[macro_export]
macro_rules! transit {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::transit!($elem)),*])
    };

    ({}) => {
        $crate::Value::Map($crate::TransitMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::TransitMap::new();
        $(
            map.insert($crate::Value::from($key), $crate::transit!($value));
        )*
        $crate::Value::Map(map)
    }};

    ($e:expr) => {
        $crate::Value::from($e)
    };
}
