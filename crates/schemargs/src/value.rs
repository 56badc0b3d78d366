use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::ValueError;

/// A value produced by a custom parser.
///
/// Keeps the parsed value behind an `Arc<dyn Any>` together with its rendered
/// form, which is what usage text and serialization see.
#[derive(Clone)]
pub struct CustomValue {
    inner: Arc<dyn Any + Send + Sync>,
    rendered: String,
}

impl CustomValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
    {
        Self {
            rendered: value.to_string(),
            inner: Arc::new(value),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub(crate) fn inner_type_id(&self) -> TypeId {
        Any::type_id(&*self.inner)
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomValue").field(&self.rendered).finish()
    }
}

/// A parsed argument value.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Custom(CustomValue),
}

impl Value {
    /// Wrap an arbitrary value for a custom-typed argument (e.g. as a default).
    pub fn custom<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
    {
        Self::Custom(CustomValue::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(c) => c.downcast_ref::<T>(),
            _ => None,
        }
    }
}

// Custom values compare equal when they hold the same type and render the same.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => {
                a.inner_type_id() == b.inner_type_id() && a.rendered == b.rendered
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Custom(c) => f.write_str(&c.rendered),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            // Integral numbers are emitted without a fractional part.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Custom(c) => serializer.serialize_str(&c.rendered),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

type ParseFn = dyn Fn(&str) -> Result<CustomValue, String> + Send + Sync;

/// User-supplied token parser for a custom-typed argument.
#[derive(Clone)]
pub struct CustomParser {
    parse: Arc<ParseFn>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CustomParser {
    pub fn new<T, E, F>(parse: F) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            parse: Arc::new(move |raw: &str| {
                parse(raw)
                    .map(CustomValue::new)
                    .map_err(|e| e.to_string())
            }),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        (self.parse)(raw).map(Value::Custom)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn produces(&self, value: &CustomValue) -> bool {
        value.inner_type_id() == self.type_id
    }
}

impl fmt::Debug for CustomParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomParser")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// The value type an argument parses to.
#[derive(Debug, Clone)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Custom(CustomParser),
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Custom(_) => "custom",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Placeholder shown in usage text when no `value_name` is declared.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Boolean => "",
            Self::Custom(_) => "VALUE",
        }
    }

    pub(crate) fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Custom(parser), Value::Custom(c)) => parser.produces(c),
            _ => false,
        }
    }
}

/// Parsed values keyed by argument key, in insertion order.
///
/// Boolean options are always present; required arguments are always present
/// after a successful parse; defaulted arguments hold either the parsed value
/// or their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Values {
    values: IndexMap<String, Value>,
}

impl Values {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn into_map(self) -> IndexMap<String, Value> {
        self.values
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_number)
    }

    /// Boolean flag state; `false` when absent.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn custom<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(|v| v.as_custom::<T>())
    }

    pub fn require_string(&self, key: &str) -> Result<&str, ValueError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| wrong_kind(key, "string"))
    }

    pub fn require_number(&self, key: &str) -> Result<f64, ValueError> {
        self.require(key)?
            .as_number()
            .ok_or_else(|| wrong_kind(key, "number"))
    }

    pub fn require_custom<T: Any>(&self, key: &str) -> Result<&T, ValueError> {
        self.require(key)?
            .as_custom::<T>()
            .ok_or_else(|| wrong_kind(key, std::any::type_name::<T>()))
    }

    fn require(&self, key: &str) -> Result<&Value, ValueError> {
        self.get(key)
            .ok_or_else(|| ValueError::Missing(key.to_string()))
    }
}

impl Values {
    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

fn wrong_kind(key: &str, expected: &'static str) -> ValueError {
    ValueError::WrongKind {
        key: key.to_string(),
        expected,
    }
}

impl IntoIterator for Values {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    impl fmt::Display for Port {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, ":{}", self.0)
        }
    }

    #[test]
    fn custom_parser_wraps_errors_as_strings() {
        let parser = CustomParser::new(|raw: &str| raw.parse::<u16>().map(Port));
        assert_eq!(parser.parse("8080").unwrap().as_custom::<Port>(), Some(&Port(8080)));
        let err = parser.parse("http").unwrap_err();
        assert_eq!(err, "invalid digit found in string");
    }

    #[test]
    fn custom_kind_accepts_only_its_own_type() {
        let kind = ValueKind::Custom(CustomParser::new(|raw: &str| {
            raw.parse::<u16>().map(Port)
        }));
        assert!(kind.accepts(&Value::custom(Port(1))));
        assert!(!kind.accepts(&Value::custom(1u32)));
        assert!(!kind.accepts(&Value::from("1")));
    }

    #[test]
    fn typed_accessors_check_kind() {
        let mut values = Values::default();
        values.insert("name", Value::from("bob"));
        values.insert("count", Value::from(3));
        values.insert("verbose", Value::from(true));

        assert_eq!(values.string("name"), Some("bob"));
        assert_eq!(values.number("count"), Some(3.0));
        assert!(values.flag("verbose"));
        assert!(!values.flag("quiet"));
        assert_eq!(values.string("count"), None);

        assert_eq!(
            values.require_number("name"),
            Err(ValueError::WrongKind {
                key: "name".to_string(),
                expected: "number"
            })
        );
        assert_eq!(
            values.require_string("missing"),
            Err(ValueError::Missing("missing".to_string()))
        );
    }

    #[test]
    fn serializes_integral_numbers_without_fraction() {
        let mut values = Values::default();
        values.insert("count", Value::from(42));
        values.insert("ratio", Value::from(0.5));
        values.insert("port", Value::custom(Port(80)));
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"{"count":42,"ratio":0.5,"port":":80"}"#);
    }
}
