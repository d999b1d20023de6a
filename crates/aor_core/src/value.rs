//! Loosely-typed save document tree.
//!
//! Save files are plain JSON with no integer/float distinction, so every number
//! is held as an `f64`. Non-finite numbers are allowed in memory (a numeric edit
//! of non-numeric text stores NaN) and serialize as `null`, matching what the
//! game's own JSON writer produces for them.

use std::fmt;
use std::ops::Index;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Integral numbers below this magnitude serialize without a fraction.
const PLAIN_INTEGER_LIMIT: f64 = 1e21;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SaveValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<SaveValue>),
    Object(Fields),
}

/// Object members in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    entries: Vec<(String, SaveValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&SaveValue> {
        self.position(key).map(|pos| &self.entries[pos].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SaveValue> {
        self.position(key).map(|pos| &mut self.entries[pos].1)
    }

    /// Replaces the value in place when `key` exists, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: SaveValue) -> Option<SaveValue> {
        let key = key.into();
        match self.position(&key) {
            Some(pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get_or_insert_with(
        &mut self,
        key: &str,
        default: impl FnOnce() -> SaveValue,
    ) -> &mut SaveValue {
        let pos = match self.position(key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.to_string(), default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn remove(&mut self, key: &str) -> Option<SaveValue> {
        self.position(key).map(|pos| self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SaveValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl FromIterator<(String, SaveValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, SaveValue)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

impl SaveValue {
    pub fn object() -> Self {
        Self::Object(Fields::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Whole-number view used for ids.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<SaveValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<SaveValue>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&SaveValue> {
        self.as_object().and_then(|fields| fields.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SaveValue> {
        self.as_object_mut().and_then(|fields| fields.get_mut(key))
    }

    /// Numeric reading with the editor's "missing means zero" default.
    /// NaN also reads as zero.
    pub fn number_or_zero(&self) -> f64 {
        match *self {
            Self::Number(n) if !n.is_nan() => n,
            _ => 0.0,
        }
    }
}

pub fn number_at(value: &SaveValue, key: &str) -> f64 {
    value.get(key).map_or(0.0, SaveValue::number_or_zero)
}

/// Formats a number the way the game's scripting runtime prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n.fract() == 0.0 && n.abs() < PLAIN_INTEGER_LIMIT {
        format!("{}", n as i128)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for SaveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join(","))
            }
            Self::Object(_) => f.write_str("[object]"),
        }
    }
}

impl From<f64> for SaveValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for SaveValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for SaveValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for SaveValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for SaveValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<SaveValue>> for SaveValue {
    fn from(items: Vec<SaveValue>) -> Self {
        Self::Array(items)
    }
}

impl From<Fields> for SaveValue {
    fn from(fields: Fields) -> Self {
        Self::Object(fields)
    }
}

static NULL: SaveValue = SaveValue::Null;

/// Lookup by member name; missing members and non-objects read as `Null`.
impl Index<&str> for SaveValue {
    type Output = SaveValue;

    fn index(&self, key: &str) -> &SaveValue {
        self.get(key).unwrap_or(&NULL)
    }
}

/// Lookup by array position; out-of-range and non-arrays read as `Null`.
impl Index<usize> for SaveValue {
    type Output = SaveValue;

    fn index(&self, position: usize) -> &SaveValue {
        self.as_array()
            .and_then(|items| items.get(position))
            .unwrap_or(&NULL)
    }
}

impl Serialize for SaveValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serialize_number(*n, serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !n.is_finite() {
        serializer.serialize_unit()
    } else if n.fract() == 0.0 && n.abs() < PLAIN_INTEGER_LIMIT {
        serializer.serialize_i128(n as i128)
    } else {
        serializer.serialize_f64(n)
    }
}

impl<'de> Deserialize<'de> for SaveValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SaveValueVisitor)
    }
}

struct SaveValueVisitor;

impl<'de> Visitor<'de> for SaveValueVisitor {
    type Value = SaveValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<SaveValue, E> {
        Ok(SaveValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<SaveValue, E> {
        Ok(SaveValue::Null)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<SaveValue, E> {
        Ok(SaveValue::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> Result<SaveValue, E> {
        Ok(SaveValue::Number(n as f64))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> Result<SaveValue, E> {
        Ok(SaveValue::Number(n as f64))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<SaveValue, E> {
        Ok(SaveValue::Number(n))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<SaveValue, E> {
        Ok(SaveValue::String(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<SaveValue, E> {
        Ok(SaveValue::String(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SaveValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(SaveValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SaveValue, A::Error> {
        let mut fields = Fields::new();
        while let Some((key, value)) = map.next_entry::<String, SaveValue>()? {
            fields.insert(key, value);
        }
        Ok(SaveValue::Object(fields))
    }
}
