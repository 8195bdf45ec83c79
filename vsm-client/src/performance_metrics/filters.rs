//! Filter mappings and their query-string rendering.
//!
//! Which keys a listing endpoint accepts is up to the service, so
//! [`FilterOptions`] takes any key. Falsy values (`null`, `false`, `0`, `0.0`,
//! `""`) are dropped when the query string is built, letting callers pass
//! "unset" fields straight through.

use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::{VsmError, VsmResult};

/// A single optional scalar filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Whether the value survives into the query string.
    pub fn is_truthy(&self) -> bool {
        match self {
            FilterValue::Null => false,
            FilterValue::Bool(b) => *b,
            FilterValue::Int(i) => *i != 0,
            FilterValue::Float(f) => *f != 0.0,
            FilterValue::Text(s) => !s.is_empty(),
        }
    }

    /// Render the value the way the (Python) service expects to read it back.
    fn render(&self, key: &str) -> VsmResult<String> {
        match self {
            FilterValue::Null => Ok(String::new()),
            FilterValue::Bool(true) => Ok("True".to_string()),
            FilterValue::Bool(false) => Ok("False".to_string()),
            FilterValue::Int(i) => Ok(i.to_string()),
            FilterValue::Float(f) if f.is_finite() => Ok(python_float_repr(*f)),
            FilterValue::Float(f) => Err(VsmError::Encoding {
                key: key.to_string(),
                message: format!("non-finite number {f} has no query representation"),
            }),
            FilterValue::Text(s) => Ok(s.clone()),
        }
    }

    /// Convert a JSON value, rejecting arrays and objects.
    fn from_json(key: &str, value: Value) -> VsmResult<Self> {
        match value {
            Value::Null => Ok(FilterValue::Null),
            Value::Bool(b) => Ok(FilterValue::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FilterValue::Int(i))
                } else if n.is_u64() {
                    // Above i64::MAX; keep every digit.
                    Ok(FilterValue::Text(n.to_string()))
                } else {
                    Ok(FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => Ok(FilterValue::Text(s)),
            Value::Array(_) | Value::Object(_) => Err(VsmError::Encoding {
                key: key.to_string(),
                message: "only scalar values can be sent as filters".to_string(),
            }),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(value.into())
    }
}

/// Python's `repr(float)`: shortest round-trip digits, positional for decimal
/// exponents in `-4..16`, otherwise scientific with a signed two-digit exponent.
fn python_float_repr(value: f64) -> String {
    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            format!("{positional}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

/// Caller-supplied search criteria for listing endpoints.
///
/// Keys are kept sorted so the same filters always produce the same URL.
///
/// ```
/// use vsm_client::performance_metrics::FilterOptions;
///
/// let filters = FilterOptions::new()
///     .with("metrics_name", "cpu_usage")
///     .with("host", "")
///     .with("limit", 50);
/// assert_eq!(filters.to_query_string().unwrap(), "limit=50&metrics_name=cpu_usage");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterOptions {
    /// Create an empty filter mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a filter, returning the previous value for that key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Option<FilterValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FilterValue> {
        self.entries.iter()
    }

    /// Build filters from a JSON object of scalars.
    ///
    /// # Errors
    ///
    /// [`VsmError::Encoding`] if `value` is not an object or any member is an
    /// array or object.
    pub fn from_json(value: Value) -> VsmResult<Self> {
        let Value::Object(map) = value else {
            return Err(VsmError::Encoding {
                key: String::new(),
                message: "filters must be a JSON object".to_string(),
            });
        };

        let mut filters = Self::new();
        for (key, value) in map {
            let value = FilterValue::from_json(&key, value)?;
            filters.entries.insert(key, value);
        }
        Ok(filters)
    }

    /// Build filters from any serializable struct or map, e.g. a typed query.
    ///
    /// `None` fields serialize as `null` and are dropped like any other
    /// falsy value.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> VsmResult<Self> {
        let value = serde_json::to_value(value).map_err(|e| VsmError::Encoding {
            key: String::new(),
            message: e.to_string(),
        })?;
        Self::from_json(value)
    }

    /// Form-urlencode every truthy entry, in key order.
    ///
    /// Returns an empty string when nothing survives the falsy filter.
    pub fn to_query_string(&self) -> VsmResult<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.entries.iter().filter(|(_, v)| v.is_truthy()) {
            serializer.append_pair(key, &value.render(key)?);
        }
        Ok(serializer.finish())
    }
}

impl<K, V> FromIterator<(K, V)> for FilterOptions
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        filters.extend(iter);
        filters
    }
}

impl<K, V> Extend<(K, V)> for FilterOptions
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Append the encoded filters to `path`, adding `?` only when there is a query.
pub(crate) fn path_with_query(path: &str, filters: Option<&FilterOptions>) -> VsmResult<String> {
    let query = match filters {
        Some(filters) => filters.to_query_string()?,
        None => String::new(),
    };

    if query.is_empty() {
        Ok(path.to_string())
    } else {
        Ok(format!("{path}?{query}"))
    }
}
