//! Dashboard filter helpers.
//!
//! An [`OmniFilterSet`] maps application-level names (e.g. query params of the
//! embedding app) onto Omni dashboard filters, and turns a flat set of values
//! into the `filterSearchParam` mapping accepted by
//! [`crate::embed::EmbedRequest`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::json::to_spaced_string;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter {name:?} is not a valid filter definition: {message}")]
    InvalidDefinition { name: String, message: String },
    #[error("Filter set must be an object of named filter definitions")]
    NotAnObject,
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
}

/// Type of the value being filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Number,
    String,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Number => "number",
            FilterType::String => "string",
        }
    }
}

/// Filter comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    #[default]
    Equals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Contains,
    Between,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "EQUALS",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            FilterOperator::Contains => "CONTAINS",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::StartsWith => "STARTS_WITH",
            FilterOperator::EndsWith => "ENDS_WITH",
        }
    }

    /// Wire `kind` plus whether the bound is inclusive. The inclusive
    /// comparisons have no `kind` of their own.
    fn kind(&self) -> (&'static str, bool) {
        match self {
            FilterOperator::LessThanOrEqual => (FilterOperator::LessThan.as_str(), true),
            FilterOperator::GreaterThanOrEqual => (FilterOperator::GreaterThan.as_str(), true),
            other => (other.as_str(), false),
        }
    }
}

/// One or more scalar values to filter on.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterValues(Vec<Value>);

impl FilterValues {
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

impl From<Value> for FilterValues {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => FilterValues(items),
            scalar => FilterValues(vec![scalar]),
        }
    }
}

impl From<&str> for FilterValues {
    fn from(value: &str) -> Self {
        FilterValues(vec![Value::from(value)])
    }
}

impl From<String> for FilterValues {
    fn from(value: String) -> Self {
        FilterValues(vec![Value::from(value)])
    }
}

impl From<i64> for FilterValues {
    fn from(value: i64) -> Self {
        FilterValues(vec![Value::from(value)])
    }
}

impl From<i32> for FilterValues {
    fn from(value: i32) -> Self {
        FilterValues(vec![Value::from(value)])
    }
}

impl From<f64> for FilterValues {
    fn from(value: f64) -> Self {
        FilterValues(vec![Value::from(value)])
    }
}

impl<T: Into<Value>> From<Vec<T>> for FilterValues {
    fn from(values: Vec<T>) -> Self {
        FilterValues(values.into_iter().map(Into::into).collect())
    }
}

/// Wire shape of a single filter. Field order is part of the format.
#[derive(Serialize)]
struct FilterParam<'a> {
    is_negative: bool,
    kind: &'static str,
    #[serde(rename = "type")]
    filter_type: &'static str,
    values: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    is_inclusive: Option<bool>,
}

/// Definition of a single Omni dashboard filter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OmniFilterDefinition {
    field: String,
    #[serde(rename = "type")]
    filter_type: FilterType,
    #[serde(default)]
    operator: FilterOperator,
    #[serde(default)]
    is_negative: bool,
}

impl OmniFilterDefinition {
    /// An `EQUALS`, non-negated filter on `field` (a dot path such as `users.state`).
    pub fn new(field: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            field: field.into(),
            filter_type,
            operator: FilterOperator::Equals,
            is_negative: false,
        }
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn negated(mut self) -> Self {
        self.is_negative = true;
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn is_negative(&self) -> bool {
        self.is_negative
    }

    /// Key and value for this filter in a dashboard's search params.
    ///
    /// The value is a one-element list holding the filter as plain JSON in
    /// declaration order; `is_inclusive` only appears on number filters.
    /// Operator/type compatibility is not checked.
    pub fn filter_search_param(&self, values: impl Into<FilterValues>) -> (String, Vec<String>) {
        let values = values.into();
        let (kind, inclusive) = self.operator.kind();
        let param = FilterParam {
            is_negative: self.is_negative,
            kind,
            filter_type: self.filter_type.as_str(),
            values: values.as_slice(),
            is_inclusive: match self.filter_type {
                FilterType::Number => Some(inclusive),
                FilterType::String => None,
            },
        };
        (format!("f--{}", self.field), vec![to_spaced_string(&param)])
    }
}

/// Ordered query-string mapping where each key may carry several values.
///
/// Encodes with one `key=value` pair per value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSearchParams {
    entries: Vec<(String, Vec<String>)>,
}

impl FilterSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `values`, replacing any previous values for it.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Add one more value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Form-urlencode the mapping, repeating the key for every value.
    ///
    /// Spaces become `+`, `*` is left as is and `~` becomes `%7E`. Callers
    /// passing a pre-encoded `filterSearchParam` string are signed exactly as
    /// given, so encoding the same mapping with another convention (e.g.
    /// Python's `quote_plus`, which escapes `*` and keeps `~`) yields a
    /// different, equally valid, signature.
    pub fn encode(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
            .collect();
        serde_urlencoded::to_string(pairs)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

/// Named collection of filter definitions. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OmniFilterSet {
    filters: BTreeMap<String, OmniFilterDefinition>,
}

impl OmniFilterSet {
    pub fn new<K: Into<String>>(
        filters: impl IntoIterator<Item = (K, OmniFilterDefinition)>,
    ) -> Self {
        Self {
            filters: filters.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build a set from a JSON object of `name -> definition`.
    ///
    /// Every entry must be a definition object
    /// (`{"field", "type", "operator"?, "is_negative"?}`); a single bad entry
    /// rejects the whole set.
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let Value::Object(entries) = value else {
            return Err(FilterError::NotAnObject);
        };
        let mut filters = BTreeMap::new();
        for (name, definition) in entries {
            let definition = OmniFilterDefinition::deserialize(definition).map_err(|e| {
                FilterError::InvalidDefinition {
                    name: name.clone(),
                    message: e.to_string(),
                }
            })?;
            filters.insert(name.clone(), definition);
        }
        Ok(Self { filters })
    }

    /// The filters in this set, keyed by the names accepted by [`Self::resolve`].
    pub fn filters(&self) -> &BTreeMap<String, OmniFilterDefinition> {
        &self.filters
    }

    pub fn get(&self, name: &str) -> Option<&OmniFilterDefinition> {
        self.filters.get(name)
    }

    /// Translate `name -> value(s)` into Omni filter search params.
    ///
    /// The result is ready to use as `EmbedRequest::filter_search_params`.
    pub fn resolve<K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Result<FilterSearchParams, FilterError>
    where
        K: AsRef<str>,
        V: Into<FilterValues>,
    {
        let mut params = FilterSearchParams::new();
        for (name, value) in values {
            let name = name.as_ref();
            let filter = self
                .filters
                .get(name)
                .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;
            let (key, encoded) = filter.filter_search_param(value);
            params.insert(key, encoded);
        }
        Ok(params)
    }
}
