//! Request parameter assembly.
//!
//! Every StatBank endpoint takes a JSON object as its POST body. The helpers here
//! validate list-typed fields and build the `variables` selector objects used by
//! the `data` endpoint, plus one typed query struct per endpoint.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A request body under construction.
pub type Params = Map<String, Value>;

/// Insert `value` under `name` if it is a JSON array.
///
/// - `null` leaves `params` untouched.
/// - Any other non-array value fails with [`Error::InvalidArgument`]; scalars are
///   never wrapped into one-element lists here.
pub fn add_list_field(params: &mut Params, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Array(_) => {
            params.insert(name.to_string(), value.clone());
            Ok(())
        }
        _ => Err(Error::InvalidArgument(format!("{} must be a list.", name))),
    }
}

/// Either a single category value or several, as accepted by
/// [`build_variable_selector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorValues {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SelectorValues {
    fn from(v: &str) -> Self {
        SelectorValues::One(v.to_string())
    }
}

impl From<String> for SelectorValues {
    fn from(v: String) -> Self {
        SelectorValues::One(v)
    }
}

impl From<Vec<String>> for SelectorValues {
    fn from(v: Vec<String>) -> Self {
        SelectorValues::Many(v)
    }
}

impl From<&[&str]> for SelectorValues {
    fn from(v: &[&str]) -> Self {
        SelectorValues::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SelectorValues {
    fn from(v: [&str; N]) -> Self {
        SelectorValues::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Selection of categories for one variable of a `data` request.
///
/// Codes and values must use the Danish ids (e.g. `KØN`, `Tid`) regardless of
/// the client language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableSelector {
    pub code: String,
    pub values: Vec<String>,
    /// Additional per-variable options such as `{"placement": "stub"}`.
    pub extra: Map<String, Value>,
}

/// Build a [`VariableSelector`].
///
/// A single value becomes a one-element list; a list is copied as is. `extra`
/// is kept verbatim and merged into the serialized object after `code` and
/// `values`, so a caller key of the same name wins. The code is not checked
/// against the table; the API does that.
///
/// ```
/// use statbank::params::build_variable_selector;
/// use serde_json::Map;
///
/// let tid = build_variable_selector("Tid", "2018", Map::new());
/// assert_eq!(tid.values, vec!["2018".to_string()]);
/// ```
pub fn build_variable_selector(
    code: &str,
    values: impl Into<SelectorValues>,
    extra: Map<String, Value>,
) -> VariableSelector {
    let values = match values.into() {
        SelectorValues::One(v) => vec![v],
        SelectorValues::Many(vs) => vs,
    };
    VariableSelector {
        code: code.to_string(),
        values,
        extra,
    }
}

impl VariableSelector {
    /// The selector as the JSON object sent to the API.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("code".into(), Value::String(self.code.clone()));
        obj.insert(
            "values".into(),
            Value::Array(self.values.iter().cloned().map(Value::String).collect()),
        );
        for (k, v) in &self.extra {
            obj.insert(k.clone(), v.clone());
        }
        Value::Object(obj)
    }
}

impl Serialize for VariableSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Response language. Variable codes in requests stay Danish either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Da,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Da => "da",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "da" => Ok(Language::Da),
            "en" => Ok(Language::En),
            _ => Err(Error::InvalidArgument(
                r#"Language can only accept either "en" or "da" as values."#.into(),
            )),
        }
    }
}

fn string_list(items: &Option<Vec<String>>) -> Value {
    match items {
        Some(xs) => Value::Array(xs.iter().cloned().map(Value::String).collect()),
        None => Value::Null,
    }
}

/// Body for the `subjects` endpoint.
#[derive(Debug, Clone, Default)]
pub struct SubjectsQuery {
    /// Subject ids to start from; `None` lists the top level.
    pub subjects: Option<Vec<String>>,
    /// Attach the tables of each subject.
    pub include_tables: bool,
    /// Descend the whole hierarchy below the requested subjects.
    pub recursive: bool,
}

impl SubjectsQuery {
    pub fn to_params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert("includeTables".into(), Value::Bool(self.include_tables));
        params.insert("recursive".into(), Value::Bool(self.recursive));
        add_list_field(&mut params, "subjects", &string_list(&self.subjects))?;
        Ok(params)
    }
}

/// Body for the `tables` endpoint.
#[derive(Debug, Clone, Default)]
pub struct TablesQuery {
    pub subjects: Option<Vec<String>>,
    /// Only tables updated within this many days.
    pub past_days: Option<u32>,
    pub include_inactive: bool,
}

impl TablesQuery {
    pub fn to_params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert(
            "pastdays".into(),
            self.past_days.map(Value::from).unwrap_or(Value::Null),
        );
        params.insert("includeinactive".into(), Value::Bool(self.include_inactive));
        add_list_field(&mut params, "subjects", &string_list(&self.subjects))?;
        Ok(params)
    }
}

/// Body for the `tableinfo` endpoint.
#[derive(Debug, Clone)]
pub struct TableInfoQuery {
    pub table_id: String,
}

impl TableInfoQuery {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self { table_id: table_id.into() }
    }

    pub fn to_params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert("table".into(), Value::String(self.table_id.clone()));
        Ok(params)
    }
}

/// Body for the `data` endpoint, always requested in JSON-stat format.
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
    pub table_id: String,
    pub variables: Vec<VariableSelector>,
    /// Extra top-level request fields. Merged last; empty keys are skipped.
    pub extra: Map<String, Value>,
}

impl DataQuery {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Default::default()
        }
    }

    /// Append a variable selector.
    pub fn variable(mut self, selector: VariableSelector) -> Self {
        self.variables.push(selector);
        self
    }

    /// Set an extra top-level request field, e.g. `("timeOrder", "Descending")`.
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Dimension names the reshaped table is indexed by: the selector codes in order.
    pub fn index_dimension_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.code.to_lowercase()).collect()
    }

    pub fn to_params(&self) -> Result<Params> {
        let mut params = Params::new();
        params.insert("format".into(), Value::String("JSONSTAT".into()));
        params.insert("table".into(), Value::String(self.table_id.clone()));
        let variables = if self.variables.is_empty() {
            Value::Null
        } else {
            Value::Array(self.variables.iter().map(VariableSelector::to_value).collect())
        };
        add_list_field(&mut params, "variables", &variables)?;
        for (k, v) in &self.extra {
            if !k.is_empty() {
                params.insert(k.clone(), v.clone());
            }
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!(" da ".parse::<Language>().unwrap(), Language::Da);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn data_query_params_merge_extra_last() {
        let q = DataQuery::new("BEF5")
            .variable(build_variable_selector("Tid", "2018", Map::new()))
            .option("format", "CSV")
            .option("", true);
        let p = q.to_params().unwrap();
        assert_eq!(p["format"], json!("CSV"));
        assert_eq!(p["table"], json!("BEF5"));
        assert_eq!(p["variables"], json!([{"code": "Tid", "values": ["2018"]}]));
        assert!(!p.contains_key(""));
    }

    #[test]
    fn data_query_without_variables_omits_field() {
        let p = DataQuery::new("FOLK1A").to_params().unwrap();
        assert!(!p.contains_key("variables"));
    }

    #[test]
    fn tables_query_sends_null_past_days() {
        let p = TablesQuery::default().to_params().unwrap();
        assert_eq!(p["pastdays"], Value::Null);
        assert_eq!(p["includeinactive"], json!(false));
        assert!(!p.contains_key("subjects"));
    }
}
