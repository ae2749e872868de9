use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::params::Language;

/// One row of the `tables` endpoint (the table catalog).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub first_period: Option<String>,
    #[serde(default)]
    pub latest_period: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Variable names in the client language.
    #[serde(default)]
    pub variables: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Metadata of a single table (`tableinfo` endpoint).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// The marker used for suppressed cells. The API sends it as a string
    /// (`"0"`), but a bare number is accepted too.
    #[serde(default, deserialize_with = "de_opt_string_from_string_or_number")]
    pub suppressed_data_value: Option<String>,
    #[serde(default)]
    pub updated: Option<NaiveDateTime>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub footnote: Option<serde_json::Value>,
    #[serde(default)]
    pub variables: Vec<TableVariable>,
}

/// A variable (dimension) of a table and its selectable values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableVariable {
    /// Danish code used in `data` requests, e.g. `KØN`.
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub elimination: bool,
    #[serde(default)]
    pub time: bool,
    #[serde(default)]
    pub values: Vec<CodeText>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeText {
    pub id: String,
    pub text: String,
}

/// Flattened variable listing: one row per selectable value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableValueRow {
    pub id: String,
    pub text: String,
    /// The variable's display text for English responses, its Danish code otherwise.
    pub variable: String,
}

impl TableInfo {
    /// One row per (variable, value) pair, variables in table order.
    pub fn variable_rows(&self, lang: Language) -> Vec<VariableValueRow> {
        self.variables
            .iter()
            .flat_map(|var| {
                let variable = match lang {
                    Language::En => var.text.clone(),
                    Language::Da => var.id.clone(),
                };
                var.values.iter().map(move |v| VariableValueRow {
                    id: v.id.clone(),
                    text: v.text.clone(),
                    variable: variable.clone(),
                })
            })
            .collect()
    }

    /// Look up a variable by its code, ignoring case.
    pub fn variable(&self, code: &str) -> Option<&TableVariable> {
        self.variables
            .iter()
            .find(|v| v.id.to_lowercase() == code.to_lowercase())
    }
}

/// Serde helper: parse an optional string from a JSON string or number.
fn de_opt_string_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct OptStringVisitor;

    impl<'de> Visitor<'de> for OptStringVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string, a number or null")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(s.to_string()))
        }
    }

    deserializer.deserialize_any(OptStringVisitor)
}
