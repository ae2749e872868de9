//! JSON-stat datasets returned by the `data` endpoint and their reshaping into
//! an indexed [`Table`].
//!
//! Only the subset of JSON-stat the StatBank API emits is understood: a
//! `dimension` object holding `id`/`size`/`role` next to one entry per
//! dimension (`label` + `category.index` + `category.label`), and a flat,
//! row-major `value` array.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Keys of the `dimension` object that are not dimensions.
const RESERVED: [&str; 3] = ["id", "size", "role"];

/// One classification axis of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionInfo {
    pub name: String,
    pub label: String,
    /// Category keys in index order.
    pub category_keys: Vec<String>,
    /// Category key → display label, in the order the API listed them.
    pub category_labels: Vec<(String, String)>,
}

impl DimensionInfo {
    /// Display labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.category_labels.iter().map(|(_, l)| l.as_str())
    }

    pub fn label_for(&self, key: &str) -> Option<&str> {
        self.category_labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, l)| l.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawDimension {
    #[serde(default)]
    label: String,
    category: RawCategory,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(default)]
    index: Option<Value>,
    #[serde(default)]
    label: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    label: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
    dimension: Map<String, Value>,
    value: Vec<Option<f64>>,
}

/// A decoded JSON-stat dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub source: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    /// Dimension names in declared order.
    pub dimension_order: Vec<String>,
    /// Declared category count per dimension, aligned with `dimension_order`.
    pub sizes: Vec<usize>,
    /// Dimensions aligned with `dimension_order`.
    pub dimensions: Vec<DimensionInfo>,
    /// Flat values, row-major over `dimension_order`. `None` marks a suppressed cell.
    pub values: Vec<Option<f64>>,
}

fn label_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn category_keys(category: &RawCategory) -> Vec<String> {
    match &category.index {
        Some(Value::Object(idx)) => {
            let mut keyed: Vec<(u64, &String)> = idx
                .iter()
                .map(|(k, pos)| (pos.as_u64().unwrap_or(u64::MAX), k))
                .collect();
            keyed.sort_by_key(|(pos, _)| *pos);
            keyed.into_iter().map(|(_, k)| k.clone()).collect()
        }
        Some(Value::Array(keys)) => keys.iter().map(label_text).collect(),
        _ => category.label.keys().cloned().collect(),
    }
}

impl Dataset {
    /// Decode either a full `data` response (`{"dataset": {...}}`) or the bare dataset.
    pub fn from_value(v: &Value) -> Result<Self> {
        let body = v.get("dataset").unwrap_or(v);
        let raw = RawDataset::deserialize(body)?;

        let dimension_order: Vec<String> = match raw.dimension.get("id") {
            Some(ids) => Vec::<String>::deserialize(ids)?,
            None => raw
                .dimension
                .keys()
                .filter(|k| !RESERVED.contains(&k.as_str()))
                .cloned()
                .collect(),
        };

        let mut dimensions = Vec::with_capacity(dimension_order.len());
        for name in &dimension_order {
            let entry = raw.dimension.get(name).ok_or_else(|| {
                Error::DataShape(format!("dimension '{}' is declared but not described", name))
            })?;
            let dim = RawDimension::deserialize(entry)?;
            dimensions.push(DimensionInfo {
                name: name.clone(),
                label: dim.label.clone(),
                category_keys: category_keys(&dim.category),
                category_labels: dim
                    .category
                    .label
                    .iter()
                    .map(|(k, l)| (k.clone(), label_text(l)))
                    .collect(),
            });
        }

        let sizes = match raw.dimension.get("size") {
            Some(s) => Vec::<usize>::deserialize(s)?,
            None => dimensions.iter().map(|d| d.category_keys.len()).collect(),
        };

        Ok(Self {
            label: raw.label,
            source: raw.source,
            updated: raw.updated,
            dimension_order,
            sizes,
            dimensions,
            values: raw.value,
        })
    }

    /// Case-insensitive dimension lookup.
    pub fn dimension(&self, name: &str) -> Option<&DimensionInfo> {
        let wanted = name.to_lowercase();
        self.dimensions
            .iter()
            .find(|d| d.name.to_lowercase() == wanted)
    }

    /// Check that the declared sizes account for every value.
    pub fn check_shape(&self) -> Result<()> {
        if self.sizes.len() != self.dimension_order.len() {
            return Err(Error::DataShape(format!(
                "{} sizes declared for {} dimensions",
                self.sizes.len(),
                self.dimension_order.len()
            )));
        }
        let expected: usize = self.sizes.iter().product();
        if expected != self.values.len() {
            return Err(Error::DataShape(format!(
                "declared sizes {:?} imply {} values, got {}",
                self.sizes,
                expected,
                self.values.len()
            )));
        }
        Ok(())
    }
}

/// A row index built as the cartesian product of per-level labels.
///
/// The first level varies slowest, the last fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiIndex {
    names: Vec<String>,
    levels: Vec<Vec<String>>,
}

impl MultiIndex {
    /// Fails with [`Error::DataShape`] unless there is exactly one name per level.
    pub fn from_product(levels: Vec<Vec<String>>, names: Vec<String>) -> Result<Self> {
        if names.len() != levels.len() {
            return Err(Error::DataShape(format!(
                "{} level names given for {} levels",
                names.len(),
                levels.len()
            )));
        }
        Ok(Self { names, levels })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn nlevels(&self) -> usize {
        self.levels.len()
    }

    pub fn len(&self) -> usize {
        if self.levels.is_empty() {
            0
        } else {
            self.levels.iter().map(Vec::len).product()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels of row `row`, one per level; `None` past the end.
    pub fn tuple(&self, row: usize) -> Option<Vec<&str>> {
        if row >= self.len() {
            return None;
        }
        let mut out = vec![""; self.levels.len()];
        let mut rest = row;
        for (slot, level) in out.iter_mut().zip(&self.levels).rev() {
            *slot = level[rest % level.len()].as_str();
            rest /= level.len();
        }
        Some(out)
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.len()).filter_map(move |i| self.tuple(i))
    }
}

/// Row labelling of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIndex {
    /// Default `0..n` numbering.
    Range(usize),
    Multi(MultiIndex),
}

impl RowIndex {
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Range(n) => *n,
            RowIndex::Multi(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names used for the index when the table is written out.
    pub fn names(&self) -> Vec<String> {
        match self {
            RowIndex::Range(_) => vec!["index".to_string()],
            RowIndex::Multi(m) => m.names().to_vec(),
        }
    }
}

/// A single value column with a (possibly multi-level) row index.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    value_column: String,
    values: Vec<Option<f64>>,
    index: RowIndex,
}

impl Table {
    /// Table with default row numbering.
    pub fn new(value_column: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let n = values.len();
        Self {
            value_column: value_column.into(),
            values,
            index: RowIndex::Range(n),
        }
    }

    /// Replace the row index. Fails if its length differs from the row count.
    pub fn set_index(&mut self, index: MultiIndex) -> Result<()> {
        if index.len() != self.values.len() {
            return Err(Error::DataShape(format!(
                "index of length {} does not match {} values",
                index.len(),
                self.values.len()
            )));
        }
        self.index = RowIndex::Multi(index);
        Ok(())
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(rows, columns)`; there is always exactly one value column.
    pub fn shape(&self) -> (usize, usize) {
        (self.values.len(), 1)
    }

    /// Index labels of one row; `None` past the last row.
    pub fn row_labels(&self, row: usize) -> Option<Vec<String>> {
        match &self.index {
            RowIndex::Range(n) => (row < *n).then(|| vec![row.to_string()]),
            RowIndex::Multi(m) => m
                .tuple(row)
                .map(|labels| labels.into_iter().map(String::from).collect()),
        }
    }

    /// `(labels, value)` pairs in row order.
    pub fn rows(&self) -> impl Iterator<Item = (Vec<String>, Option<f64>)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| self.row_labels(i).map(|labels| (labels, *v)))
    }

    /// One JSON object per row: index columns, then the value column.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        let names = self.index.names();
        self.rows()
            .map(|(labels, v)| {
                let mut rec = Map::new();
                for (name, label) in names.iter().zip(labels) {
                    let cell = match self.index {
                        RowIndex::Range(_) => label
                            .parse::<u64>()
                            .map(Value::from)
                            .unwrap_or(Value::String(label)),
                        RowIndex::Multi(_) => Value::String(label),
                    };
                    rec.insert(name.clone(), cell);
                }
                rec.insert(
                    self.value_column.clone(),
                    v.map(Value::from).unwrap_or(Value::Null),
                );
                rec
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.index.names();
        writeln!(f, "{}\t{}", names.join("\t"), self.value_column)?;
        for (labels, v) in self.rows() {
            let cell = v.map(|x| x.to_string()).unwrap_or_else(|| "..".to_string());
            writeln!(f, "{}\t{}", labels.join("\t"), cell)?;
        }
        Ok(())
    }
}

/// Reshape `dataset` into a table indexed by the requested dimensions.
///
/// `index_dimension_names` are matched case-insensitively against the dataset's
/// dimensions. Names with no matching dimension are ignored; the remaining ones
/// keep the caller's order and become the index levels (lowercased). With no
/// match at all the table keeps its default `0..n` numbering.
///
/// Fails with [`Error::DataShape`] when the declared sizes or the index product
/// disagree with the number of values.
pub fn reshape<S: AsRef<str>>(dataset: &Dataset, index_dimension_names: &[S]) -> Result<Table> {
    dataset.check_shape()?;
    let mut table = Table::new(dataset.label.clone(), dataset.values.clone());

    let mut keys: Vec<String> = Vec::new();
    let mut levels: Vec<Vec<String>> = Vec::new();
    for name in index_dimension_names {
        let key = name.as_ref().to_lowercase();
        if keys.contains(&key) {
            continue;
        }
        match dataset.dimension(&key) {
            Some(dim) => {
                levels.push(dim.labels().map(String::from).collect());
                keys.push(key);
            }
            None => debug!("no dimension '{}' in dataset, not indexing by it", name.as_ref()),
        }
    }

    if !keys.is_empty() {
        table.set_index(MultiIndex::from_product(levels, keys)?)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_last_level_fastest() {
        let idx = MultiIndex::from_product(
            vec![
                vec!["Men".into(), "Women".into()],
                vec!["2018".into(), "2019".into(), "2020".into()],
            ],
            vec!["køn".into(), "tid".into()],
        )
        .unwrap();
        assert_eq!(idx.len(), 6);
        assert_eq!(idx.tuple(0).unwrap(), vec!["Men", "2018"]);
        assert_eq!(idx.tuple(2).unwrap(), vec!["Men", "2020"]);
        assert_eq!(idx.tuple(3).unwrap(), vec!["Women", "2018"]);
        assert_eq!(idx.tuple(5).unwrap(), vec!["Women", "2020"]);
        assert_eq!(idx.tuple(6), None);
    }

    #[test]
    fn set_index_rejects_length_mismatch() {
        let mut t = Table::new("x", vec![Some(1.0), Some(2.0), Some(3.0)]);
        let idx =
            MultiIndex::from_product(vec![vec!["a".into(), "b".into()]], vec!["k".into()]).unwrap();
        assert!(matches!(t.set_index(idx), Err(Error::DataShape(_))));
        assert_eq!(t.index(), &RowIndex::Range(3));
    }

    #[test]
    fn level_names_must_match_levels() {
        let err = MultiIndex::from_product(
            vec![vec!["Men".into()], vec!["2018".into()]],
            vec!["køn".into()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DataShape(_)));
    }

    #[test]
    fn row_labels_past_the_end_are_none_for_both_index_kinds() {
        let mut t = Table::new("v", vec![Some(1.0), Some(2.0)]);
        assert_eq!(t.row_labels(1), Some(vec!["1".to_string()]));
        assert_eq!(t.row_labels(2), None);
        t.set_index(
            MultiIndex::from_product(vec![vec!["a".into(), "b".into()]], vec!["k".into()]).unwrap(),
        )
        .unwrap();
        assert_eq!(t.row_labels(1), Some(vec!["b".to_string()]));
        assert_eq!(t.row_labels(2), None);
    }

    #[test]
    fn display_marks_missing_values() {
        let t = Table::new("v", vec![Some(1.0), None]);
        let s = t.to_string();
        assert_eq!(s, "index\tv\n0\t1\n1\t..\n");
    }
}
