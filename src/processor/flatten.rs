//! Row-per-item flattening of chart items
//!
//! Object-valued fields are expanded one level into `parent.child` columns
//! (`artist.name`, `@attr.rank`). Deeper values are kept as JSON text.
//! Columns appear in first-seen order across items.

use crate::error::{ChartError, Result};
use crate::models::ChartItem;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Column-major view of a list of chart items
#[derive(Debug, Default)]
pub struct FlatTable {
    names: Vec<String>,
    values: Vec<Vec<Option<Value>>>,
    index: HashMap<String, usize>,
    rows: usize,
}

impl FlatTable {
    pub fn from_items(items: &[ChartItem]) -> Self {
        let mut table = Self {
            rows: items.len(),
            ..Default::default()
        };

        for (row, item) in items.iter().enumerate() {
            for (key, value) in item {
                match value {
                    Value::Object(nested) => {
                        for (child, child_value) in nested {
                            table.set(&format!("{}.{}", key, child), row, child_value.clone());
                        }
                    }
                    other => table.set(key, row, other.clone()),
                }
            }
        }

        table
    }

    fn set(&mut self, name: &str, row: usize, value: Value) {
        let column = match self.index.get(name) {
            Some(&column) => column,
            None => {
                self.names.push(name.to_string());
                self.values.push(vec![None; self.rows]);
                self.index.insert(name.to_string(), self.names.len() - 1);
                self.names.len() - 1
            }
        };
        self.values[column][row] = Some(value);
    }

    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Rename a column if present; an existing column named `to` is replaced
    pub fn rename(&mut self, from: &str, to: &str) {
        if from == to || !self.contains(from) {
            return;
        }
        self.drop_column(to);
        if let Some(column) = self.index.remove(from) {
            self.names[column] = to.to_string();
            self.index.insert(to.to_string(), column);
        }
    }

    /// Remove a column if present
    pub fn drop_column(&mut self, name: &str) {
        if let Some(column) = self.index.remove(name) {
            self.names.remove(column);
            self.values.remove(column);
            self.reindex();
        }
    }

    /// Move the listed columns, where present, to the front in the given order
    pub fn move_to_front(&mut self, names: &[&str]) {
        let mut order: Vec<usize> = names.iter().filter_map(|n| self.index.get(*n).copied()).collect();
        for column in 0..self.names.len() {
            if !order.contains(&column) {
                order.push(column);
            }
        }

        let mut names_taken: Vec<Option<String>> = self.names.drain(..).map(Some).collect();
        let mut values_taken: Vec<Option<Vec<Option<Value>>>> =
            self.values.drain(..).map(Some).collect();
        for column in order {
            if let (Some(name), Some(values)) =
                (names_taken[column].take(), values_taken[column].take())
            {
                self.names.push(name);
                self.values.push(values);
            }
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
    }

    /// Convert into polars columns.
    ///
    /// Columns listed in `integer_columns` become Int64 and every value must
    /// convert; the first failure is reported as [`ChartError::TypeCoercion`].
    /// All other columns become nullable strings.
    pub fn into_columns(self, integer_columns: &[&str], path: &Path) -> Result<Vec<Column>> {
        let mut columns = Vec::with_capacity(self.names.len());

        for (name, values) in self.names.into_iter().zip(self.values) {
            let series = if integer_columns.contains(&name.as_str()) {
                let parsed = values
                    .iter()
                    .enumerate()
                    .map(|(row, value)| {
                        coerce_integer(value.as_ref()).ok_or_else(|| ChartError::TypeCoercion {
                            path: path.to_path_buf(),
                            column: name.clone(),
                            row,
                            value: describe(value.as_ref()),
                        })
                    })
                    .collect::<Result<Vec<i64>>>()?;
                Series::new(name.as_str().into(), parsed)
            } else {
                let text: Vec<Option<String>> =
                    values.into_iter().map(|v| v.and_then(render_text)).collect();
                Series::new(name.as_str().into(), text)
            };
            columns.push(Column::from(series));
        }

        Ok(columns)
    }
}

/// Strict integer conversion; numeric strings are accepted, floats are not
fn coerce_integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn render_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "<missing>".to_string(),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(value: Value) -> Vec<ChartItem> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_one_level_expansion() {
        let table = FlatTable::from_items(&items(json!([
            {"name": "T", "artist": {"name": "A", "mbid": "m"}, "@attr": {"rank": "1"}}
        ])));

        assert_eq!(table.height(), 1);
        assert!(table.contains("artist.name"));
        assert!(table.contains("artist.mbid"));
        assert!(table.contains("@attr.rank"));
        assert!(!table.contains("artist"));
    }

    #[test]
    fn test_missing_keys_become_nulls() {
        let table = FlatTable::from_items(&items(json!([
            {"name": "A", "mbid": "m1"},
            {"name": "B"}
        ])));
        let path = Path::new("x_2025-01-01_00-00-00.json");
        let columns = table.into_columns(&[], path).unwrap();

        let mbid = columns.iter().find(|c| c.name().as_str() == "mbid").unwrap();
        assert_eq!(mbid.null_count(), 1);
        assert_eq!(mbid.str().unwrap().get(0), Some("m1"));
    }

    #[test]
    fn test_rename_drop_and_order() {
        let mut table = FlatTable::from_items(&items(json!([
            {"name": "A", "image": [{"#text": "u"}], "@attr": {"rank": "1"}}
        ])));
        table.rename("@attr.rank", "rank");
        table.rename("name", "artist_name");
        table.drop_column("image");
        table.move_to_front(&["rank", "artist_name"]);

        assert_eq!(table.column_names(), &["rank".to_string(), "artist_name".to_string()]);
    }

    #[test]
    fn test_integer_coercion_accepts_strings_and_numbers() {
        let table = FlatTable::from_items(&items(json!([
            {"listeners": "100"},
            {"listeners": 250}
        ])));
        let columns = table
            .into_columns(&["listeners"], Path::new("a_b_c.json"))
            .unwrap();

        let listeners = columns[0].i64().unwrap();
        assert_eq!(listeners.get(0), Some(100));
        assert_eq!(listeners.get(1), Some(250));
    }

    #[test]
    fn test_integer_coercion_failure_reports_row_and_value() {
        let table = FlatTable::from_items(&items(json!([
            {"listeners": "100"},
            {"listeners": "many"}
        ])));
        let result = table.into_columns(&["listeners"], Path::new("a_b_c.json"));

        match result {
            Err(ChartError::TypeCoercion { column, row, value, .. }) => {
                assert_eq!(column, "listeners");
                assert_eq!(row, 1);
                assert_eq!(value, "\"many\"");
            }
            other => panic!("Expected TypeCoercion, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_integer_value_fails() {
        let table = FlatTable::from_items(&items(json!([
            {"listeners": "1"},
            {"name": "no listeners"}
        ])));
        let result = table.into_columns(&["listeners"], Path::new("a_b_c.json"));
        assert!(matches!(result, Err(ChartError::TypeCoercion { .. })));
    }

    #[test]
    fn test_non_string_scalars_rendered_as_text() {
        let table = FlatTable::from_items(&items(json!([
            {"streamable": true, "duration": 215, "tags": ["a", "b"]}
        ])));
        let columns = table.into_columns(&[], Path::new("a_b_c.json")).unwrap();

        let get = |name: &str| {
            columns
                .iter()
                .find(|c| c.name().as_str() == name)
                .unwrap()
                .str()
                .unwrap()
                .get(0)
                .map(str::to_string)
        };
        assert_eq!(get("streamable").as_deref(), Some("true"));
        assert_eq!(get("duration").as_deref(), Some("215"));
        assert_eq!(get("tags").as_deref(), Some(r#"["a","b"]"#));
    }
}
