//! In-memory column table used for every exported file.

use std::collections::{HashMap, HashSet};

use super::error::ExportError;

/// Values of one column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Textual form of a cell; empty for missing values.
    pub fn cell_string(&self, row: usize) -> String {
        match self {
            Self::Float(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            Self::Text(v) => v[row].clone().unwrap_or_default(),
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            Self::Float(v) => Self::Float(rows.iter().map(|&r| v[r]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking names and lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ExportError> {
        let mut table = Self::new();
        for c in columns {
            table.push_column(c.name, c.data)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), ExportError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(ExportError::DuplicateColumn(name));
        }
        if self.columns.is_empty() {
            self.rows = data.len();
        } else if data.len() != self.rows {
            return Err(ExportError::ColumnLength {
                name,
                expected: self.rows,
                found: data.len(),
            });
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn require(&self, name: &str) -> Result<&Column, ExportError> {
        self.column(name)
            .ok_or_else(|| ExportError::MissingColumn(name.to_string()))
    }

    /// Keep only `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
            rows: rows.len(),
        }
    }

    /// Inner join on `key`, keeping this table's row order.
    ///
    /// Columns of `other` whose name already exists here are dropped.
    pub fn join(&self, other: &Table, key: &str) -> Result<Table, ExportError> {
        let left_key = self.require(key)?;
        let right_key = other.require(key)?;

        let mut right_rows: HashMap<String, usize> = HashMap::with_capacity(other.rows);
        for r in 0..other.rows {
            right_rows.entry(right_key.data.cell_string(r)).or_insert(r);
        }

        let mut left = Vec::with_capacity(self.rows);
        let mut right = Vec::with_capacity(self.rows);
        for l in 0..self.rows {
            if let Some(&r) = right_rows.get(&left_key.data.cell_string(l)) {
                left.push(l);
                right.push(r);
            }
        }

        let mut joined = self.select_rows(&left);
        for c in &other.columns {
            if joined.column(&c.name).is_none() {
                joined.push_column(c.name.clone(), c.data.select(&right))?;
            }
        }
        Ok(joined)
    }

    /// Drop rows whose values in `by` repeat an earlier row. With no key
    /// columns there is nothing to compare and every row is kept.
    pub fn dedup_rows(&self, by: &[String]) -> Result<Table, ExportError> {
        if by.is_empty() {
            return Ok(self.clone());
        }
        let key_columns = by
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::with_capacity(self.rows);
        let keep: Vec<usize> = (0..self.rows)
            .filter(|&r| {
                let key: Vec<String> = key_columns.iter().map(|c| c.data.cell_string(r)).collect();
                seen.insert(key)
            })
            .collect();
        Ok(self.select_rows(&keep))
    }

    /// Row-major numeric values of `names`. Every cell must be present.
    pub fn float_rows(&self, names: &[String]) -> Result<Vec<Vec<f64>>, ExportError> {
        let columns = names
            .iter()
            .map(|name| match &self.require(name)?.data {
                ColumnData::Float(v) => Ok((name, v)),
                ColumnData::Text(_) => Err(ExportError::Malformed(format!(
                    "column `{}` is not numeric",
                    name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        (0..self.rows)
            .map(|row| {
                columns
                    .iter()
                    .map(|(name, v)| {
                        v[row].ok_or_else(|| ExportError::MissingValue {
                            column: (*name).clone(),
                            row,
                        })
                    })
                    .collect::<Result<Vec<f64>, _>>()
            })
            .collect()
    }

    /// Textual cells of one column.
    pub fn text_values(&self, name: &str) -> Result<Vec<Option<String>>, ExportError> {
        let column = self.require(name)?;
        Ok((0..self.rows)
            .map(|r| match &column.data {
                ColumnData::Text(v) => v[r].clone(),
                ColumnData::Float(v) => v[r].map(|x| x.to_string()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> ColumnData {
        ColumnData::Text(values.iter().map(|s| Some(s.to_string())).collect())
    }

    fn float(values: &[f64]) -> ColumnData {
        ColumnData::Float(values.iter().copied().map(Some).collect())
    }

    fn sample() -> Table {
        Table::from_columns(vec![
            Column {
                name: "id".into(),
                data: text(&["a", "b", "c"]),
            },
            Column {
                name: "cost".into(),
                data: float(&[1.0, 2.0, 1.0]),
            },
            Column {
                name: "x".into(),
                data: float(&[0.5, 0.7, 0.5]),
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_push_column_checks() {
        let mut table = sample();
        assert!(matches!(
            table.push_column("cost", float(&[0.0, 0.0, 0.0])),
            Err(ExportError::DuplicateColumn(_))
        ));
        assert!(matches!(
            table.push_column("y", float(&[0.0])),
            Err(ExportError::ColumnLength { expected: 3, found: 1, .. })
        ));
        assert_eq!(table.num_columns(), 3);
    }

    #[test]
    fn test_join_drops_duplicate_columns() {
        let right = Table::from_columns(vec![
            Column {
                name: "id".into(),
                data: text(&["c", "a"]),
            },
            Column {
                name: "x".into(),
                data: float(&[9.0, 9.0]),
            },
            Column {
                name: "energy".into(),
                data: float(&[30.0, 10.0]),
            },
        ])
        .unwrap();

        let joined = sample().join(&right, "id").unwrap();
        assert_eq!(joined.num_rows(), 2);
        assert_eq!(
            joined.column_names().collect::<Vec<_>>(),
            vec!["id", "cost", "x", "energy"]
        );
        assert_eq!(
            joined.column("energy").unwrap().data,
            float(&[10.0, 30.0])
        );
        assert_eq!(joined.column("x").unwrap().data, float(&[0.5, 0.5]));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let table = sample().dedup_rows(&["x".to_string()]).unwrap();
        assert_eq!(table.text_values("id").unwrap(), vec![Some("a".into()), Some("b".into())]);
    }

    #[test]
    fn test_dedup_without_keys_keeps_all_rows() {
        let table = sample();
        assert_eq!(table.dedup_rows(&[]).unwrap(), table);
    }

    #[test]
    fn test_float_rows() {
        let table = sample();
        let rows = table.float_rows(&["cost".into(), "x".into()]).unwrap();
        assert_eq!(rows[1], vec![2.0, 0.7]);

        assert!(matches!(
            table.float_rows(&["id".into()]),
            Err(ExportError::Malformed(_))
        ));
        assert!(matches!(
            table.float_rows(&["nope".into()]),
            Err(ExportError::MissingColumn(_))
        ));

        let mut gaps = Table::new();
        gaps.push_column("v", ColumnData::Float(vec![Some(1.0), None])).unwrap();
        assert!(matches!(
            gaps.float_rows(&["v".into()]),
            Err(ExportError::MissingValue { row: 1, .. })
        ));
    }
}
