//! Column-oriented feature tables and the dense matrix the regressor sees.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Categorical(Vec<String>),
    Numeric(Vec<f64>),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, indices: &[usize]) -> Column {
        match self {
            Column::Categorical(v) => {
                Column::Categorical(indices.iter().map(|&i| v[i].clone()).collect())
            }
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
        }
    }
}

/// Named categorical and numeric input columns, in encoding order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub categorical: Vec<String>,
    pub numeric: Vec<String>,
}

impl FeatureSchema {
    #[must_use]
    pub fn new(categorical: &[&str], numeric: &[&str]) -> Self {
        Self {
            categorical: categorical.iter().map(|s| (*s).to_string()).collect(),
            numeric: numeric.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// A set of equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    columns: Vec<(String, Column)>,
    rows: usize,
}

impl FeatureTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::LengthMismatch`] if the column length differs
    /// from the columns already present.
    pub fn insert(&mut self, name: &str, column: Column) -> Result<(), ModelError> {
        let len = column.len();
        let others = self.columns.iter().any(|(n, _)| n != name);
        if others && len != self.rows {
            return Err(ModelError::LengthMismatch {
                rows: self.rows,
                labels: len,
            });
        }
        self.rows = len;
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name.to_string(), column)),
        }
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn with(mut self, name: &str, column: Column) -> Result<Self, ModelError> {
        self.insert(name, column)?;
        Ok(self)
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Categorical column by name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if the column is absent or numeric.
    pub fn categorical(&self, name: &str) -> Result<&[String], ModelError> {
        match self.column(name) {
            Some(Column::Categorical(v)) => Ok(v),
            Some(Column::Numeric(_)) => Err(ModelError::SchemaMismatch(format!(
                "column '{name}' is numeric, expected categorical"
            ))),
            None => Err(ModelError::SchemaMismatch(format!(
                "missing categorical column '{name}'"
            ))),
        }
    }

    /// Numeric column by name.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if the column is absent or categorical.
    pub fn numeric(&self, name: &str) -> Result<&[f64], ModelError> {
        match self.column(name) {
            Some(Column::Numeric(v)) => Ok(v),
            Some(Column::Categorical(_)) => Err(ModelError::SchemaMismatch(format!(
                "column '{name}' is categorical, expected numeric"
            ))),
            None => Err(ModelError::SchemaMismatch(format!(
                "missing numeric column '{name}'"
            ))),
        }
    }

    /// Rows at `indices`, in that order. Indices must be in bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> FeatureTable {
        FeatureTable {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.select(indices)))
                .collect(),
            rows: indices.len(),
        }
    }
}

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ModelError> {
        if data.len() != rows * cols {
            return Err(ModelError::SchemaMismatch(format!(
                "matrix data has {} values, expected {rows}x{cols}",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }
}
