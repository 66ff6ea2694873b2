//! Feature encoding from a [`FeatureTable`] to a dense [`Matrix`].

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::table::{FeatureSchema, FeatureTable, Matrix};

/// Learns an encoding from a training table and applies it to new tables.
pub trait Encoder: Sized {
    /// Fit the encoding for `schema` against `table`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if a schema column is missing
    /// from `table` or has the wrong kind.
    fn fit(schema: &FeatureSchema, table: &FeatureTable) -> Result<Self, ModelError>;

    /// Encode `table` with the fitted encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if a schema column is missing
    /// from `table` or has the wrong kind.
    fn transform(&self, table: &FeatureTable) -> Result<Matrix, ModelError>;

    fn schema(&self) -> &FeatureSchema;

    /// Width of the encoded matrix.
    fn n_features(&self) -> usize;
}

/// One-hot blocks for each categorical column (sorted distinct categories),
/// followed by numeric columns passed through unchanged.
///
/// A category not seen during fitting encodes as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    schema: FeatureSchema,
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Learned categories per categorical column, in schema order.
    #[must_use]
    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }
}

impl Encoder for OneHotEncoder {
    fn fit(schema: &FeatureSchema, table: &FeatureTable) -> Result<Self, ModelError> {
        let mut categories = Vec::with_capacity(schema.categorical.len());
        for name in &schema.categorical {
            let mut values: Vec<String> = table.categorical(name)?.to_vec();
            values.sort();
            values.dedup();
            categories.push(values);
        }
        for name in &schema.numeric {
            table.numeric(name)?;
        }
        Ok(Self {
            schema: schema.clone(),
            categories,
        })
    }

    fn transform(&self, table: &FeatureTable) -> Result<Matrix, ModelError> {
        let cat_columns = self
            .schema
            .categorical
            .iter()
            .map(|name| table.categorical(name))
            .collect::<Result<Vec<_>, _>>()?;
        let num_columns = self
            .schema
            .numeric
            .iter()
            .map(|name| table.numeric(name))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = table.n_rows();
        let cols = self.n_features();
        let mut data = vec![0.0; rows * cols];

        for row in 0..rows {
            let out = &mut data[row * cols..(row + 1) * cols];
            let mut offset = 0;
            for (column, known) in cat_columns.iter().zip(&self.categories) {
                if let Ok(pos) = known.binary_search(&column[row]) {
                    out[offset + pos] = 1.0;
                }
                offset += known.len();
            }
            for column in &num_columns {
                out[offset] = column[row];
                offset += 1;
            }
        }

        Matrix::from_vec(rows, cols, data)
    }

    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn n_features(&self) -> usize {
        self.categories.iter().map(Vec::len).sum::<usize>() + self.schema.numeric.len()
    }
}
