//! Encoder + regressor bundled as one trained artifact.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::encoder::{Encoder, OneHotEncoder};
use crate::error::ModelError;
use crate::evaluate::{mean_squared_error, r2_score, TrainingReport};
use crate::forest::{ForestParams, RandomForestRegressor, Regressor};
use crate::table::{FeatureSchema, FeatureTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel<E, R> {
    encoder: E,
    regressor: R,
}

/// The production model: one-hot encoding into a random forest.
pub type RoiModel = TrainedModel<OneHotEncoder, RandomForestRegressor>;

impl<E: Encoder, R: Regressor> TrainedModel<E, R> {
    /// Fit the encoder on `table`, then the regressor on the encoded rows.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTrainingSet`] for an empty table,
    /// [`ModelError::LengthMismatch`] when `labels` has a different length,
    /// or [`ModelError::SchemaMismatch`] when `table` lacks a schema column.
    pub fn fit(
        schema: &FeatureSchema,
        table: &FeatureTable,
        labels: &[f64],
        params: &R::Params,
    ) -> Result<Self, ModelError> {
        if table.n_rows() != labels.len() {
            return Err(ModelError::LengthMismatch {
                rows: table.n_rows(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let encoder = E::fit(schema, table)?;
        let x = encoder.transform(table)?;
        let regressor = R::fit(params, &x, labels)?;
        Ok(Self { encoder, regressor })
    }

    /// Predict one value per row of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] when `table` lacks a column the
    /// model was trained on, or has it with the wrong kind.
    pub fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        let x = self.encoder.transform(table)?;
        self.regressor.predict(&x)
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        self.encoder.schema()
    }

    #[must_use]
    pub fn encoder(&self) -> &E {
        &self.encoder
    }
}

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestParams,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            forest: ForestParams::default(),
        }
    }
}

impl TrainOptions {
    /// Default options with both the split and forest seeded from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            split_seed: seed,
            forest: ForestParams {
                seed,
                ..ForestParams::default()
            },
            ..Self::default()
        }
    }
}

/// Shuffle with a fixed seed, hold out `test_fraction` of rows, fit on the
/// rest, and score the held-out rows.
///
/// The returned model is the one fit on the training split. At least one row
/// always stays in training; with a single row the test split is empty and
/// the metrics are `None`.
///
/// # Errors
///
/// Propagates [`TrainedModel::fit`] errors.
pub fn train_with_holdout(
    schema: &FeatureSchema,
    table: &FeatureTable,
    labels: &[f64],
    options: &TrainOptions,
) -> Result<(RoiModel, TrainingReport), ModelError> {
    if table.n_rows() != labels.len() {
        return Err(ModelError::LengthMismatch {
            rows: table.n_rows(),
            labels: labels.len(),
        });
    }
    let rows = labels.len();
    if rows == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(options.split_seed));

    let test_rows = test_size(rows, options.test_fraction);
    let (test_idx, train_idx) = order.split_at(test_rows);

    let train_table = table.select(train_idx);
    let train_labels: Vec<f64> = train_idx.iter().map(|&i| labels[i]).collect();
    let model = RoiModel::fit(schema, &train_table, &train_labels, &options.forest)?;

    let (mse, r2) = if test_idx.is_empty() {
        (None, None)
    } else {
        let test_labels: Vec<f64> = test_idx.iter().map(|&i| labels[i]).collect();
        let predicted = model.predict(&table.select(test_idx))?;
        (
            mean_squared_error(&test_labels, &predicted),
            r2_score(&test_labels, &predicted),
        )
    };

    let report = TrainingReport {
        rows,
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        mse,
        r2,
    };
    tracing::info!(
        rows = report.rows,
        train_rows = report.train_rows,
        test_rows = report.test_rows,
        mse = ?report.mse,
        r2 = ?report.r2,
        "model trained"
    );
    Ok((model, report))
}

/// Rounded-up share of `rows`, capped so training keeps at least one row.
fn test_size(rows: usize, fraction: f64) -> usize {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let wanted = (rows as f64 * fraction.clamp(0.0, 1.0)).ceil() as usize;
    wanted.min(rows.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn sample_table(n: usize) -> (FeatureSchema, FeatureTable, Vec<f64>) {
        let platforms = ["Instagram", "YouTube", "TikTok"];
        let cats: Vec<String> = (0..n).map(|i| platforms[i % 3].to_string()).collect();
        #[allow(clippy::cast_precision_loss)]
        let budgets: Vec<f64> = (0..n).map(|i| 1000.0 + (i as f64) * 10.0).collect();
        let labels: Vec<f64> = cats
            .iter()
            .zip(&budgets)
            .map(|(c, b)| if c == "YouTube" { b * 3.0 } else { b * 1.5 })
            .collect();
        let table = FeatureTable::new()
            .with("platform", Column::Categorical(cats))
            .unwrap()
            .with("budget", Column::Numeric(budgets))
            .unwrap();
        (FeatureSchema::new(&["platform"], &["budget"]), table, labels)
    }

    #[test]
    fn fit_rejects_empty_and_mismatched_inputs() {
        let schema = FeatureSchema::new(&["platform"], &["budget"]);
        let empty = FeatureTable::new()
            .with("platform", Column::Categorical(vec![]))
            .unwrap()
            .with("budget", Column::Numeric(vec![]))
            .unwrap();
        assert!(matches!(
            RoiModel::fit(&schema, &empty, &[], &ForestParams::default()),
            Err(ModelError::EmptyTrainingSet)
        ));

        let (_, table, _) = sample_table(3);
        assert!(matches!(
            RoiModel::fit(&schema, &table, &[1.0], &ForestParams::default()),
            Err(ModelError::LengthMismatch { rows: 3, labels: 1 })
        ));
    }

    #[test]
    fn holdout_splits_eighty_twenty() {
        let (schema, table, labels) = sample_table(50);
        let (_, report) =
            train_with_holdout(&schema, &table, &labels, &TrainOptions::default()).unwrap();
        assert_eq!(report.rows, 50);
        assert_eq!(report.test_rows, 10);
        assert_eq!(report.train_rows, 40);
        assert!(report.mse.is_some());
        assert!(report.r2.unwrap() > 0.5, "r2 {:?}", report.r2);
    }

    #[test]
    fn single_row_has_no_test_metrics() {
        let (schema, table, labels) = sample_table(1);
        let (_, report) =
            train_with_holdout(&schema, &table, &labels, &TrainOptions::default()).unwrap();
        assert_eq!(report.test_rows, 0);
        assert_eq!(report.mse, None);
        assert_eq!(report.r2, None);
    }

    #[test]
    fn holdout_is_deterministic() {
        let (schema, table, labels) = sample_table(30);
        let (a, ra) =
            train_with_holdout(&schema, &table, &labels, &TrainOptions::default()).unwrap();
        let (b, rb) =
            train_with_holdout(&schema, &table, &labels, &TrainOptions::default()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.predict(&table).unwrap(), b.predict(&table).unwrap());
    }

    #[test]
    fn predict_with_missing_column_is_schema_mismatch() {
        let (schema, table, labels) = sample_table(10);
        let model = RoiModel::fit(&schema, &table, &labels, &ForestParams::default()).unwrap();
        let partial = FeatureTable::new()
            .with("platform", Column::Categorical(vec!["Instagram".into()]))
            .unwrap();
        assert!(matches!(
            model.predict(&partial),
            Err(ModelError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_size_rounds_up_and_keeps_training_rows() {
        assert_eq!(test_size(10, 0.2), 2);
        assert_eq!(test_size(11, 0.2), 3);
        assert_eq!(test_size(2, 0.2), 1);
        assert_eq!(test_size(1, 0.2), 0);
        assert_eq!(test_size(5, 1.0), 4);
    }
}
