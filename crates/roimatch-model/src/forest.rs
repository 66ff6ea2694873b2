//! Bagged CART regression trees.
//!
//! Each tree is grown on a bootstrap sample, splitting on the
//! variance-reducing threshold over every feature. Trees are stored as flat
//! node vectors so the whole forest serializes as plain JSON.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::table::Matrix;

/// A regressor over an encoded feature matrix.
pub trait Regressor: Sized {
    type Params;

    /// Fit on `x` (one row per sample) and labels `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTrainingSet`] for zero rows and
    /// [`ModelError::LengthMismatch`] when `y` and `x` disagree in length.
    fn fit(params: &Self::Params, x: &Matrix, y: &[f64]) -> Result<Self, ModelError>;

    /// Predict one value per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SchemaMismatch`] if `x` has a different width
    /// than the training matrix.
    fn predict(&self, x: &Matrix) -> Result<Vec<f64>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    trees: Vec<Tree>,
}

impl RandomForestRegressor {
    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    type Params = ForestParams;

    fn fit(params: &ForestParams, x: &Matrix, y: &[f64]) -> Result<Self, ModelError> {
        if x.rows() != y.len() {
            return Err(ModelError::LengthMismatch {
                rows: x.rows(),
                labels: y.len(),
            });
        }
        if x.rows() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidParams(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let n = x.rows();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                TreeBuilder { x, y, params }.build(sample)
            })
            .collect();

        Ok(Self {
            params: params.clone(),
            n_features: x.cols(),
            trees,
        })
    }

    fn predict(&self, x: &Matrix) -> Result<Vec<f64>, ModelError> {
        if x.cols() != self.n_features {
            return Err(ModelError::SchemaMismatch(format!(
                "expected {} encoded features, got {}",
                self.n_features,
                x.cols()
            )));
        }
        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        Ok((0..x.rows())
            .map(|i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect())
    }
}

struct TreeBuilder<'a> {
    x: &'a Matrix,
    y: &'a [f64],
    params: &'a ForestParams,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Position in the feature-sorted sample where the right side begins.
    pivot: usize,
    sorted: Vec<usize>,
}

impl TreeBuilder<'_> {
    fn build(&self, sample: Vec<usize>) -> Tree {
        let mut nodes = Vec::new();
        self.grow(&mut nodes, sample, 0);
        Tree { nodes }
    }

    fn grow(&self, nodes: &mut Vec<Node>, sample: Vec<usize>, depth: usize) -> usize {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            value: mean(sample.iter().map(|&i| self.y[i])),
        });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || sample.len() < self.params.min_samples_split.max(2) {
            return idx;
        }

        let Some(split) = self.best_split(&sample) else {
            return idx;
        };

        let BestSplit {
            feature,
            threshold,
            pivot,
            mut sorted,
        } = split;
        let right_sample = sorted.split_off(pivot);
        let left = self.grow(nodes, sorted, depth + 1);
        let right = self.grow(nodes, right_sample, depth + 1);
        nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    /// Lowest combined sum of squared errors over all features and
    /// thresholds, or `None` when no split improves on the parent.
    fn best_split(&self, sample: &[usize]) -> Option<BestSplit> {
        let n = sample.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        if n < 2 * min_leaf {
            return None;
        }

        let (total_sum, total_sq) = sample.iter().fold((0.0, 0.0), |(s, q), &i| {
            (s + self.y[i], q + self.y[i] * self.y[i])
        });
        let parent_sse = sse(total_sum, total_sq, n);
        let mut best: Option<(f64, BestSplit)> = None;

        for feature in 0..self.x.cols() {
            let mut sorted = sample.to_vec();
            sorted.sort_by(|&a, &b| self.x.get(a, feature).total_cmp(&self.x.get(b, feature)));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            let mut feature_best: Option<(f64, usize)> = None;

            for pos in 1..n {
                let yi = self.y[sorted[pos - 1]];
                left_sum += yi;
                left_sq += yi * yi;

                if pos < min_leaf || n - pos < min_leaf {
                    continue;
                }
                let lo = self.x.get(sorted[pos - 1], feature);
                let hi = self.x.get(sorted[pos], feature);
                if lo >= hi {
                    continue;
                }

                let cost = sse(left_sum, left_sq, pos)
                    + sse(total_sum - left_sum, total_sq - left_sq, n - pos);
                if feature_best.is_none_or(|(c, _)| cost < c) {
                    feature_best = Some((cost, pos));
                }
            }

            if let Some((cost, pivot)) = feature_best {
                if best.as_ref().is_none_or(|(c, _)| cost < *c) {
                    let lo = self.x.get(sorted[pivot - 1], feature);
                    let hi = self.x.get(sorted[pivot], feature);
                    best = Some((
                        cost,
                        BestSplit {
                            feature,
                            threshold: lo + (hi - lo) / 2.0,
                            pivot,
                            sorted,
                        },
                    ));
                }
            }
        }

        best.filter(|(cost, _)| *cost < parent_sse - 1e-12)
            .map(|(_, split)| split)
    }
}

#[allow(clippy::cast_precision_loss)]
fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    (sum_sq - sum * sum / n as f64).max(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
