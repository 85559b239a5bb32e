//! The depth-bounded decision tree and the crop model built on it.
//!
//! The fit is fully deterministic: features and candidate thresholds are
//! scanned in a fixed order and ties keep the earlier candidate, so an
//! identical dataset and role map always yields an identical tree.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::roles::{Role, RoleMap};
use crate::types::EnvInputs;

/// On-disk artifact format. Bump when `CropModel` changes shape.
pub const FORMAT_VERSION: u32 = 1;

/// Maximum tree depth (root splits at depth 0).
pub const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        label: String,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// CART classifier over f64 features and string labels, split on Gini
/// impurity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    max_depth: usize,
    n_features: usize,
}

impl DecisionTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            root: None,
            max_depth,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[String]) -> Result<(), PipelineError> {
        if x.len() != y.len() {
            return Err(PipelineError::Prediction(format!(
                "sample count mismatch: {} rows vs {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(PipelineError::Prediction(
                "cannot fit a tree on zero samples".into(),
            ));
        }

        self.n_features = x[0].len();
        let rows: Vec<usize> = (0..x.len()).collect();
        self.root = Some(build_node(x, y, &rows, 0, self.max_depth));
        Ok(())
    }

    pub fn predict_one(&self, features: &[f64]) -> Result<&str, PipelineError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PipelineError::Prediction("model has not been fitted".into()))?;
        if features.len() != self.n_features {
            return Err(PipelineError::Prediction(format!(
                "feature length mismatch: got {}, expected {}",
                features.len(),
                self.n_features
            )));
        }

        let mut node = root;
        loop {
            match node {
                TreeNode::Leaf { label } => return Ok(label),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn build_node(x: &[Vec<f64>], y: &[String], rows: &[usize], depth: usize, max_depth: usize) -> TreeNode {
    let pure = rows.iter().all(|&r| y[r] == y[rows[0]]);
    if pure || depth >= max_depth {
        return TreeNode::Leaf {
            label: majority_label(y, rows),
        };
    }

    let Some((feature, threshold)) = best_split(x, y, rows) else {
        return TreeNode::Leaf {
            label: majority_label(y, rows),
        };
    };

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&r| x[r][feature] <= threshold);

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, &left_rows, depth + 1, max_depth)),
        right: Box::new(build_node(x, y, &right_rows, depth + 1, max_depth)),
    }
}

/// Per-label counts in first-seen order; ties break toward the earlier
/// label so the fit stays reproducible.
fn majority_label(y: &[String], rows: &[usize]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &r in rows {
        match counts.iter_mut().find(|(label, _)| *label == y[r]) {
            Some((_, n)) => *n += 1,
            None => counts.push((&y[r], 1)),
        }
    }

    let mut best = counts[0];
    for &(label, n) in &counts[1..] {
        if n > best.1 {
            best = (label, n);
        }
    }
    best.0.to_string()
}

/// Best (feature, threshold) by weighted Gini impurity. Features and
/// thresholds are scanned in a fixed order; only a strict improvement
/// replaces the current best.
fn best_split(x: &[Vec<f64>], y: &[String], rows: &[usize]) -> Option<(usize, f64)> {
    let n_features = x[rows[0]].len();
    let parent = gini(y, rows);
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f64> = rows.iter().map(|&r| x[r][feature]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&r| x[r][feature] <= threshold);
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let score = (left.len() as f64 * gini(y, &left)
                + right.len() as f64 * gini(y, &right))
                / rows.len() as f64;
            let improves = match best {
                None => score < parent,
                Some((_, _, s)) => score < s,
            };
            if improves {
                best = Some((feature, threshold, score));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn gini(y: &[String], rows: &[usize]) -> f64 {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &r in rows {
        match counts.iter_mut().find(|(label, _)| *label == y[r]) {
            Some((_, n)) => *n += 1,
            None => counts.push((&y[r], 1)),
        }
    }

    let n = rows.len() as f64;
    1.0 - counts
        .iter()
        .map(|&(_, c)| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// The trained recommendation model. Records the role order it was fit
/// with; inference is keyed through that list, never by caller position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropModel {
    pub(crate) version: u32,
    feature_roles: Vec<Role>,
    tree: DecisionTree,
}

impl CropModel {
    /// Fits a depth-bounded tree over the full dataset: features from the
    /// four non-label roles in canonical order, target from the crop role,
    /// row order preserved.
    pub fn train(dataset: &Dataset, roles: &RoleMap) -> Result<CropModel, PipelineError> {
        let feature_roles: Vec<Role> = Role::FEATURES.to_vec();
        let crop_column = roles.column(Role::Crop);

        let mut x = Vec::with_capacity(dataset.len());
        let mut y = Vec::with_capacity(dataset.len());
        for row in 0..dataset.len() {
            let mut features = Vec::with_capacity(feature_roles.len());
            for &role in &feature_roles {
                let column = roles.column(role);
                let cell = dataset.value(row, column).ok_or_else(|| {
                    PipelineError::Prediction(format!("row {row} has no value for column {column}"))
                })?;
                let number = cell.as_number().ok_or_else(|| {
                    PipelineError::Prediction(format!(
                        "non-numeric value \"{cell}\" in column {column}, row {row}"
                    ))
                })?;
                features.push(number);
            }
            x.push(features);

            let label = dataset.value(row, crop_column).ok_or_else(|| {
                PipelineError::Prediction(format!("row {row} has no value for column {crop_column}"))
            })?;
            y.push(label.to_string());
        }

        let mut tree = DecisionTree::new(MAX_DEPTH);
        tree.fit(&x, &y)?;
        info!(rows = x.len(), "decision tree trained");

        Ok(CropModel {
            version: FORMAT_VERSION,
            feature_roles,
            tree,
        })
    }

    pub fn feature_roles(&self) -> &[Role] {
        &self.feature_roles
    }

    /// Predicted crop label for one set of environment inputs. The feature
    /// vector is assembled from the model's own recorded role order.
    pub fn predict(&self, inputs: &EnvInputs) -> Result<String, PipelineError> {
        let features: Vec<f64> = self
            .feature_roles
            .iter()
            .map(|&role| inputs.value_for(role))
            .collect::<Result<_, _>>()?;
        Ok(self.tree.predict_one(&features)?.to_string())
    }
}
