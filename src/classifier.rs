use crate::error::{PredictError, Result};
use bincode::{Decode, Encode};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearModel),
    Forest(Forest),
}

impl Estimator {
    pub fn class_index(&self, x: &[f64], num_classes: usize) -> Result<usize> {
        match self {
            Estimator::Linear(model) => model.class_index(x),
            Estimator::Forest(forest) => forest.class_index(x, num_classes),
        }
    }

    pub fn validate(&self, width: usize, num_classes: usize) -> std::result::Result<(), String> {
        match self {
            Estimator::Linear(model) => model.validate(width, num_classes),
            Estimator::Forest(forest) => forest.validate(width, num_classes),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Linear(_) => "linear",
            Estimator::Forest(_) => "forest",
        }
    }
}

/// One-vs-rest linear model.  A binary model has a single row of
/// coefficients; a positive score selects the second class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct LinearModel {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearModel {
    pub fn decision_function(&self, x: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| inner_product(w, x) + b)
            .collect()
    }

    pub fn class_index(&self, x: &[f64]) -> Result<usize> {
        let scores = self.decision_function(x);
        if let Some(score) = scores.iter().find(|s| s.is_nan()) {
            return Err(PredictError::Prediction(format!(
                "decision function is {}",
                score
            )));
        }
        if scores.len() == 1 {
            return Ok(if scores[0] > 0.0 { 1 } else { 0 });
        }
        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn validate(&self, width: usize, num_classes: usize) -> std::result::Result<(), String> {
        if self.coef.is_empty() {
            return Err("linear model has no coefficients".to_string());
        }
        if self.coef.len() != self.intercept.len() {
            return Err(format!(
                "{} coefficient rows but {} intercepts",
                self.coef.len(),
                self.intercept.len()
            ));
        }
        let expected_rows = if num_classes == 2 { 1 } else { num_classes };
        if self.coef.len() != expected_rows {
            return Err(format!(
                "{} coefficient rows for {} classes",
                self.coef.len(),
                num_classes
            ));
        }
        if let Some(row) = self.coef.iter().find(|w| w.len() != width) {
            return Err(format!(
                "coefficient row has {} weights, encoded width is {}",
                row.len(),
                width
            ));
        }
        Ok(())
    }
}

fn inner_product(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(w, x)| w * x).sum()
}

/// Decision tree stored as a flat node array, root first.  Children always
/// come after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Go left when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { class: usize },
}

impl DecisionTree {
    pub fn class_index(&self, x: &[f64]) -> Result<usize> {
        let mut idx = 0;
        // Each step moves to a later node, so a well-formed tree ends within
        // nodes.len() steps.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { class }) => return Ok(*class),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        PredictError::Prediction(format!("tree split on missing slot {}", feature))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictError::Prediction(format!(
                        "tree node {} out of range",
                        idx
                    )))
                }
            }
        }
        Err(PredictError::Prediction("tree does not terminate".to_string()))
    }

    fn validate(&self, width: usize, num_classes: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { class } if *class >= num_classes => {
                    return Err(format!("leaf {} predicts class {} of {}", i, class, num_classes));
                }
                Node::Split { feature, .. } if *feature >= width => {
                    return Err(format!("split {} uses slot {} of {}", i, feature, width));
                }
                Node::Split { left, right, .. } => {
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("split {} has bad child {}", i, child));
                        }
                    }
                }
                Node::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

/// Majority vote over trees.  Ties go to the lowest class index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Forest {
    pub trees: Vec<DecisionTree>,
}

impl Forest {
    pub fn votes(&self, x: &[f64], num_classes: usize) -> Result<Vec<usize>> {
        let mut votes = vec![0; num_classes];
        for tree in &self.trees {
            let class = tree.class_index(x)?;
            let slot = votes.get_mut(class).ok_or_else(|| {
                PredictError::Prediction(format!("tree voted for unknown class {}", class))
            })?;
            *slot += 1;
        }
        Ok(votes)
    }

    pub fn class_index(&self, x: &[f64], num_classes: usize) -> Result<usize> {
        if self.trees.is_empty() {
            return Err(PredictError::Prediction("forest has no trees".to_string()));
        }
        let votes = self.votes(x, num_classes)?;
        let mut best = 0;
        for (i, count) in votes.iter().enumerate() {
            if *count > votes[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn validate(&self, width: usize, num_classes: usize) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(width, num_classes)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}
