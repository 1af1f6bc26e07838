//! Multi-output tree-ensemble regressor exported from sklearn as JSON.
//!
//! Each tree is stored as parallel node arrays (the layout sklearn's
//! `tree_` attribute uses). Leaves carry one value per output; the forest
//! prediction is the mean of the leaf rows reached in every tree.
//!
//! ```text
//! {"n_features": 3, "n_outputs": 6, "trees": [
//!   {"feature": [0, -2, -2], "threshold": [2021.5, 0, 0],
//!    "left": [1, -1, -1], "right": [2, -1, -1],
//!    "value": [[..6..], [..6..], [..6..]]}
//! ]}
//! ```

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use super::Regressor;

#[derive(Debug, Clone, Deserialize)]
pub struct TreeArrays {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForestJson {
    n_features: usize,
    n_outputs: usize,
    trees: Vec<TreeArrays>,
}

#[derive(Debug, Clone)]
struct Node {
    /// Split feature; negative for leaves.
    feature: i32,
    threshold: f64,
    left: usize,
    right: usize,
    value: Vec<f64>,
}

impl Node {
    const fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn from_arrays(mut t: TreeArrays, n_features: usize, n_outputs: usize) -> Result<Self> {
        let n = t.feature.len();
        ensure!(n > 0, "tree has no nodes");
        ensure!(
            t.threshold.len() == n && t.left.len() == n && t.right.len() == n && t.value.len() == n,
            "inconsistent array lengths"
        );

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let feature = t.feature[i];
            let (left, right) = if feature < 0 {
                ensure!(
                    t.value[i].len() == n_outputs,
                    "leaf {} has {} values, expected {}",
                    i,
                    t.value[i].len(),
                    n_outputs
                );
                (0, 0)
            } else {
                ensure!(
                    (feature as usize) < n_features,
                    "node {} splits on feature {} but forest has {}",
                    i,
                    feature,
                    n_features
                );
                // children must point forward or traversal could loop
                let (l, r) = (t.left[i], t.right[i]);
                if l <= i as i32 || r <= i as i32 || l as usize >= n || r as usize >= n {
                    bail!("node {} has invalid children ({}, {})", i, l, r);
                }
                (l as usize, r as usize)
            };
            nodes.push(Node {
                feature,
                threshold: t.threshold[i],
                left,
                right,
                value: std::mem::take(&mut t.value[i]),
            });
        }
        Ok(Self { nodes })
    }

    fn leaf(&self, x: &[f32]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return &node.value;
            }
            let v = f64::from(x[node.feature as usize]);
            idx = if v <= node.threshold { node.left } else { node.right };
        }
    }
}

/// Averaging ensemble of regression trees.
#[derive(Debug, Clone)]
pub struct ForestRegressor {
    trees: Vec<RegressionTree>,
    n_features: usize,
    n_outputs: usize,
}

impl ForestRegressor {
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read forest at {}", path.display()))?;
        Self::from_json(&txt)
    }

    pub fn from_json(txt: &str) -> Result<Self> {
        let raw: ForestJson = serde_json::from_str(txt).context("failed to parse forest json")?;
        Self::from_trees(raw.trees, raw.n_features, raw.n_outputs)
    }

    pub fn from_trees(trees: Vec<TreeArrays>, n_features: usize, n_outputs: usize) -> Result<Self> {
        ensure!(!trees.is_empty(), "empty forest");
        ensure!(n_outputs > 0, "forest declares no outputs");
        let trees = trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                RegressionTree::from_arrays(t, n_features, n_outputs)
                    .with_context(|| format!("tree {i}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            trees,
            n_features,
            n_outputs,
        })
    }

    fn predict_one(&self, x: &[f32]) -> Vec<f64> {
        let mut acc = vec![0.0; self.n_outputs];
        for tree in &self.trees {
            for (a, v) in acc.iter_mut().zip(tree.leaf(x)) {
                *a += v;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }
}

impl Regressor for ForestRegressor {
    fn in_dim(&self) -> usize {
        self.n_features
    }

    fn out_dim(&self) -> usize {
        self.n_outputs
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .enumerate()
            .map(|(i, r)| {
                ensure!(
                    r.len() == self.n_features,
                    "row {} feature length mismatch: got {}, expected {}",
                    i,
                    r.len(),
                    self.n_features
                );
                Ok(self.predict_one(r))
            })
            .collect()
    }

    fn backend(&self) -> &'static str {
        "forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: i32, threshold: f64, lo: f64, hi: f64) -> TreeArrays {
        TreeArrays {
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            value: vec![vec![0.0; 2], vec![lo; 2], vec![hi; 2]],
        }
    }

    #[test]
    fn averages_leaf_rows() {
        let f = ForestRegressor::from_trees(vec![stump(0, 0.5, 1.0, 3.0), stump(1, 0.5, 10.0, 20.0)], 2, 2)
            .unwrap();
        let out = f.predict_batch(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(out[0], vec![6.5, 6.5]);
        assert_eq!(out[1], vec![10.5, 10.5]);
    }

    #[test]
    fn rejects_backward_children() {
        let mut t = stump(0, 0.5, 1.0, 2.0);
        t.left[0] = 0;
        assert!(ForestRegressor::from_trees(vec![t], 1, 2).is_err());
    }

    #[test]
    fn rejects_short_leaf() {
        let mut t = stump(0, 0.5, 1.0, 2.0);
        t.value[2] = vec![1.0];
        assert!(ForestRegressor::from_trees(vec![t], 1, 2).is_err());
    }

    #[test]
    fn rejects_wrong_row_width() {
        let f = ForestRegressor::from_trees(vec![stump(0, 0.5, 1.0, 2.0)], 1, 2).unwrap();
        assert!(f.predict_batch(&[vec![1.0, 2.0]]).is_err());
    }
}
