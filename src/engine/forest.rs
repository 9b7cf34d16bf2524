//! Isolation forest
//!
//! An ensemble of random partitioning trees. Points that get isolated after
//! few random splits are rare feature combinations; the average isolation
//! depth across trees is turned into a score in (0, 1], where higher means
//! more anomalous.
//!
//! Construction is driven by a single seeded `ChaCha8Rng`, so the same
//! training data and seed always give the same forest.
//!
//! References:
//!   - Liu, Ting, Zhou (2008) "Isolation Forest"

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::stats;
use crate::config::ForestConfig;
use crate::error::{EngineError, EngineResult};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points.
/// Normalizes path lengths and accounts for unsplit points in a leaf.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One random partitioning tree, stored as an arena with the root at 0
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow<V: AsRef<[f64]>>(
        points: &[V],
        indices: &mut [usize],
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(points, indices, 0, max_depth, rng);
        tree
    }

    fn grow_node<V: AsRef<[f64]>>(
        &mut self,
        points: &[V],
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let id = self.nodes.len();
        let leaf = Node::Leaf {
            size: indices.len(),
        };
        if depth >= max_depth || indices.len() <= 1 {
            self.nodes.push(leaf);
            return id;
        }

        let Some((feature, lo, hi)) = pick_split_feature(points, indices, rng) else {
            self.nodes.push(leaf);
            return id;
        };
        let threshold = rng.random_range(lo..hi);

        // Partition in place: `<= threshold` to the front
        let mut split = 0;
        for k in 0..indices.len() {
            if points[indices[k]].as_ref()[feature] <= threshold {
                indices.swap(split, k);
                split += 1;
            }
        }

        // Placeholder until both children have ids
        self.nodes.push(leaf);
        let (left_idx, right_idx) = indices.split_at_mut(split);
        let left = self.grow_node(points, left_idx, depth + 1, max_depth, rng);
        let right = self.grow_node(points, right_idx, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth at which `point` lands plus the expected remaining depth of its leaf
    pub fn path_length(&self, point: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(*size),
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Choose uniformly among features that still vary on this node's points
fn pick_split_feature<V: AsRef<[f64]>>(
    points: &[V],
    indices: &[usize],
    rng: &mut ChaCha8Rng,
) -> Option<(usize, f64, f64)> {
    let dims = points[indices[0]].as_ref().len();
    let candidates: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|f| {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = points[i].as_ref()[f];
                (lo.min(v), hi.max(v))
            });
            (hi > lo && (hi - lo).is_finite()).then_some((f, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}

/// Fitted ensemble plus its calibrated decision threshold
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    subsample: usize,
    threshold: f64,
}

impl IsolationForest {
    /// Grow the forest and calibrate the threshold so that roughly
    /// `contamination` of the training points score above it.
    pub fn fit<V: AsRef<[f64]>>(points: &[V], config: &ForestConfig) -> EngineResult<Self> {
        if points.len() < 2 {
            return Err(EngineError::TooFewRows {
                found: points.len(),
                required: 2,
            });
        }
        config.validate()?;

        let subsample = config.max_samples.clamp(2, points.len());
        let max_depth = (subsample as f64).log2().ceil() as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let trees: Vec<IsolationTree> = (0..config.trees)
            .map(|_| {
                let mut indices = index::sample(&mut rng, points.len(), subsample).into_vec();
                IsolationTree::grow(points, &mut indices, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            subsample,
            threshold: 0.0,
        };

        let training_scores: Vec<f64> = points.iter().map(|p| forest.score(p.as_ref())).collect();
        let sorted = stats::sorted(&training_scores);
        forest.threshold = stats::quantile(&sorted, 1.0 - config.contamination).unwrap_or(1.0);

        debug!(
            "Grew {} trees (subsample {}, depth limit {}), threshold {:.4}",
            forest.trees.len(),
            subsample,
            max_depth,
            forest.threshold
        );
        Ok(forest)
    }

    /// Mean path length across all trees
    pub fn mean_path_length(&self, point: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(point)).sum();
        total / self.trees.len() as f64
    }

    /// Anomaly score `2^(-E[h(x)] / c(subsample))`, in (0, 1]
    pub fn score(&self, point: &[f64]) -> f64 {
        let norm = average_path_length(self.subsample);
        2f64.powf(-self.mean_path_length(point) / norm)
    }

    pub fn is_anomaly(&self, point: &[f64]) -> bool {
        self.score(point) > self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample(&self) -> usize {
        self.subsample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                points.push([i as f64 / n as f64, j as f64 / n as f64]);
            }
        }
        points
    }

    fn config(contamination: f64, seed: u64) -> ForestConfig {
        ForestConfig {
            contamination,
            seed,
            ..Default::default()
        }
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.244_770_9).abs() < 1e-4, "c(256) = {c256}");
    }

    #[test]
    fn test_scores_bounded() {
        let points = grid(10);
        let forest = IsolationForest::fit(&points, &config(0.1, 42)).unwrap();
        for p in &points {
            let s = forest.score(p);
            assert!(s > 0.0 && s <= 1.0, "score {s} out of range");
        }
        assert_eq!(forest.tree_count(), 100);
        assert_eq!(forest.subsample(), 100);
    }

    #[test]
    fn test_far_outlier_flagged() {
        let points = grid(10);
        let forest = IsolationForest::fit(&points, &config(0.1, 42)).unwrap();
        let outlier = [10.0, 10.0];
        let center = [0.45, 0.45];
        assert!(forest.score(&outlier) > forest.score(&center));
        assert!(forest.is_anomaly(&outlier));
        assert!(!forest.is_anomaly(&center));
    }

    #[test]
    fn test_contamination_calibrates_training_rate() {
        let points = grid(10);
        let forest = IsolationForest::fit(&points, &config(0.1, 7)).unwrap();
        let flagged = points.iter().filter(|p| forest.is_anomaly(*p)).count();
        assert!((5..=15).contains(&flagged), "flagged {flagged} of 100");
    }

    #[test]
    fn test_same_seed_same_forest() {
        let points = grid(8);
        let a = IsolationForest::fit(&points, &config(0.2, 42)).unwrap();
        let b = IsolationForest::fit(&points, &config(0.2, 42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_forest() {
        let points = grid(8);
        let a = IsolationForest::fit(&points, &config(0.2, 1)).unwrap();
        let b = IsolationForest::fit(&points, &config(0.2, 2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_identical_points_make_single_leaf_trees() {
        let points = vec![[1.0, 1.0]; 5];
        let forest = IsolationForest::fit(&points, &config(0.2, 42)).unwrap();
        assert!(forest.trees.iter().all(|t| t.node_count() == 1));
        // Every point sits in one leaf of five
        let expected = 2f64.powf(-average_path_length(5) / average_path_length(5));
        assert!((forest.score(&[1.0, 1.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_subsample_capped_by_max_samples() {
        let points = grid(20);
        let cfg = ForestConfig {
            max_samples: 64,
            trees: 10,
            ..config(0.1, 3)
        };
        let forest = IsolationForest::fit(&points, &cfg).unwrap();
        assert_eq!(forest.subsample(), 64);
    }

    #[test]
    fn test_rejects_single_point_and_bad_contamination() {
        let one = vec![[0.0, 0.0]];
        assert!(matches!(
            IsolationForest::fit(&one, &config(0.1, 1)),
            Err(EngineError::TooFewRows { found: 1, .. })
        ));
        let points = grid(3);
        assert!(matches!(
            IsolationForest::fit(&points, &config(0.75, 1)),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
