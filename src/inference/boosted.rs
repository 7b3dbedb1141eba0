//! Gradient-boosted tree ensembles saved with XGBoost's `save_model("*.json")`.
//!
//! Only the pieces needed for binary logistic inference are read: the tree
//! arrays, `base_score` and the objective name. Splits are evaluated in `f32`
//! like XGBoost itself, so thresholds sitting right at a feature value route the
//! same way they do in the trained model.

use serde::Deserialize;

use crate::inference::{InferenceError, TabularClassifier};

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    learner_model_param: LearnerModelParam,
    objective: Objective,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    model: BoosterModel,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    trees: Vec<RawTree>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
}

/// Older releases write `default_left` as 0/1, newer ones as booleans
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// Split threshold for internal nodes, leaf value for leaves
    value: f32,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(raw: RawTree, index: usize) -> Result<Self, InferenceError> {
        let len = raw.left_children.len();
        if [
            raw.right_children.len(),
            raw.split_indices.len(),
            raw.split_conditions.len(),
            raw.default_left.len(),
        ]
        .iter()
        .any(|&l| l != len)
            || len == 0
        {
            return Err(InferenceError::InvalidModel(format!("tree {} has inconsistent arrays", index)));
        }

        let nodes: Vec<Node> = (0..len)
            .map(|i| Node {
                left: raw.left_children[i],
                right: raw.right_children[i],
                feature: raw.split_indices[i] as usize,
                value: raw.split_conditions[i],
                default_left: raw.default_left[i].is_set(),
            })
            .collect();

        let in_range = |child: i32| child == -1 || (child > 0 && (child as usize) < len);
        if nodes.iter().any(|n| !in_range(n.left) || !in_range(n.right)) {
            return Err(InferenceError::InvalidModel(format!("tree {} has dangling children", index)));
        }

        Ok(Self { nodes })
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes.iter().filter(|n| n.left != -1).map(|n| n.feature).max()
    }

    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        // Children always point forward, so this terminates within nodes.len() steps
        for _ in 0..self.nodes.len() {
            let node = &self.nodes[idx];
            if node.left == -1 {
                return node.value;
            }
            let value = features[node.feature];
            let go_left = if value.is_nan() { node.default_left } else { value < node.value };
            idx = if go_left { node.left as usize } else { node.right as usize };
        }
        self.nodes[idx].value
    }
}

/// Binary classifier over a boosted tree ensemble
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    trees: Vec<Tree>,
    base_margin: f32,
    num_features: usize,
}

impl BoostedTrees {
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        match learner.objective.name.as_str() {
            "binary:logistic" | "reg:logistic" => {}
            other => return Err(InferenceError::Unsupported(format!("objective {}", other))),
        }
        if learner.gradient_booster.name != "gbtree" {
            return Err(InferenceError::Unsupported(format!("booster {}", learner.gradient_booster.name)));
        }

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(InferenceError::InvalidModel(format!("base_score {} outside (0, 1)", base_score)));
        }

        let trees = learner
            .gradient_booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(raw, i))
            .collect::<Result<Vec<_>, _>>()?;

        let used = trees.iter().filter_map(Tree::max_feature).max().map(|m| m + 1).unwrap_or(0);
        let declared = learner
            .learner_model_param
            .num_feature
            .as_deref()
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);

        Ok(Self {
            trees,
            base_margin: (base_score / (1.0 - base_score)).ln(),
            num_features: declared.max(used),
        })
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw margin before the logistic transform
    pub fn margin(&self, features: &[f64]) -> Result<f32, InferenceError> {
        if features.len() != self.num_features {
            return Err(InferenceError::Shape {
                expected: self.num_features,
                actual: features.len(),
            });
        }
        let features: Vec<f32> = features.iter().map(|&f| f as f32).collect();
        Ok(self.base_margin + self.trees.iter().map(|t| t.leaf_value(&features)).sum::<f32>())
    }
}

impl TabularClassifier for BoostedTrees {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        let margin = self.margin(features)?;
        Ok(1.0 / (1.0 + (-(margin as f64)).exp()))
    }
}

/// `base_score` is written as "5E-1", or "[5E-1]" since 2.0
fn parse_base_score(raw: &str) -> Result<f32, InferenceError> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<f32>()
        .map_err(|e| InferenceError::InvalidModel(format!("bad base_score {:?}: {}", raw, e)))
}
