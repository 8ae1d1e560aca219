//! Turning model scores into a prediction report

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::labels::ClassLabels;
use crate::error::{ClassifierError, Result};

/// Classification result returned to callers
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Prediction {
    /// Predicted label
    pub class: String,
    /// Position of the predicted label in the label set
    pub class_index: usize,
    /// Raw model probability at `class_index`
    pub confidence: f32,
    /// Probability for every label, in label-set order
    pub all_probabilities: Probabilities,
}

/// Label/probability pairs that serialize as a JSON object in label order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Probabilities(Vec<(String, f32)>);

impl Probabilities {
    pub fn get(&self, label: &str) -> Option<f32> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().map(|(_, p)| p).sum()
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

impl Prediction {
    /// Build a report from one row of model scores.
    ///
    /// `scores` must have exactly one entry per label.
    pub fn from_scores(scores: &[f32], labels: &ClassLabels) -> Result<Self> {
        if scores.len() != labels.len() {
            return Err(ClassifierError::ShapeError {
                expected: format!("{} class scores", labels.len()),
                actual: format!("{} class scores", scores.len()),
            });
        }

        let class_index = argmax(scores).ok_or_else(|| {
            ClassifierError::Inference("model produced no finite class scores".to_string())
        })?;
        let class = labels
            .get(class_index)
            .map(str::to_string)
            .ok_or_else(|| ClassifierError::Inference(format!("no label for index {}", class_index)))?;

        let all_probabilities = Probabilities(
            labels
                .iter()
                .zip(scores)
                .map(|(label, &p)| (label.to_string(), p))
                .collect(),
        );

        Ok(Self {
            class,
            class_index,
            confidence: scores[class_index],
            all_probabilities,
        })
    }
}

/// Index of the largest value; ties go to the lowest index and NaN is ignored
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
