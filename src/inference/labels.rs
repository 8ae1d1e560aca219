//! CIFAR-10 class labels

use serde::Serialize;

/// Labels in model output order
pub const CIFAR10_LABELS: [&str; 10] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

/// Ordered, index-addressable label set mapping output positions to names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassLabels(Vec<String>);

impl Default for ClassLabels {
    fn default() -> Self {
        Self::cifar10()
    }
}

impl ClassLabels {
    pub fn cifar10() -> Self {
        Self(CIFAR10_LABELS.iter().map(|s| s.to_string()).collect())
    }

    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
