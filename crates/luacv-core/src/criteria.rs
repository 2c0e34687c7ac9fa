use serde::{Deserialize, Serialize};

/// Stopping rule for iterative refinement.
///
/// Either bound may be absent. With neither set the refinement runs the
/// default iteration cap with a zero epsilon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TermCriteria {
    #[serde(default, rename = "iter")]
    pub max_iter: Option<u32>,
    #[serde(default, rename = "eps")]
    pub epsilon: Option<f64>,
}

impl TermCriteria {
    pub const DEFAULT_MAX_ITER: u32 = 100;

    pub fn new(max_iter: Option<u32>, epsilon: Option<f64>) -> Self {
        Self { max_iter, epsilon }
    }

    /// Effective `(iterations, epsilon)`; iterations are clamped to
    /// `1..=DEFAULT_MAX_ITER` and a negative epsilon counts as zero.
    pub fn resolve(&self) -> (u32, f64) {
        let iters = self
            .max_iter
            .map_or(Self::DEFAULT_MAX_ITER, |n| n.clamp(1, Self::DEFAULT_MAX_ITER));
        let eps = self.epsilon.map_or(0.0, |e| e.max(0.0));
        (iters, eps)
    }
}
