//! Score combination: a feedback-trained ensemble when enough labeled
//! examples exist, else the fixed linear combination (spec §4.3).
//!
//! The source trains a RandomForest/GBM/MLP ensemble via scikit-learn; pure
//! Rust has nothing drop-in equivalent in this workspace's dependency
//! stack, so this crate substitutes a three-way bagged ordinary-least-
//! squares ensemble. Each bag is an independently bootstrap-resampled
//! linear regressor over the twelve features; the [0.4, 0.4, 0.2]
//! combination weight and the stdev-based confidence clamp are unchanged
//! from the spec.

use canopy_protocol::defaults::FEEDBACK_MIN_EXAMPLES;
use canopy_protocol::rng::XorShift64;
use canopy_protocol::MatchFeatures;

const BAG_COUNT: usize = 3;
const BAG_WEIGHTS: [f64; BAG_COUNT] = [0.4, 0.4, 0.2];

/// A single labeled (features, human-assigned score) example used to train
/// the feedback ensemble.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackExample {
    pub features: [f64; 12],
    pub score: f64,
}

/// One bootstrap-resampled ordinary-least-squares regressor: twelve
/// feature weights plus an intercept, fit by the normal equations.
#[derive(Debug, Clone)]
struct LinearRegressor {
    weights: [f64; 12],
    intercept: f64,
}

impl LinearRegressor {
    fn predict(&self, features: &[f64; 12]) -> f64 {
        self.intercept + self.weights.iter().zip(features).map(|(w, f)| w * f).sum::<f64>()
    }

    /// Fit by solving the 13x13 normal-equations system `(XtX) b = Xty`
    /// with Gauss-Jordan elimination; `examples` must be non-empty.
    fn fit(examples: &[FeedbackExample]) -> Self {
        const DIM: usize = 13;
        let mut xtx = [[0.0_f64; DIM]; DIM];
        let mut xty = [0.0_f64; DIM];

        for example in examples {
            let mut row = [0.0_f64; DIM];
            row[0] = 1.0;
            row[1..].copy_from_slice(&example.features);

            for i in 0..DIM {
                xty[i] += row[i] * example.score;
                for j in 0..DIM {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }

        // Ridge regularization keeps the system solvable when features are
        // collinear (a near-certainty with twelve similarity scores that
        // all move together).
        for i in 0..DIM {
            xtx[i][i] += 1e-6;
        }

        let solution = solve_linear_system(xtx, xty).unwrap_or([0.0; DIM]);
        let mut weights = [0.0; 12];
        weights.copy_from_slice(&solution[1..]);
        Self { intercept: solution[0], weights }
    }
}

/// Gauss-Jordan elimination with partial pivoting over a dense `n x n`
/// system; returns `None` if the matrix is singular even after ridge
/// regularization (should not happen in practice).
fn solve_linear_system<const N: usize>(mut a: [[f64; N]; N], mut b: [f64; N]) -> Option<[f64; N]> {
    for col in 0..N {
        let mut pivot_row = col;
        let mut pivot_value = a[col][col].abs();
        for row in (col + 1)..N {
            if a[row][col].abs() > pivot_value {
                pivot_row = row;
                pivot_value = a[row][col].abs();
            }
        }
        if pivot_value < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in 0..N {
            a[col][j] /= pivot;
        }
        b[col] /= pivot;

        for row in 0..N {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..N {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }
    Some(b)
}

/// Three bootstrap-resampled regressors, combined per spec §4.3.
pub struct FeedbackEnsemble {
    bags: [LinearRegressor; BAG_COUNT],
}

impl FeedbackEnsemble {
    /// `None` when fewer than [`FEEDBACK_MIN_EXAMPLES`] examples are
    /// available — callers fall back to [`fixed_combination`].
    pub fn train(examples: &[FeedbackExample], seed: u64) -> Option<Self> {
        if examples.len() < FEEDBACK_MIN_EXAMPLES {
            return None;
        }

        let mut rng = XorShift64::new(seed);
        let bags = std::array::from_fn(|_| {
            let resampled: Vec<FeedbackExample> =
                (0..examples.len()).map(|_| examples[rng.next_below(examples.len())]).collect();
            LinearRegressor::fit(&resampled)
        });

        Some(Self { bags })
    }

    /// Weighted-average prediction in [0,1] plus a stdev-derived confidence
    /// (spec §4.3).
    pub fn predict(&self, features: &MatchFeatures) -> (f64, f64) {
        let array = features.as_array();
        let predictions: [f64; BAG_COUNT] = std::array::from_fn(|i| self.bags[i].predict(&array));

        let weighted: f64 =
            predictions.iter().zip(BAG_WEIGHTS).map(|(p, w)| p * w).sum::<f64>().clamp(0.0, 1.0);

        let mean = predictions.iter().sum::<f64>() / BAG_COUNT as f64;
        let variance = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / BAG_COUNT as f64;
        let confidence = (1.0 - 2.0 * variance.sqrt()).clamp(0.5, 1.0);

        (weighted, confidence)
    }
}

/// The fixed linear combination used when no trained ensemble is available
/// (spec §4.3): text 0.25, semantic 0.20, weight 0.15, vendor 0.10,
/// brand 0.10, type 0.08, cannabinoid 0.07, price 0.05.
pub fn fixed_combination(features: &MatchFeatures) -> f64 {
    0.25 * features.text_similarity
        + 0.20 * features.semantic_similarity
        + 0.15 * features.weight_similarity
        + 0.10 * features.vendor_similarity
        + 0.10 * features.brand_similarity
        + 0.08 * features.type_similarity
        + 0.07 * features.cannabinoid_similarity
        + 0.05 * features.price_similarity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_features(value: f64) -> MatchFeatures {
        MatchFeatures {
            text_similarity: value,
            semantic_similarity: value,
            weight_similarity: value,
            price_similarity: value,
            vendor_similarity: value,
            brand_similarity: value,
            type_similarity: value,
            cannabinoid_similarity: value,
            length_similarity: value,
            token_overlap: value,
            edit_distance: value,
            phonetic_similarity: value,
        }
    }

    #[test]
    fn fixed_combination_of_all_ones_is_one() {
        assert!((fixed_combination(&sample_features(1.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_minimum_examples_yields_no_ensemble() {
        let examples = vec![FeedbackExample { features: [0.8; 12], score: 0.9 }; 5];
        assert!(FeedbackEnsemble::train(&examples, 1).is_none());
    }

    #[test]
    fn ensemble_trains_and_predicts_in_bounds_given_enough_examples() {
        let examples: Vec<FeedbackExample> = (0..20)
            .map(|i| FeedbackExample { features: [0.1 * (i % 10) as f64; 12], score: 0.1 * (i % 10) as f64 })
            .collect();
        let ensemble = FeedbackEnsemble::train(&examples, 7).expect("enough examples to train");
        let (score, confidence) = ensemble.predict(&sample_features(0.5));
        assert!((0.0..=1.0).contains(&score));
        assert!((0.5..=1.0).contains(&confidence));
    }
}
