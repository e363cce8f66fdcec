//! Regression metrics and ensemble confidence
//!
//! R² = 1 - SS_res / SS_tot, RMSE = sqrt(MSE), MAE = mean(|y - ŷ|).
//! Confidence maps ensemble spread to a percentage relative to the scale of
//! the training target.

use agrisense_ai_core::stats::mean;

/// Lower bound on the target scale used by [`confidence_from_std`]
pub const MIN_TARGET_SCALE: f64 = 1.0;

/// Spread (relative to the target scale) at which confidence reaches zero
pub const CONFIDENCE_SPREAD_FACTOR: f64 = 1.5;

/// Coefficient of determination.
///
/// A constant ground truth scores 1.0 when predicted exactly and 0.0
/// otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(actual.len(), predicted.len());
    let Some(y_mean) = mean(actual) else {
        return 0.0;
    };

    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(actual.len(), predicted.len());
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .collect();
    mean(&errors).unwrap_or(0.0)
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_squared_error(actual, predicted).sqrt()
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    assert_eq!(actual.len(), predicted.len());
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .collect();
    mean(&errors).unwrap_or(0.0)
}

/// Convert one ensemble standard deviation into a confidence percentage:
///
/// `clip(100 * (1 - std / (max(|y_mean|, 1) * 1.5)), 0, 100)`
pub fn confidence_from_std(std: f64, y_mean: f64) -> f64 {
    let scale = y_mean.abs().max(MIN_TARGET_SCALE);
    (100.0 * (1.0 - std / (scale * CONFIDENCE_SPREAD_FACTOR))).clamp(0.0, 100.0)
}

/// Confidence for each standard deviation
pub fn confidences(stds: &[f64], y_mean: f64) -> Vec<f64> {
    stds.iter().map(|&s| confidence_from_std(s, y_mean)).collect()
}

/// Held-out evaluation of a trained model
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl Evaluation {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            r2: r2_score(actual, predicted),
            rmse: root_mean_squared_error(actual, predicted),
            mae: mean_absolute_error(actual, predicted),
        }
    }
}

/// Per-sample uncertainty on the test split
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertainty {
    pub stds: Vec<f64>,
    pub confidences: Vec<f64>,
}

impl Uncertainty {
    pub fn from_stds(stds: Vec<f64>, y_train_mean: f64) -> Self {
        let confidences = confidences(&stds, y_train_mean);
        Self { stds, confidences }
    }

    pub fn mean_std(&self) -> Option<f64> {
        mean(&self.stds)
    }

    pub fn avg_confidence(&self) -> Option<f64> {
        mean(&self.confidences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_perfect_prediction() {
        let y = [1.0, 2.0, 3.0];
        let eval = Evaluation::compute(&y, &y);
        assert_eq!(eval.r2, 1.0);
        assert_eq!(eval.rmse, 0.0);
        assert_eq!(eval.mae, 0.0);
    }

    #[test]
    fn test_known_errors() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        let predicted = [1.5, 2.5, 2.5, 3.5];
        assert!((mean_absolute_error(&actual, &predicted) - 0.5).abs() < 1e-12);
        assert!((root_mean_squared_error(&actual, &predicted) - 0.5).abs() < 1e-12);
        // SS_res = 1.0, SS_tot = 5.0
        assert!((r2_score(&actual, &predicted) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_r2_predicting_mean_is_zero() {
        let actual = [1.0, 2.0, 3.0];
        assert!(r2_score(&actual, &[2.0, 2.0, 2.0]).abs() < 1e-12);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn test_confidence_examples() {
        assert_eq!(confidence_from_std(0.0, 4.0), 100.0);
        // scale 4 * 1.5 = 6, std 3 → 50%
        assert!((confidence_from_std(3.0, 4.0) - 50.0).abs() < 1e-12);
        assert!((confidence_from_std(3.0, -4.0) - 50.0).abs() < 1e-12);
        assert_eq!(confidence_from_std(60.0, 4.0), 0.0);
        // near-zero mean falls back to a unit scale
        assert!((confidence_from_std(0.75, 0.01) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_uncertainty_summary() {
        let u = Uncertainty::from_stds(vec![0.0, 3.0], 4.0);
        assert_eq!(u.confidences, vec![100.0, 50.0]);
        assert_eq!(u.avg_confidence(), Some(75.0));
        assert_eq!(u.mean_std(), Some(1.5));
        assert_eq!(Uncertainty::from_stds(vec![], 4.0).avg_confidence(), None);
    }

    proptest! {
        #[test]
        fn confidence_is_bounded(std in 0.0f64..1e9, y_mean in -1e6f64..1e6) {
            let c = confidence_from_std(std, y_mean);
            prop_assert!((0.0..=100.0).contains(&c));
        }

        #[test]
        fn confidence_decreases_with_std(
            a in 0.0f64..100.0,
            delta in 1e-3f64..100.0,
            y_mean in -50.0f64..50.0,
        ) {
            let b = a + delta;
            let ca = confidence_from_std(a, y_mean);
            let cb = confidence_from_std(b, y_mean);
            let cutoff = y_mean.abs().max(MIN_TARGET_SCALE) * CONFIDENCE_SPREAD_FACTOR;
            if a < cutoff {
                prop_assert!(cb < ca);
            } else {
                prop_assert_eq!(cb, 0.0);
                prop_assert_eq!(ca, 0.0);
            }
        }
    }
}
