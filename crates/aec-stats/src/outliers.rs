//! Outlier detection.
//!
//! Each [`OutlierMethod`] has one [`OutlierDetector`]. Detection optionally
//! runs on square-rooted magnitudes, see [`remove_outliers`].

use aec_model::{CellValue, OutlierMethod, OutlierPolicy, OutlierThresholds};
use tracing::debug;

use crate::engine::{Observation, mean, quantile, sample_std};

/// Values kept and ids dropped by outlier removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlierOutcome {
    pub kept: Vec<Observation>,
    pub outlier_ids: Vec<CellValue>,
}

/// Splits observations into inliers and outliers.
pub trait OutlierDetector {
    fn split(&self, values: Vec<Observation>) -> OutlierOutcome;
}

/// Drops values whose absolute z-score exceeds `threshold`, in one pass.
#[derive(Debug, Clone, Copy)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

/// Repeats z-score passes while the previous pass saw an absolute z-score
/// above `stop_below` and dropped at least one value.
#[derive(Debug, Clone, Copy)]
pub struct RepeatedZScoreDetector {
    pub threshold: f64,
    pub stop_below: f64,
}

/// Drops values outside `[Q1 - multiplier·IQR, Q3 + multiplier·IQR]`.
#[derive(Debug, Clone, Copy)]
pub struct IqrDetector {
    pub multiplier: f64,
}

/// Detector for `method` with the given cut-offs.
pub fn detector(method: OutlierMethod, thresholds: &OutlierThresholds) -> Box<dyn OutlierDetector> {
    match method {
        OutlierMethod::ZScore => Box::new(ZScoreDetector {
            threshold: thresholds.z_score,
        }),
        OutlierMethod::RepeatedZScore => Box::new(RepeatedZScoreDetector {
            threshold: thresholds.z_score,
            stop_below: thresholds.repeated_z_max,
        }),
        OutlierMethod::Iqr => Box::new(IqrDetector {
            multiplier: thresholds.iqr_multiplier,
        }),
    }
}

/// One z-score pass. Returns the outcome and the largest |z| seen (NaN when
/// no z-score is defined).
fn zscore_pass(values: Vec<Observation>, threshold: f64) -> (OutlierOutcome, f64) {
    let raw: Vec<f64> = values.iter().map(|o| o.value).collect();
    let mean = mean(&raw);
    let std = sample_std(&raw);
    let mut outcome = OutlierOutcome::default();
    let mut z_max = f64::NAN;
    for observation in values {
        let z = ((observation.value - mean) / std).abs();
        if !z.is_nan() {
            z_max = if z_max.is_nan() { z } else { z_max.max(z) };
        }
        if z > threshold {
            outcome.outlier_ids.push(observation.id);
        } else {
            outcome.kept.push(observation);
        }
    }
    (outcome, z_max)
}

impl OutlierDetector for ZScoreDetector {
    fn split(&self, values: Vec<Observation>) -> OutlierOutcome {
        zscore_pass(values, self.threshold).0
    }
}

impl OutlierDetector for RepeatedZScoreDetector {
    fn split(&self, values: Vec<Observation>) -> OutlierOutcome {
        let mut kept = values;
        let mut outlier_ids = Vec::new();
        let mut z_max = f64::INFINITY;
        let mut passes = 0;
        while z_max > self.stop_below {
            let (outcome, seen) = zscore_pass(kept, self.threshold);
            kept = outcome.kept;
            passes += 1;
            if outcome.outlier_ids.is_empty() {
                break;
            }
            outlier_ids.extend(outcome.outlier_ids);
            z_max = seen;
        }
        debug!(passes, dropped = outlier_ids.len(), "repeated z-score finished");
        OutlierOutcome { kept, outlier_ids }
    }
}

impl OutlierDetector for IqrDetector {
    fn split(&self, values: Vec<Observation>) -> OutlierOutcome {
        let mut sorted: Vec<f64> = values.iter().map(|o| o.value).collect();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (low, high) = (q1 - self.multiplier * iqr, q3 + self.multiplier * iqr);

        let mut outcome = OutlierOutcome::default();
        for observation in values {
            if observation.value >= low && observation.value <= high {
                outcome.kept.push(observation);
            } else {
                outcome.outlier_ids.push(observation.id);
            }
        }
        outcome
    }
}

/// Remove outliers according to `policy`.
///
/// With the square-root transform, signs are flipped first when more than
/// half of the values are negative; values still negative are then dropped
/// (they are not reported as outliers). Detection runs on the roots, and
/// the kept values are returned in their original scale and sign. When a
/// root is not finite, detection runs on the untransformed magnitudes.
pub fn remove_outliers(values: Vec<Observation>, policy: &OutlierPolicy) -> OutlierOutcome {
    let method = detector(policy.method, &policy.thresholds);
    if !policy.sqrt_transform {
        return method.split(values);
    }

    let negatives = values.iter().filter(|o| o.value < 0.0).count();
    let flipped = negatives * 2 > values.len();
    let magnitudes: Vec<Observation> = values
        .into_iter()
        .map(|o| Observation {
            value: if flipped { -o.value } else { o.value },
            id: o.id,
        })
        .filter(|o| o.value >= 0.0)
        .collect();

    let transformed = magnitudes.iter().all(|o| o.value.sqrt().is_finite());
    let working = if transformed {
        magnitudes
            .into_iter()
            .map(|o| Observation {
                value: o.value.sqrt(),
                id: o.id,
            })
            .collect()
    } else {
        debug!("square root not finite, detecting on raw magnitudes");
        magnitudes
    };

    let mut outcome = method.split(working);
    for observation in &mut outcome.kept {
        if transformed {
            observation.value = observation.value.powi(2);
        }
        if flipped {
            observation.value = -observation.value;
        }
    }
    outcome
}
