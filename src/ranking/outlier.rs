//! Outlier classification for a single timing sample.

/// Return true when `sample` should disqualify a candidate.
///
/// A sample is an outlier when its weighted value exceeds the population mean
/// scaled by `multiplier`, or when it carries the missing-data sentinel
/// (any negative value).
pub fn is_outlier(mean: f64, sample: f64, weight: f64, multiplier: f64) -> bool {
    sample < 0.0 || sample * weight > mean * multiplier
}
