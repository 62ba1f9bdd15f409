//! Order-statistic summaries of a completed sample set.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    #[serde(rename = "80")]
    pub ci80: [f64; 2],
    #[serde(rename = "90")]
    pub ci90: [f64; 2],
    #[serde(rename = "95")]
    pub ci95: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub confidence_intervals: ConfidenceIntervals,
}

/// Mean and sample standard deviation (n - 1 denominator).
pub fn mean_and_std(samples: &[f64]) -> (f64, f64) {
    let n = samples.len();
    if n == 0 {
        return (0.0, 0.0);
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, 0.0);
    }

    let var = samples
        .iter()
        .map(|x| (x - mean) * (x - mean))
        .sum::<f64>()
        / (n - 1) as f64;
    (mean, var.sqrt())
}

/// Linear-interpolated order statistic at position p/100 * (n - 1).
/// `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile of empty sample set");
    debug_assert!((0.0..=100.0).contains(&p), "percentile level out of range");

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let pos = p / 100.0 * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 >= n {
        return sorted[n - 1];
    }
    sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
}

/// Central interval covering `level` percent of the sorted samples.
pub fn confidence_interval(sorted: &[f64], level: f64) -> [f64; 2] {
    let tail = (100.0 - level) / 2.0;
    [percentile(sorted, tail), percentile(sorted, 100.0 - tail)]
}

/// Full summary of one run's outcomes. Sorting is stable, so equal
/// outcomes keep their iteration order and the result is deterministic.
pub fn summarize(samples: &[f64]) -> SummaryStats {
    let (mean, std_dev) = mean_and_std(samples);

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    SummaryStats {
        mean,
        std_dev,
        percentiles: Percentiles {
            p10: percentile(&sorted, 10.0),
            p50: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
        },
        confidence_intervals: ConfidenceIntervals {
            ci80: confidence_interval(&sorted, 80.0),
            ci90: confidence_interval(&sorted, 90.0),
            ci95: confidence_interval(&sorted, 95.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{mean_and_std, percentile, summarize};

    #[test]
    fn mean_and_std_of_known_values() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        // Sample (n-1) standard deviation of the classic example set.
        assert!((std - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&sorted, 0.0) - 10.0).abs() < 1e-12);
        assert!((percentile(&sorted, 50.0) - 30.0).abs() < 1e-12);
        assert!((percentile(&sorted, 100.0) - 50.0).abs() < 1e-12);
        // 25th percentile sits at position 1.0 exactly in a 5-element set.
        assert!((percentile(&sorted, 25.0) - 20.0).abs() < 1e-12);
        // 10th percentile interpolates 40% of the way from 10 to 20.
        assert!((percentile(&sorted, 10.0) - 14.0).abs() < 1e-12);
    }

    #[test]
    fn percentiles_are_monotone() {
        let samples: Vec<f64> = (0..5_000).map(|i| ((i * 37) % 1_000) as f64).collect();
        let summary = summarize(&samples);
        let p = summary.percentiles;
        assert!(p.p10 <= p.p50 && p.p50 <= p.p90 && p.p90 <= p.p95);
    }

    #[test]
    fn confidence_intervals_nest() {
        let samples: Vec<f64> = (0..10_000).map(|i| (i as f64).sin() * 100.0).collect();
        let summary = summarize(&samples);
        let ci = summary.confidence_intervals;
        assert!(ci.ci95[0] <= ci.ci90[0] && ci.ci90[0] <= ci.ci80[0]);
        assert!(ci.ci80[1] <= ci.ci90[1] && ci.ci90[1] <= ci.ci95[1]);
    }

    #[test]
    fn single_sample_degenerates_cleanly() {
        let summary = summarize(&[42.0]);
        assert_eq!(summary.mean, 42.0);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.percentiles.p90, 42.0);
    }
}
