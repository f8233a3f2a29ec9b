//! Fixed-count, equal-width histogram binning.
//!
//! Bin i covers [lo + i*step, lo + (i+1)*step); the last bin also takes the
//! domain maximum. Out-of-domain values are clamped into the first or last bin,
//! so every finite input is counted exactly once.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    /// Bin midpoint: lo + (i + 0.5) * step
    pub coordinate: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub lo: f64,
    pub step: f64,
    pub bins: Vec<Bin>,
}

impl Histogram {
    pub fn empty() -> Self {
        Self { lo: 0.0, step: 0.0, bins: Vec::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Index of the bin `v` is counted in. `None` for non-finite values or an empty histogram.
    #[inline]
    pub fn index_of(&self, v: f64) -> Option<usize> {
        if self.bins.is_empty() || !v.is_finite() {
            return None;
        }
        Some(bin_index(v, self.lo, self.step, self.bins.len()))
    }
}

/// Bin `values` into `bin_count` equal-width bins over `domain`, or over the
/// observed [min, max] of the finite values when no domain is given.
///
/// Non-finite values are ignored. No finite values (or `bin_count == 0`)
/// yields an empty histogram. A zero-width range uses step 1, which puts
/// every value in bin 0.
pub fn bin(values: &[f64], bin_count: usize, domain: Option<(f64, f64)>) -> Histogram {
    if bin_count == 0 {
        return Histogram::empty();
    }

    let finite = || values.iter().copied().filter(|v| v.is_finite());
    if finite().next().is_none() {
        return Histogram::empty();
    }

    let (lo, hi) = match domain {
        Some((a, b)) if a.is_finite() && b.is_finite() => (a.min(b), a.max(b)),
        _ => finite().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v))),
    };

    let span = hi - lo;
    let step = if span > 0.0 { span / bin_count as f64 } else { 1.0 };

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin { coordinate: lo + (i as f64 + 0.5) * step, count: 0 })
        .collect();

    for v in finite() {
        bins[bin_index(v, lo, step, bin_count)].count += 1;
    }

    Histogram { lo, step, bins }
}

/// Risk-score histogram over the fixed [0, 1] domain. Scores are clamped to
/// [0, 1 - epsilon] first so a score of exactly 1.0 lands in the last bin.
pub fn bin_risk_scores(scores: &[f64], bin_count: usize, epsilon: f64) -> Histogram {
    let upper = 1.0 - epsilon;
    let clamped: Vec<f64> = scores
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, upper))
        .collect();
    bin(&clamped, bin_count, Some((0.0, 1.0)))
}

/// Bin edge a threshold reference line is drawn on: ceil(threshold * bins) / bins.
#[inline]
pub fn threshold_marker(threshold: f64, bin_count: usize) -> Option<f64> {
    if bin_count == 0 || !threshold.is_finite() {
        return None;
    }
    let n = bin_count as f64;
    Some((threshold * n).ceil() / n)
}

#[inline]
fn bin_index(v: f64, lo: f64, step: f64, bin_count: usize) -> usize {
    let raw = ((v - lo) / step).floor();
    if raw <= 0.0 {
        0
    } else {
        (raw as usize).min(bin_count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(h: &Histogram) -> Vec<u64> {
        h.bins.iter().map(|b| b.count).collect()
    }

    #[test]
    fn test_empty_input_yields_no_bins() {
        assert!(bin(&[], 20, None).is_empty());
        assert!(bin(&[], 20, Some((0.0, 1.0))).is_empty());
        assert!(bin(&[f64::NAN, f64::INFINITY], 20, None).is_empty());
        assert!(bin(&[1.0, 2.0], 0, None).is_empty());
    }

    #[test]
    fn test_counts_sum_to_finite_inputs() {
        let values = [3.2, -1.0, 7.5, 7.5, 0.0, 12.25, f64::NAN, 4.4, 9.9, 1.1];
        for n in 1..=25 {
            let h = bin(&values, n, None);
            assert_eq!(h.bins.len(), n);
            assert_eq!(h.total(), 9, "bin_count={n}");
        }
    }

    #[test]
    fn test_degenerate_range_uses_unit_step() {
        let h = bin(&[5.0, 5.0, 5.0], 20, None);
        assert_eq!(h.bins.len(), 20);
        assert_eq!(h.bins[0].count, 3);
        assert_eq!(h.total(), 3);
        assert!((h.step - 1.0).abs() < 1e-12);
        assert!((h.bins[0].coordinate - 5.5).abs() < 1e-12);

        let single = bin(&[42.0], 4, None);
        assert_eq!(counts(&single), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_boundaries_belong_to_upper_bin() {
        // step = 2: edges at 0, 2, 4, 6, 8
        let h = bin(&[0.0, 2.0, 3.999, 4.0, 8.0], 4, None);
        assert_eq!(counts(&h), vec![1, 2, 1, 1], "max value goes to the last bin");
        let coords: Vec<f64> = h.bins.iter().map(|b| b.coordinate).collect();
        assert_eq!(coords, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_fixed_domain_clamps_outliers() {
        let h = bin(&[-3.0, 0.25, 0.5, 9.0], 2, Some((0.0, 1.0)));
        assert_eq!(counts(&h), vec![2, 2]);
    }

    #[test]
    fn test_risk_scores_fill_last_bin_at_one() {
        let h = bin_risk_scores(&[1.0, 0.999, 0.0, 0.12, 1.7, -0.2], 20, 1e-6);
        assert_eq!(h.bins.len(), 20);
        assert_eq!(h.bins[19].count, 3, "1.0, 0.999 and clamped 1.7");
        assert_eq!(h.bins[0].count, 2, "0.0 and clamped -0.2");
        assert_eq!(h.bins[2].count, 1);
        assert_eq!(h.total(), 6);
        assert!((h.bins[0].coordinate - 0.025).abs() < 1e-12);
        assert!((h.bins[19].coordinate - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_index_of_matches_binning() {
        let values = [1.0, 2.5, 3.0, 9.0, 10.0];
        let h = bin(&values, 3, None);
        for &v in &values {
            let i = h.index_of(v).unwrap();
            assert!(h.bins[i].count > 0, "value {v} should land in a non-empty bin");
        }
        assert_eq!(h.index_of(f64::NAN), None);
        assert_eq!(Histogram::empty().index_of(1.0), None);
    }

    #[test]
    fn test_threshold_marker_snaps_up_to_edge() {
        assert_eq!(threshold_marker(0.5, 20), Some(0.5));
        let m = threshold_marker(0.62, 20).unwrap();
        assert!((m - 0.65).abs() < 1e-12, "marker={m}");
        assert_eq!(threshold_marker(f64::NAN, 20), None);
        assert_eq!(threshold_marker(0.5, 0), None);
    }

    #[test]
    fn test_binning_is_deterministic() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 * 0.173).collect();
        assert_eq!(bin(&values, 20, None), bin(&values, 20, None));
    }
}
