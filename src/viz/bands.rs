use super::histogram::Histogram;
use serde::Serialize;
use smallvec::SmallVec;

/// A named ordinal category over a scalar domain: covers [lower, upper).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub key: &'static str,
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub color: &'static str,
}

/// Legend row: a band with its observation count and share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub key: &'static str,
    pub label: &'static str,
    pub color: String,
    pub count: u64,
    pub percentage: f64,
}

const RISK_KEYS: [(&str, &str, &str); 5] = [
    ("very-low", "Very Low", "#16a34a"),
    ("low", "Low", "#84cc16"),
    ("medium", "Medium", "#eab308"),
    ("medium-high", "Medium-High", "#f97316"),
    ("high", "High", "#dc2626"),
];

/// Five risk bands over probability-like scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskBands {
    bands: [Band; 5],
}

impl RiskBands {
    /// `boundaries` are the exclusive upper edges of the first four bands.
    pub fn new(boundaries: [f64; 4]) -> Self {
        let bands = std::array::from_fn(|i| {
            let (key, label, color) = RISK_KEYS[i];
            Band {
                key,
                label,
                lower: if i == 0 { f64::NEG_INFINITY } else { boundaries[i - 1] },
                upper: if i == 4 { f64::INFINITY } else { boundaries[i] },
                color,
            }
        });
        Self { bands }
    }

    #[inline]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// First band whose upper edge exceeds `x`; anything else (including NaN)
    /// falls in the last band, so classification is total.
    #[inline]
    pub fn classify(&self, x: f64) -> &Band {
        self.bands[..4]
            .iter()
            .find(|b| x < b.upper)
            .unwrap_or(&self.bands[4])
    }

    /// Per-band totals of a risk histogram, each bin assigned by its coordinate.
    pub fn count_bins(&self, hist: &Histogram) -> SmallVec<[BandCount; 5]> {
        let mut counts = [0u64; 5];
        for b in &hist.bins {
            let band = self.classify(b.coordinate);
            if let Some(i) = self.bands.iter().position(|x| x.key == band.key) {
                counts[i] += b.count;
            }
        }
        let total = hist.total();
        self.bands
            .iter()
            .zip(counts)
            .map(|(band, count)| BandCount {
                key: band.key,
                label: band.label,
                color: band.color.to_string(),
                count,
                percentage: percentage(count, total),
            })
            .collect()
    }
}

impl Default for RiskBands {
    fn default() -> Self {
        Self::new([0.2, 0.4, 0.6, 0.8])
    }
}

const QUARTILE_KEYS: [(&str, &str, &str); 4] = [
    ("low", "Low", "#16a34a"),
    ("mid-low", "Mid-Low", "#84cc16"),
    ("mid-high", "Mid-High", "#f97316"),
    ("high", "High", "#dc2626"),
];

/// Four contiguous groups of histogram bins for regressor values.
/// Groups hold ceil(bins / 4) bins each, the last one possibly fewer, so
/// quartile counts always agree with the displayed histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuartileBands {
    group_size: usize,
}

impl QuartileBands {
    pub fn new(bin_count: usize) -> Self {
        Self {
            group_size: bin_count.div_ceil(4).max(1),
        }
    }

    #[inline]
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Group (0..4) that histogram bin `i` belongs to.
    #[inline]
    pub fn group_of_bin(&self, i: usize) -> usize {
        (i / self.group_size).min(3)
    }

    /// Quartile label of a raw value, located through the histogram it was binned in.
    pub fn classify(&self, hist: &Histogram, v: f64) -> Option<&'static str> {
        hist.index_of(v).map(|i| QUARTILE_KEYS[self.group_of_bin(i)].1)
    }

    /// Legend rows. `bin_colors` are the per-bin chart colours; a group takes
    /// the colour of its first bin, the top group falls back to the last bin.
    pub fn count(&self, hist: &Histogram, bin_colors: &[String]) -> SmallVec<[BandCount; 4]> {
        let total = hist.total();
        let n = hist.bins.len();

        (0..4)
            .map(|k| {
                let start = k * self.group_size;
                let end = ((k + 1) * self.group_size).min(n);
                let count = if start < end {
                    hist.bins[start..end].iter().map(|b| b.count).sum()
                } else {
                    0
                };
                let (key, label, fallback) = QUARTILE_KEYS[k];
                let color = bin_colors
                    .get(start)
                    .or_else(|| if k == 3 { bin_colors.last() } else { None })
                    .cloned()
                    .unwrap_or_else(|| fallback.to_string());
                BandCount { key, label, color, count, percentage: percentage(count, total) }
            })
            .collect()
    }
}

/// Share of `total` in percent; an empty total counts as 1 so empty charts read 0%.
#[inline]
pub fn percentage(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64 * 100.0
}
