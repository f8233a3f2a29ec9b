pub mod bands;
pub mod histogram;

use bands::RiskBands;
use histogram::Histogram;
use serde::Serialize;

/// Histogram bin with its fill colour, ready for a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBin {
    pub coordinate: f64,
    pub count: u64,
    pub color: String,
}

/// Risk histogram bins coloured by the risk band of their coordinate.
pub fn risk_chart_bins(hist: &Histogram, bands: &RiskBands) -> Vec<ChartBin> {
    hist.bins
        .iter()
        .map(|b| ChartBin {
            coordinate: b.coordinate,
            count: b.count,
            color: bands.classify(b.coordinate).color.to_string(),
        })
        .collect()
}

/// Value histogram bins coloured along a green-to-red gradient.
pub fn value_chart_bins(hist: &Histogram) -> Vec<ChartBin> {
    let n = hist.bins.len();
    hist.bins
        .iter()
        .enumerate()
        .map(|(i, b)| ChartBin {
            coordinate: b.coordinate,
            count: b.count,
            color: gradient_color(i, n),
        })
        .collect()
}

/// rgb(22 + 220t, 163 - 120t, 74 - 40t) with t = i / (n - 1).
pub fn gradient_color(i: usize, n: usize) -> String {
    let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
    let r = (22.0 + t * 220.0).round() as u8;
    let g = (163.0 - t * 120.0).round() as u8;
    let b = (74.0 - t * 40.0).round() as u8;
    format!("rgb({r},{g},{b})")
}
