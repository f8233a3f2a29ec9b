use crate::errors::{EngineError, EngineResult};

/// Numeric policy of the transformation engine.
/// Passed explicitly into every engine call; `Default` carries the dashboard's
/// production constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Exclusive upper edges of the first four risk bands.
    pub risk_band_boundaries: [f64; 4],
    pub risk_bins: usize,
    pub value_bins: usize,
    /// Risk scores are clamped into `[0, 1 - risk_clamp_epsilon]` before binning.
    pub risk_clamp_epsilon: f64,
    /// Ranking rule 3: score cutoff when neither threshold nor pred is present.
    pub fallback_cutoff: f64,
    pub high_risk_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_band_boundaries: [0.2, 0.4, 0.6, 0.8],
            risk_bins: 20,
            value_bins: 20,
            risk_clamp_epsilon: 1e-6,
            fallback_cutoff: 0.5,
            high_risk_limit: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub analytics_base_url: String,
    pub server_port: u16,
    pub upstream_timeout_secs: u64,
    /// Built dashboard bundle served for non-API paths.
    pub static_dir: String,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let upstream_timeout_secs = env_var_or("UPSTREAM_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| EngineError::Config(format!("UPSTREAM_TIMEOUT_SECS: {e}")))?;

        let risk_bins = parse_bins("RISK_HISTOGRAM_BINS")?;
        let value_bins = parse_bins("VALUE_HISTOGRAM_BINS")?;

        let high_risk_limit = env_var_or("HIGH_RISK_LIMIT", "20")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("HIGH_RISK_LIMIT: {e}")))?;

        let fallback_cutoff = env_var_or("FALLBACK_CUTOFF", "0.5")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("FALLBACK_CUTOFF: {e}")))?;
        if !fallback_cutoff.is_finite() {
            return Err(EngineError::Config(format!(
                "FALLBACK_CUTOFF: must be finite, got {fallback_cutoff}"
            )));
        }

        Ok(Self {
            analytics_base_url: env_var_or("ANALYTICS_BASE_URL", "http://127.0.0.1:8000"),
            server_port,
            upstream_timeout_secs,
            static_dir: env_var_or("STATIC_DIR", "dashboard/dist"),
            engine: EngineConfig {
                risk_bins,
                value_bins,
                fallback_cutoff,
                high_risk_limit,
                ..EngineConfig::default()
            },
        })
    }
}

fn parse_bins(key: &str) -> EngineResult<usize> {
    let bins = env_var_or(key, "20")
        .parse::<usize>()
        .map_err(|e| EngineError::Config(format!("{key}: {e}")))?;
    if bins == 0 {
        return Err(EngineError::Config(format!("{key}: must be at least 1")));
    }
    Ok(bins)
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
