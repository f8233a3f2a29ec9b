pub mod adhoc;
pub mod payload;
pub mod splitter;

use payload::PredFlag;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Classifier,
    Regressor,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
            Self::Regressor => write!(f, "regressor"),
        }
    }
}

/// One patient's row in a classifier series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifierRecord {
    pub patient_id: Option<String>,
    pub score: Option<f64>,
    pub pred: Option<PredFlag>,
    pub threshold: Option<f64>,
}

/// One patient's row in a regressor series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressorRecord {
    pub patient_id: Option<String>,
    pub prediction: Option<f64>,
}

/// Per-model sequence of records, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSeries {
    Classifier { name: String, records: Vec<ClassifierRecord> },
    Regressor { name: String, records: Vec<RegressorRecord> },
}

impl ModelSeries {
    pub fn new(name: &str, kind: ModelKind) -> Self {
        match kind {
            ModelKind::Classifier => Self::Classifier { name: name.to_string(), records: Vec::new() },
            ModelKind::Regressor => Self::Regressor { name: name.to_string(), records: Vec::new() },
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Self::Classifier { name, .. } | Self::Regressor { name, .. } => name,
        }
    }

    #[inline]
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Classifier { .. } => ModelKind::Classifier,
            Self::Regressor { .. } => ModelKind::Regressor,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Classifier { records, .. } => records.len(),
            Self::Regressor { records, .. } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_classifier(&self) -> Option<&[ClassifierRecord]> {
        match self {
            Self::Classifier { records, .. } => Some(records),
            Self::Regressor { .. } => None,
        }
    }

    pub fn as_regressor(&self) -> Option<&[RegressorRecord]> {
        match self {
            Self::Regressor { records, .. } => Some(records),
            Self::Classifier { .. } => None,
        }
    }
}
