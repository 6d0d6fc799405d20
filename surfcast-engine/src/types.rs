//! Core domain types for the fusion engine

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Closed set of data source kinds
///
/// Every source the engine consumes is one of these; each kind carries its
/// own static reliability prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Buoy,
    WeatherGrid,
    WaveModel,
    Satellite,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Buoy => "buoy",
            SourceKind::WeatherGrid => "weather_grid",
            SourceKind::WaveModel => "wave_model",
            SourceKind::Satellite => "satellite",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-reading quality tag, carried through to event attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    Good,
    Questionable,
    Estimated,
}

impl std::fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualityFlag::Good => "good",
            QualityFlag::Questionable => "questionable",
            QualityFlag::Estimated => "estimated",
        };
        write!(f, "{}", s)
    }
}

/// One raw reading from one source
///
/// Any numeric field may be absent. Absence is `None`, never a zero, and
/// propagates through all downstream aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceObservation {
    pub source: String,
    pub kind: SourceKind,
    pub observed_at: NaiveDateTime,
    pub height_m: Option<f64>,
    pub period_s: Option<f64>,
    pub direction_deg: Option<f64>,
    pub quality: QualityFlag,
}

impl SourceObservation {
    pub fn new(source: &str, kind: SourceKind, observed_at: NaiveDateTime) -> Self {
        Self {
            source: source.to_string(),
            kind,
            observed_at,
            height_m: None,
            period_s: None,
            direction_deg: None,
            quality: QualityFlag::Good,
        }
    }

    /// True when at least one numeric field is present
    pub fn has_any_reading(&self) -> bool {
        self.height_m.is_some() || self.period_s.is_some() || self.direction_deg.is_some()
    }
}

/// Which source contributed a value, when, and at what quality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub source: String,
    pub kind: SourceKind,
    pub observed_at: NaiveDateTime,
    pub quality: QualityFlag,
}

/// One source's contribution to a swell event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwellComponent {
    pub height_m: Option<f64>,
    pub period_s: Option<f64>,
    pub direction_deg: Option<f64>,
    /// Reliability weight of the contributing source at fusion time, in [0,1]
    pub weight: f64,
    pub attribution: SourceAttribution,
}

/// A consolidated description of one swell, fused from one or more sources
///
/// Immutable once created; a re-fusion with new data produces a new event
/// rather than mutating this one. Dominant statistics are computed from
/// present values only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwellEvent {
    pub components: Vec<SwellComponent>,
    pub dominant_height_m: Option<f64>,
    pub dominant_period_s: Option<f64>,
    pub dominant_direction_deg: Option<f64>,
    pub start_time: NaiveDateTime,
    pub peak_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Full attribution list: which sources contributed, when, at what quality
    pub attributions: Vec<SourceAttribution>,
}

impl SwellEvent {
    /// Names of the contributing sources, in attribution order
    pub fn source_names(&self) -> Vec<&str> {
        self.attributions.iter().map(|a| a.source.as_str()).collect()
    }
}

/// Wave size buckets used for category matching in validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    Flat,
    Small,
    Moderate,
    Large,
    Epic,
}

impl SizeCategory {
    /// Bucket a wave height using ascending boundaries
    /// (flat < b0 <= small < b1 <= moderate < b2 <= large < b3 <= epic)
    pub fn from_height(height_m: f64, bounds_m: &[f64]) -> Self {
        let buckets = [
            SizeCategory::Flat,
            SizeCategory::Small,
            SizeCategory::Moderate,
            SizeCategory::Large,
            SizeCategory::Epic,
        ];
        let mut idx = 0;
        for bound in bounds_m {
            if height_m < *bound {
                break;
            }
            idx += 1;
        }
        buckets[idx.min(buckets.len() - 1)]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeCategory::Flat => "flat",
            SizeCategory::Small => "small",
            SizeCategory::Moderate => "moderate",
            SizeCategory::Large => "large",
            SizeCategory::Epic => "epic",
        }
    }

    /// Parse a stored category label; unknown labels are `None`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "flat" => Some(SizeCategory::Flat),
            "small" => Some(SizeCategory::Small),
            "moderate" => Some(SizeCategory::Moderate),
            "large" => Some(SizeCategory::Large),
            "epic" => Some(SizeCategory::Epic),
            _ => None,
        }
    }
}

impl std::fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
