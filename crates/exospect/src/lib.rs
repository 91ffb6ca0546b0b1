//! Adaptive resource and rendering core for an exoplanet-transit
//! classifier client.
//!
//! `exospect` is the engine room of a thin client that collects
//! planetary-transit parameters, submits them to a remote classifier, and
//! renders the classification. The view layer is a consumer of four small
//! cores:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`capability`] | One-shot host classification into a [`CapabilityTier`](capability::CapabilityTier) |
//! | [`planner`] | Tier → feature toggles and limits ([`PlannerConfig`](planner::PlannerConfig)) |
//! | [`scheduler`] | FIFO bounded-concurrency multiplexer for outbound calls |
//! | [`metrics`] | Stale-tolerant cache over the metrics endpoint, with retry and fallback |
//! | [`chart`] | Pure geometry: pie slices, bar scaling, signed-magnitude bars |
//!
//! Control flow: capability → planner → scheduler → metrics cache; the
//! chart module is independent and consumed with arbitrary numeric series.
//!
//! # Getting started
//!
//! ```ignore
//! use exospect::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let scheduler = RequestScheduler::from_plan(&current_plan());
//!
//!     let source = HttpMetricsSource::new(exospect::BACKEND_URL)?;
//!     let cache = MetricsCache::new(scheduler.clone(), Arc::new(source));
//!     let metrics = cache.get(DEFAULT_METRICS_KEY).await;
//!     println!("model accuracy: {:.1}%", metrics.accuracy * 100.0);
//!
//!     let client = PredictClient::new()?;
//!     let params = TransitParams::default();
//!     let result = scheduler
//!         .submit(async move { client.predict(&params).await })
//!         .await??;
//!     println!("{}", result.prediction);
//!     Ok(())
//! }
//! ```
//!
//! The classifier backend itself (model training, inference, persistence)
//! is out of scope; this crate only talks to it.

pub mod capability;
pub mod chart;
pub mod metrics;
pub mod planner;
pub mod prelude;
pub mod scheduler;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Constants ──────────────────────────────────────────────────────

/// Default classifier backend.
pub const BACKEND_URL: &str = "https://hunting-exoplanet-backend.onrender.com";

/// Timeout for a prediction round-trip (the backend cold-starts slowly).
pub const PREDICT_TIMEOUT: Duration = Duration::from_secs(30);

// ── Request types ──────────────────────────────────────────────────

/// Transit parameters submitted for classification. Field names follow the
/// KOI (Kepler Object of Interest) catalog columns the backend expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitParams {
    /// Orbital period, days.
    pub koi_period: f64,
    /// Planet radius, Earth radii.
    pub koi_prad: f64,
    /// Stellar effective temperature, K.
    pub koi_steff: f64,
    /// Transit duration, hours.
    pub koi_duration: f64,
    /// Transit depth, ppm.
    pub koi_depth: f64,
    /// Insolation flux, Earth flux.
    pub koi_insol: f64,
    /// Stellar radius, Solar radii.
    pub koi_srad: f64,
    /// Disposition score, 0–1.
    pub koi_score: f64,
    /// Not-transit-like flag (0 or 1).
    pub koi_fpflag_nt: u8,
    /// Stellar-eclipse flag (0 or 1).
    pub koi_fpflag_ss: u8,
    /// Centroid-offset flag (0 or 1).
    pub koi_fpflag_co: u8,
    /// Equilibrium temperature, K.
    pub koi_teq: f64,
    /// Transit signal-to-noise ratio.
    pub koi_model_snr: f64,
}

impl Default for TransitParams {
    /// Earth-around-Sun-like starting values.
    fn default() -> Self {
        Self {
            koi_period: 365.0,
            koi_prad: 1.0,
            koi_steff: 5778.0,
            koi_duration: 10.0,
            koi_depth: 1000.0,
            koi_insol: 1.0,
            koi_srad: 1.0,
            koi_score: 0.95,
            koi_fpflag_nt: 1,
            koi_fpflag_ss: 0,
            koi_fpflag_co: 0,
            koi_teq: 288.0,
            koi_model_snr: 12.5,
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Classification returned by the backend. Only `prediction` is
/// guaranteed; everything else varies by backend version.
#[derive(Deserialize, Debug, Clone)]
pub struct Classification {
    pub prediction: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub habitable_zone_status: Option<String>,
    #[serde(default)]
    pub visualization_data: Option<VisualizationData>,
    #[serde(default)]
    pub features: Option<Vec<FeatureWeight>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VisualizationData {
    #[serde(default)]
    pub orbital_distance: Option<f64>,
    #[serde(default)]
    pub planet_size: Option<f64>,
}

/// Per-feature contribution to the classification (SHAP-style). Feeds
/// [`chart::signed_bars`].
#[derive(Deserialize, Debug, Clone)]
pub struct FeatureWeight {
    pub feature: String,
    pub value: f64,
    #[serde(default)]
    pub contribution: Option<String>,
}

/// Disposition bucket parsed from the prediction string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    FalsePositive,
    Candidate,
    Confirmed,
}

impl PredictionStatus {
    /// Human-readable headline for the bucket.
    pub fn label(self) -> &'static str {
        match self {
            PredictionStatus::FalsePositive => "Not an Exoplanet",
            PredictionStatus::Candidate => "Potential Exoplanet",
            PredictionStatus::Confirmed => "Confirmed Exoplanet",
        }
    }
}

impl Classification {
    /// Bucket the backend's prediction string. Backends emit both
    /// shout-case and title-case labels; anything unrecognized counts as
    /// confirmed, matching the reference client.
    pub fn status(&self) -> PredictionStatus {
        let p = self.prediction.to_lowercase();
        if p == "false positive" {
            PredictionStatus::FalsePositive
        } else if p == "candidate" {
            PredictionStatus::Candidate
        } else {
            PredictionStatus::Confirmed
        }
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the classifier's prediction endpoint.
pub struct PredictClient {
    client: reqwest::Client,
    base_url: String,
}

impl PredictClient {
    /// Client against the default backend.
    pub fn new() -> Result<Self, String> {
        Self::with_base_url(BACKEND_URL)
    }

    /// Client against a custom backend base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("exospect/0.1")
            .timeout(PREDICT_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Submit transit parameters for classification.
    ///
    /// Callers wanting the concurrency cap should drive this through
    /// [`scheduler::RequestScheduler::submit`].
    pub async fn predict(&self, params: &TransitParams) -> Result<Classification, String> {
        debug!(
            "prediction request: period={}d, prad={}, snr={}",
            params.koi_period, params.koi_prad, params.koi_model_snr,
        );
        let start = Instant::now();

        let url = format!("{}/predict", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "prediction response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len(),
        );

        if !status.is_success() {
            return Err(format!("prediction API HTTP {status}: {text}"));
        }

        serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_serialize_with_koi_names() {
        let json = serde_json::to_value(TransitParams::default()).unwrap();
        assert_eq!(json["koi_period"], 365.0);
        assert_eq!(json["koi_steff"], 5778.0);
        assert_eq!(json["koi_fpflag_nt"], 1);
        assert_eq!(json["koi_model_snr"], 12.5);
    }

    #[test]
    fn classification_deserializes_full_response() {
        let raw = r#"{
            "prediction": "CANDIDATE",
            "confidence": 87.5,
            "habitable_zone_status": "Habitable Zone",
            "visualization_data": { "orbital_distance": 1.0, "planet_size": 1.1 },
            "features": [
                { "feature": "koi_score", "value": 1.8, "contribution": "positive" },
                { "feature": "koi_fpflag_nt", "value": -0.4, "contribution": "negative" }
            ]
        }"#;
        let c: Classification = serde_json::from_str(raw).unwrap();
        assert_eq!(c.prediction, "CANDIDATE");
        assert_eq!(c.confidence, Some(87.5));
        assert_eq!(c.features.as_ref().unwrap().len(), 2);
        assert_eq!(c.features.unwrap()[1].value, -0.4);
    }

    #[test]
    fn classification_minimal_response() {
        let c: Classification = serde_json::from_str(r#"{"prediction":"CONFIRMED"}"#).unwrap();
        assert_eq!(c.confidence, None);
        assert!(c.features.is_none());
    }

    #[test]
    fn status_buckets_both_casings() {
        let of = |p: &str| Classification {
            prediction: p.to_string(),
            confidence: None,
            habitable_zone_status: None,
            visualization_data: None,
            features: None,
        };
        assert_eq!(of("FALSE POSITIVE").status(), PredictionStatus::FalsePositive);
        assert_eq!(of("False Positive").status(), PredictionStatus::FalsePositive);
        assert_eq!(of("CANDIDATE").status(), PredictionStatus::Candidate);
        assert_eq!(of("Candidate").status(), PredictionStatus::Candidate);
        assert_eq!(of("CONFIRMED").status(), PredictionStatus::Confirmed);
        assert_eq!(of("anything else").status(), PredictionStatus::Confirmed);
    }

    #[test]
    fn status_labels() {
        assert_eq!(PredictionStatus::Candidate.label(), "Potential Exoplanet");
        assert_eq!(PredictionStatus::FalsePositive.label(), "Not an Exoplanet");
        assert_eq!(PredictionStatus::Confirmed.label(), "Confirmed Exoplanet");
    }
}
