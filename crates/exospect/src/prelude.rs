//! Convenience re-exports for common `exospect` types.
//!
//! Meant to be glob-imported by client binaries:
//!
//! ```ignore
//! use exospect::prelude::*;
//! ```

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{
    Classification, FeatureWeight, PredictClient, PredictionStatus, TransitParams,
    VisualizationData,
};

// ── Capability & planning ───────────────────────────────────────────
pub use crate::capability::{CapabilityTier, HostSignals, classify, current_tier, invalidate_tier};
pub use crate::planner::{PlannerConfig, current_plan, plan};

// ── Scheduling & metrics ────────────────────────────────────────────
pub use crate::metrics::{
    DEFAULT_METRICS, DEFAULT_METRICS_KEY, FetchError, HttpMetricsSource, MetricsCache,
    MetricsCacheConfig, MetricsSource, ModelMetrics,
};
pub use crate::scheduler::RequestScheduler;

// ── Chart geometry ──────────────────────────────────────────────────
pub use crate::chart::{
    ChartSlice, Contribution, SignedBar, bar_extents, pie_slices, polar_to_planar, signed_bars,
    wedge_path,
};
