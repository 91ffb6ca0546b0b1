//! Tier-to-configuration planning.
//!
//! [`plan`] maps a [`CapabilityTier`] to the fixed set of feature toggles
//! and limits the rest of the client consumes: the scheduler's concurrency
//! cap, whether heavy visual effects are enabled, and animation timing.
//! Pure lookup — no signal reads, no side effects.

use crate::capability::{CapabilityTier, current_tier};

/// Feature toggles and limits derived from a capability tier.
///
/// Never mutated after creation; build a new one via [`plan`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Cap on simultaneously in-flight outbound requests. Always ≥ 1.
    pub max_concurrent_requests: usize,
    /// Whether the presentation layer may run expensive visual effects.
    pub enable_heavy_effects: bool,
    /// Duration for presentation-layer animations, in milliseconds.
    pub animation_duration_ms: u64,
}

/// Map a tier to its planner configuration.
///
/// | tier   | max requests | heavy effects | animation |
/// |--------|--------------|---------------|-----------|
/// | High   | 6            | yes           | 600 ms    |
/// | Medium | 4            | yes           | 600 ms    |
/// | Low    | 2            | no            | 300 ms    |
pub fn plan(tier: CapabilityTier) -> PlannerConfig {
    match tier {
        CapabilityTier::High => PlannerConfig {
            max_concurrent_requests: 6,
            enable_heavy_effects: true,
            animation_duration_ms: 600,
        },
        CapabilityTier::Medium => PlannerConfig {
            max_concurrent_requests: 4,
            enable_heavy_effects: true,
            animation_duration_ms: 600,
        },
        CapabilityTier::Low => PlannerConfig {
            max_concurrent_requests: 2,
            enable_heavy_effects: false,
            animation_duration_ms: 300,
        },
    }
}

/// Plan for the process's cached tier. Convenience for binaries.
pub fn current_plan() -> PlannerConfig {
    plan(current_tier())
}
