//! Host-capability classification.
//!
//! Reads coarse environment signals once and buckets the host into one of
//! three [`CapabilityTier`]s. The tier drives the [`planner`](crate::planner)
//! lookup table: concurrency limits, heavy visual effects, animation timing.
//!
//! Signals are read at most once per process (see [`current_tier`]);
//! [`classify`] itself is pure and total — every input has a default, so
//! there is no error path.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Logical core count used when the host doesn't report one.
pub const DEFAULT_CORES: usize = 2;

/// Approximate device memory (GB) used when the host doesn't report one.
pub const DEFAULT_MEMORY_GB: f64 = 2.0;

/// Env var overriding the detected memory size, in GB.
pub const MEMORY_GB_ENV: &str = "EXOSPECT_MEMORY_GB";

/// Env var supplying a user-agent-like string for mobile detection.
pub const USER_AGENT_ENV: &str = "EXOSPECT_USER_AGENT";

/// Platform tokens that mark a user-agent string as a mobile device.
/// Matched case-insensitively as substrings.
const MOBILE_TOKENS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Coarse classification of runtime capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTier {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityTier::High => write!(f, "high"),
            CapabilityTier::Medium => write!(f, "medium"),
            CapabilityTier::Low => write!(f, "low"),
        }
    }
}

/// Raw environment signals feeding the tier classification.
#[derive(Debug, Clone)]
pub struct HostSignals {
    /// Logical core count.
    pub cores: usize,
    /// Approximate device memory in GB.
    pub memory_gb: f64,
    /// User-agent-like string used for mobile detection. May be empty.
    pub user_agent: String,
}

impl HostSignals {
    /// Read the host's signals, falling back to defaults for anything the
    /// environment doesn't expose.
    ///
    /// Cores come from `std::thread::available_parallelism()`. There is no
    /// portable memory probe, so memory is taken from the
    /// `EXOSPECT_MEMORY_GB` env var (default 2.0 — same default the signal
    /// would get in a browser). The user-agent string comes from
    /// `EXOSPECT_USER_AGENT` when an embedder wants mobile handling.
    pub fn detect() -> Self {
        let cores = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(DEFAULT_CORES);
        let memory_gb = std::env::var(MEMORY_GB_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MEMORY_GB);
        let user_agent = std::env::var(USER_AGENT_ENV).unwrap_or_default();
        Self {
            cores,
            memory_gb,
            user_agent,
        }
    }

    /// Whether the user-agent string matches a known mobile platform token.
    pub fn is_mobile(&self) -> bool {
        let ua = self.user_agent.to_lowercase();
        MOBILE_TOKENS.iter().any(|t| ua.contains(t))
    }
}

/// Classify signals into a tier. First matching rule wins:
///
/// 1. High: cores ≥ 4 and memory ≥ 4 GB and not mobile.
/// 2. Medium: cores ≥ 2 and memory ≥ 2 GB (mobile allowed).
/// 3. Low: otherwise.
pub fn classify(signals: &HostSignals) -> CapabilityTier {
    let mobile = signals.is_mobile();
    if signals.cores >= 4 && signals.memory_gb >= 4.0 && !mobile {
        CapabilityTier::High
    } else if signals.cores >= 2 && signals.memory_gb >= 2.0 {
        CapabilityTier::Medium
    } else {
        CapabilityTier::Low
    }
}

/// Process-wide tier cache. `None` until the first [`current_tier`] call.
static TIER: Mutex<Option<CapabilityTier>> = Mutex::new(None);

/// The process's capability tier, computed on first call and cached.
///
/// Recomputation is idempotent — the signals are read once and downstream
/// consumers see one immutable value for the process lifetime.
pub fn current_tier() -> CapabilityTier {
    let mut cell = TIER.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(tier) = *cell {
        return tier;
    }
    let signals = HostSignals::detect();
    let tier = classify(&signals);
    debug!(
        "capability: cores={}, memory={}GB, mobile={} -> tier={}",
        signals.cores,
        signals.memory_gb,
        signals.is_mobile(),
        tier,
    );
    *cell = Some(tier);
    tier
}

/// Drop the cached tier so the next [`current_tier`] call re-reads signals.
pub fn invalidate_tier() {
    let mut cell = TIER.lock().unwrap_or_else(PoisonError::into_inner);
    *cell = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(cores: usize, memory_gb: f64, user_agent: &str) -> HostSignals {
        HostSignals {
            cores,
            memory_gb,
            user_agent: user_agent.to_string(),
        }
    }

    #[test]
    fn desktop_with_resources_is_high() {
        assert_eq!(classify(&signals(8, 16.0, "Mozilla/5.0")), CapabilityTier::High);
        assert_eq!(classify(&signals(4, 4.0, "")), CapabilityTier::High);
    }

    #[test]
    fn mobile_never_high() {
        assert_eq!(
            classify(&signals(8, 8.0, "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)")),
            CapabilityTier::Medium
        );
        assert_eq!(
            classify(&signals(8, 8.0, "Mozilla/5.0 (Linux; Android 14)")),
            CapabilityTier::Medium
        );
    }

    #[test]
    fn mid_range_is_medium() {
        assert_eq!(classify(&signals(2, 2.0, "")), CapabilityTier::Medium);
        assert_eq!(classify(&signals(3, 8.0, "")), CapabilityTier::Medium);
        assert_eq!(classify(&signals(8, 3.0, "")), CapabilityTier::Medium);
    }

    #[test]
    fn constrained_host_is_low() {
        assert_eq!(classify(&signals(1, 8.0, "")), CapabilityTier::Low);
        assert_eq!(classify(&signals(8, 1.0, "")), CapabilityTier::Low);
        assert_eq!(classify(&signals(1, 1.0, "")), CapabilityTier::Low);
    }

    #[test]
    fn mobile_tokens_case_insensitive() {
        assert!(signals(2, 2.0, "Opera Mini/36.2").is_mobile());
        assert!(signals(2, 2.0, "BLACKBERRY 9900").is_mobile());
        assert!(signals(2, 2.0, "something IEMobile something").is_mobile());
        assert!(!signals(2, 2.0, "Mozilla/5.0 (X11; Linux x86_64)").is_mobile());
        assert!(!signals(2, 2.0, "").is_mobile());
    }

    #[test]
    fn classify_is_deterministic() {
        let s = signals(4, 4.0, "webOS/3.0");
        assert_eq!(classify(&s), classify(&s));
    }

    #[test]
    fn current_tier_is_cached_until_invalidated() {
        invalidate_tier();
        let first = current_tier();
        let second = current_tier();
        assert_eq!(first, second);
        invalidate_tier();
        // After invalidation the recomputation is idempotent on an
        // unchanged environment.
        assert_eq!(current_tier(), first);
    }
}
