//! Central configuration constants for runtime limits and defaults.

/// Default base URL of the CAD application's local automation bridge.
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:9410";

/// The single export format this tool produces.
pub const DEFAULT_EXPORT_FORMAT: &str = "f3d";

/// Settling time after open/activate and after close, in milliseconds.
/// Empirical workaround for asynchronous session binding in the service;
/// tunable, not removable.
pub const DEFAULT_STABILIZATION_DELAY_MS: u64 = 250;

/// Minimum allowed stabilization delay.
pub const MIN_STABILIZATION_DELAY_MS: u64 = 0;

/// Maximum allowed stabilization delay. 10 seconds per document is already
/// pathological; anything above is a typo.
pub const MAX_STABILIZATION_DELAY_MS: u64 = 10_000;

/// Convenience function to clamp a delay value into allowed range.
pub fn clamp_stabilization_delay_ms(v: u64) -> u64 {
    v.clamp(MIN_STABILIZATION_DELAY_MS, MAX_STABILIZATION_DELAY_MS)
}
