//! Status codes recorded for navigation steps.
//!
//! Real HTTP statuses are positive. Zero and the negative values below are
//! sentinels for outcomes that never produced a usable response.

/// Awaiting a response for this step.
pub const STATUS_PENDING: i32 = 0;
/// Loop detected, or the hop limit was reached while reconstructing a chain.
pub const STATUS_LOOP: i32 = -1;
/// Redirect target header present but not parsable as a URL.
pub const STATUS_BAD_REDIRECT_TARGET: i32 = -3;
/// Browser-level navigation failure (network, DNS, TLS, ...).
pub const STATUS_NAVIGATION_ERROR: i32 = -4;
/// Redirect-class response without a target header.
pub const STATUS_MISSING_LOCATION: i32 = -5;
/// A step referenced by the chain has no recorded details.
pub const STATUS_MISSING_STEP: i32 = -6;
/// Nothing known yet.
pub const STATUS_UNKNOWN: i32 = -7;

/// Maximum number of hops followed when replaying a redirect chain.
pub const MAX_REDIRECT_HOPS: usize = 20;

/// Status assumed for a navigation that completed without a recorded final response.
pub const INFERRED_SUCCESS: i32 = 200;

pub fn is_redirect(status: i32) -> bool {
    (300..400).contains(&status)
}

pub fn is_success(status: i32) -> bool {
    (200..300).contains(&status)
}

pub fn is_http_error(status: i32) -> bool {
    (400..600).contains(&status)
}

pub fn is_http_status(status: i32) -> bool {
    (100..600).contains(&status)
}

pub fn is_sentinel_error(status: i32) -> bool {
    status < 0
}
