// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection backoff schedule.

use std::time::Duration;

/// Delay before reconnect attempt number `attempt + 1`.
///
/// Doubles from `base` on every attempt and never exceeds `cap`.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(cap)
}
