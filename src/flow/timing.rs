//! Pacing constants for timed screens.

use std::time::Duration;

/// Delay between a clip ending and the automatic navigation it triggers.
pub const CLIP_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

/// Delay between the final loading bar completing and checkout.
pub const CHECKOUT_DELAY: Duration = Duration::from_millis(500);

/// Period of the elapsed-seconds counter on call screens.
pub const ELAPSED_PERIOD: Duration = Duration::from_secs(1);

pub const END_CALL_PROGRESS_PERIOD: Duration = Duration::from_millis(100);
pub const END_CALL_PROGRESS_STEP: u8 = 2;

pub const FINAL_PROGRESS_PERIOD: Duration = Duration::from_millis(50);
pub const FINAL_PROGRESS_STEP: u8 = 1;

/// Upper bound of every progress counter.
pub const PROGRESS_MAX: u8 = 100;

/// Advance a progress counter by `step`, clamped at [`PROGRESS_MAX`].
pub fn advance_progress(progress: u8, step: u8) -> u8 {
    progress.saturating_add(step).min(PROGRESS_MAX)
}
