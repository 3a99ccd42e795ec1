// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration formatting for timer displays.

/// Format milliseconds as `HH:MM`, truncating seconds.
///
/// Hours are not wrapped at 24; a 100-hour job renders as `100:00`.
pub fn format_hhmm(ms: u64) -> String {
    let minutes = ms / 60_000;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Format milliseconds as `HH:MM:SS`, truncating sub-second remainder.
pub fn format_hhmmss(ms: u64) -> String {
    let secs = ms / 1_000;
    format!("{:02}:{:02}:{:02}", secs / 3_600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
