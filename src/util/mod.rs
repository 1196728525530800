//! Small driver-facing utilities.

/// Frame timing with delta-time and smoothed FPS.
pub mod frame_clock;
