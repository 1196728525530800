//! Free-fly camera system.
//!
//! Provides a yaw/pitch first-person camera with drift-free basis
//! reconstruction, a fixed perspective projection, the camera's GPU
//! uniform block, and (behind the `viewer` feature) winit input mapping.

/// Euler-angle free-fly camera and movement commands.
pub mod core;
/// Winit event accumulation applied to the camera per frame.
#[cfg(feature = "viewer")]
pub mod input;
/// Fixed perspective projection parameters.
pub mod projection;
/// Camera GPU uniform block and bind group.
pub mod uniform;
