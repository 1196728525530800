//! Runtime configuration loaded from TOML.
//!
//! Every field has a default matching the reference constants, and files
//! may be partial: `#[serde(default)]` fills whatever a preset leaves
//! out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::core::{Camera, DEFAULT_SENSITIVITY, DEFAULT_SPEED};
use crate::camera::projection::Projection;
use crate::error::GlintError;

/// Top-level options container.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Camera movement and projection parameters.
    pub camera: CameraOptions,
}

impl Options {
    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// [`GlintError::Io`] if the file cannot be read,
    /// [`GlintError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GlintError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| GlintError::OptionsParse(e.to_string()))
    }

    /// Save options as pretty-printed TOML.
    ///
    /// # Errors
    ///
    /// [`GlintError::OptionsParse`] if serialization fails,
    /// [`GlintError::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GlintError> {
        let text =
            toml::to_string_pretty(self).map_err(|e| GlintError::OptionsParse(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Camera movement and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Translation speed in world units per second.
    pub speed: f32,
    /// Mouse-look sensitivity in degrees per pixel.
    pub sensitivity: f32,
    /// Flip vertical mouse-look.
    pub invert_y: bool,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            invert_y: false,
            fovy: 45.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl CameraOptions {
    /// Apply the movement parameters to a camera.
    pub fn apply(&self, camera: &mut Camera) {
        camera.set_speed(self.speed);
        camera.set_sensitivity(self.sensitivity);
    }

    /// Build the projection these options describe for a viewport size.
    #[must_use]
    pub fn projection(&self, width: u32, height: u32) -> Projection {
        Projection::new(self.fovy, width, height, self.znear, self.zfar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[camera]
speed = 12.0
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert_eq!(opts.camera.speed, 12.0);
        // Everything else should be default
        assert_eq!(opts.camera.sensitivity, DEFAULT_SENSITIVITY);
        assert_eq!(opts.camera.fovy, 45.0);
        assert!(!opts.camera.invert_y);
    }

    #[test]
    fn defaults_match_reference_constants() {
        let opts = CameraOptions::default();
        assert_eq!(opts.speed, 6.0);
        assert_eq!(opts.sensitivity, 0.1);
    }

    #[test]
    fn apply_overrides_camera_parameters() {
        let opts = CameraOptions {
            speed: 3.0,
            sensitivity: 0.25,
            ..Default::default()
        };
        let mut camera = Camera::default();
        opts.apply(&mut camera);
        assert_eq!(camera.speed(), 3.0);
        assert_eq!(camera.sensitivity(), 0.25);
    }
}
