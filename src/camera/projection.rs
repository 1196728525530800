use glam::Mat4;

/// Fixed perspective projection parameters.
///
/// The matrix uses glam's `perspective_rh`, which already targets the
/// [0, 1] depth range (wgpu/Vulkan convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Viewport aspect ratio (width / height).
    pub aspect: f32,
    /// Near clipping plane distance.
    pub znear: f32,
    /// Far clipping plane distance.
    pub zfar: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fovy: 45.0,
            aspect: 1.0,
            znear: 0.1,
            zfar: 100.0,
        }
    }
}

impl Projection {
    /// Create a projection from an initial viewport size.
    #[must_use]
    pub fn new(fovy: f32, width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            fovy,
            aspect: aspect_ratio(width, height),
            znear,
            zfar,
        }
    }

    /// The projection matrix.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy.to_radians(), self.aspect, self.znear, self.zfar)
    }

    /// Update the aspect ratio for a new viewport size. Zero-sized
    /// dimensions are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = aspect_ratio(width, height);
        }
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect() {
        let mut projection = Projection::new(45.0, 800, 600, 0.1, 100.0);
        assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);

        projection.resize(1920, 1080);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);

        // Zero-sized dimensions leave the aspect untouched.
        projection.resize(0, 1080);
        assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn matrix_is_idempotent() {
        let projection = Projection::default();
        assert_eq!(
            projection.matrix().to_cols_array(),
            projection.matrix().to_cols_array()
        );
    }
}
