use glam::Mat4;
use wgpu::util::DeviceExt;

use super::core::Camera;
use super::projection::Projection;
use crate::gpu::render_context::RenderContext;

/// GPU uniform block holding the per-frame camera transforms.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    /// World-to-eye view matrix.
    pub view: [[f32; 4]; 4],
    /// Eye-to-clip projection matrix.
    pub projection: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Padding for GPU alignment.
    pub(crate) _pad: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Identity view/projection at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            _pad: 0.0,
        }
    }

    /// Refresh all fields from the camera's current state and the fixed
    /// projection.
    pub fn update(&mut self, camera: &Camera, projection: &Projection) {
        self.view = camera.view_matrix().to_cols_array_2d();
        self.projection = projection.matrix().to_cols_array_2d();
        self.position = camera.position.to_array();
    }
}

/// Camera uniform buffer plus its bind group, ready for a draw pass.
///
/// The driver owns one of these per viewpoint and calls
/// [`update_gpu`](Self::update_gpu) once per frame after input has been
/// applied to the camera.
pub struct CameraBinding {
    /// CPU-side copy of the uniform block.
    pub uniform: CameraUniform,
    /// The GPU uniform buffer.
    pub buffer: wgpu::Buffer,
    /// Layout for pipelines that consume the camera block.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group over [`buffer`](Self::buffer).
    pub bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    /// Create the buffer, layout, and bind group with an initial upload
    /// of the given camera state.
    #[must_use]
    pub fn new(context: &RenderContext, camera: &Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update(camera, projection);

        let buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

        let layout = context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("Camera Bind Group"),
            });

        Self {
            uniform,
            buffer,
            layout,
            bind_group,
        }
    }

    /// Refresh the uniform from the camera and write it to the GPU.
    pub fn update_gpu(&mut self, queue: &wgpu::Queue, camera: &Camera, projection: &Projection) {
        self.uniform.update(camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn update_tracks_camera_state() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, -90.0, 0.0);
        let projection = Projection::default();

        let mut uniform = CameraUniform::new();
        uniform.update(&camera, &projection);

        assert_eq!(uniform.position, [1.0, 2.0, 3.0]);
        assert_eq!(uniform.view, camera.view_matrix().to_cols_array_2d());
        assert_eq!(uniform.projection, projection.matrix().to_cols_array_2d());
    }

    #[test]
    fn uniform_block_size_is_gpu_aligned() {
        assert_eq!(size_of::<CameraUniform>() % 16, 0);
    }
}
