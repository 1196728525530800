//! GPU resource management.
//!
//! Provides wgpu device/surface initialization, two-stage shader programs
//! with name-based uniforms, image-backed 2D textures with mipmaps, and
//! the driver-owned render state that ties them together.

/// Two-stage shader programs with a name-based uniform interface.
pub mod program;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL stage compilation, linking, and interface reflection.
pub mod shader_compiler;
/// Active program and texture-unit state owned by the driver.
pub mod state;
/// Image-file-backed 2D textures with CPU-generated mipmaps.
pub mod texture;
/// Uniform values and CPU-side uniform block staging.
pub mod uniform;
