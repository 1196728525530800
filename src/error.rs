//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::gpu::shader_compiler::ShaderError;
use crate::gpu::texture::TextureError;
use crate::gpu::uniform::UniformError;

/// Errors produced by the glint crate.
#[derive(Debug)]
pub enum GlintError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Shader compile, link, or binding failure.
    Shader(ShaderError),
    /// Texture decode failure.
    Texture(TextureError),
    /// Strict-mode uniform write failure.
    Uniform(UniformError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for GlintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Shader(e) => write!(f, "shader error: {e}"),
            Self::Texture(e) => write!(f, "texture error: {e}"),
            Self::Uniform(e) => write!(f, "uniform error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for GlintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Shader(e) => Some(e),
            Self::Texture(e) => Some(e),
            Self::Uniform(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::OptionsParse(_) => None,
        }
    }
}

impl From<RenderContextError> for GlintError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<ShaderError> for GlintError {
    fn from(e: ShaderError) -> Self {
        Self::Shader(e)
    }
}

impl From<TextureError> for GlintError {
    fn from(e: TextureError) -> Self {
        Self::Texture(e)
    }
}

impl From<UniformError> for GlintError {
    fn from(e: UniformError) -> Self {
        Self::Uniform(e)
    }
}

impl From<std::io::Error> for GlintError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
