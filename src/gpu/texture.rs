//! Image-file-backed 2D textures with CPU-generated mipmaps.

use std::fmt;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use super::render_context::RenderContext;
use super::state::{BoundTexture, RenderState};

/// Errors that can occur while creating a texture.
#[derive(Debug)]
pub enum TextureError {
    /// The image file could not be read or decoded.
    Decode {
        /// Path of the offending file.
        path: PathBuf,
        /// The decoder's diagnostic reason.
        source: image::ImageError,
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { path, source } => {
                write!(f, "failed to decode image {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
        }
    }
}

/// Pixel format the caller uploads in.
///
/// wgpu has no packed 24-bit texture format, so `Rgb8` is expanded to
/// RGBA with an opaque alpha channel at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// Three channels; any decoded alpha is discarded (forced opaque).
    Rgb8,
    /// Four channels.
    #[default]
    Rgba8,
}

/// Construction-time texture options.
#[derive(Debug, Clone, Copy)]
pub struct TextureOptions {
    /// Flip scanlines vertically during decode. Image files store rows
    /// top-down while texture space grows bottom-up, so this defaults on.
    pub flip_vertical: bool,
    /// Upload pixel format.
    pub format: PixelFormat,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertical: true,
            format: PixelFormat::Rgba8,
        }
    }
}

/// Mutable sampling parameters.
///
/// wgpu samplers are immutable objects, so changing a parameter rebuilds
/// the texture's sampler from these fields.
#[derive(Debug, Clone, Copy)]
pub struct SamplerOptions {
    /// Horizontal wrap mode.
    pub wrap_u: wgpu::AddressMode,
    /// Vertical wrap mode.
    pub wrap_v: wgpu::AddressMode,
    /// Minification filter.
    pub min_filter: wgpu::FilterMode,
    /// Magnification filter.
    pub mag_filter: wgpu::FilterMode,
    /// Filter between mipmap levels.
    pub mipmap_filter: wgpu::FilterMode,
}

impl Default for SamplerOptions {
    /// Repeat wrap on both axes, nearest filters, nearest mip selection.
    fn default() -> Self {
        Self {
            wrap_u: wgpu::AddressMode::Repeat,
            wrap_v: wgpu::AddressMode::Repeat,
            min_filter: wgpu::FilterMode::Nearest,
            mag_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
        }
    }
}

impl SamplerOptions {
    fn create(&self, device: &wgpu::Device, label: &str) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: self.wrap_u,
            address_mode_v: self.wrap_v,
            min_filter: self.min_filter,
            mag_filter: self.mag_filter,
            mipmap_filter: self.mipmap_filter,
            ..Default::default()
        })
    }
}

/// One sampling parameter write.
#[derive(Debug, Clone, Copy)]
pub enum TextureParameter {
    /// Horizontal wrap mode.
    WrapU(wgpu::AddressMode),
    /// Vertical wrap mode.
    WrapV(wgpu::AddressMode),
    /// Minification filter.
    MinFilter(wgpu::FilterMode),
    /// Magnification filter.
    MagFilter(wgpu::FilterMode),
    /// Filter between mipmap levels.
    MipmapFilter(wgpu::FilterMode),
}

/// Decoded, CPU-side texture data with its full mipmap chain.
///
/// This is the GPU-free half of texture construction: decode, optional
/// vertical flip, RGBA expansion, and mip generation all happen here and
/// are unit-testable without a device.
#[derive(Debug)]
pub struct TextureImage {
    width: u32,
    height: u32,
    color_channels: u8,
    levels: Vec<RgbaImage>,
}

impl TextureImage {
    /// Decode an image file and build its mip chain.
    ///
    /// # Errors
    ///
    /// [`TextureError::Decode`] if the file cannot be read or decoded.
    /// Nothing GPU-side exists at that point, so a failure leaks no
    /// handle.
    pub fn load(path: impl AsRef<Path>, options: &TextureOptions) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(image, options))
    }

    /// Build the mip chain from an already decoded image.
    #[must_use]
    pub fn from_image(image: DynamicImage, options: &TextureOptions) -> Self {
        let color_channels = image.color().channel_count();
        let image = if options.flip_vertical {
            image.flipv()
        } else {
            image
        };
        let mut base = image.to_rgba8();
        if options.format == PixelFormat::Rgb8 {
            for pixel in base.pixels_mut() {
                pixel.0[3] = u8::MAX;
            }
        }

        let (width, height) = base.dimensions();
        let mut levels = vec![base];
        let (mut w, mut h) = (width, height);
        let mut prev = 0;
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            let next = image::imageops::resize(&levels[prev], w, h, FilterType::Triangle);
            levels.push(next);
            prev += 1;
        }

        Self {
            width,
            height,
            color_channels,
            levels,
        }
    }

    /// Base-level width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Base-level height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count of the decoded file (before RGBA expansion).
    #[must_use]
    pub fn color_channels(&self) -> u8 {
        self.color_channels
    }

    /// Number of mip levels, down to 1×1.
    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Pixel data of one mip level.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&RgbaImage> {
        self.levels.get(level)
    }
}

/// A GPU-resident 2D texture with a full mipmap chain.
pub struct Texture2D {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    sampling: SamplerOptions,
    label: String,
    width: u32,
    height: u32,
    color_channels: u8,
}

impl Texture2D {
    /// Decode an image file and upload it with mipmaps.
    ///
    /// Decode, upload, and mip generation are synchronous; when this
    /// returns, the CPU-side pixel buffers have been released.
    ///
    /// # Errors
    ///
    /// [`TextureError::Decode`] — raised before any GPU allocation.
    pub fn open(
        context: &RenderContext,
        path: impl AsRef<Path>,
        options: &TextureOptions,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = TextureImage::load(path, options)?;
        let label = path
            .file_name()
            .map_or_else(|| "texture".into(), |n| n.to_string_lossy().into_owned());
        Ok(Self::from_image(context, &image, &label))
    }

    /// Upload an already decoded image.
    #[must_use]
    pub fn from_image(context: &RenderContext, image: &TextureImage, label: &str) -> Self {
        let device = &context.device;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: image.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, pixels) in image.levels.iter().enumerate() {
            let (w, h) = pixels.dimensions();
            context.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampling = SamplerOptions::default();
        let sampler = sampling.create(device, label);

        log::debug!(
            "uploaded texture '{label}': {}x{}, {} mip level(s)",
            image.width(),
            image.height(),
            image.mip_level_count(),
        );

        Self {
            texture,
            view,
            sampler,
            sampling,
            label: label.to_owned(),
            width: image.width(),
            height: image.height(),
            color_channels: image.color_channels(),
        }
    }

    /// Attach this texture to a unit of the driver's [`RenderState`].
    ///
    /// The unit captures the sampler as of this call; re-bind after
    /// [`set_parameter`](Self::set_parameter) to pick up a new sampler.
    pub fn bind(&self, unit: usize, state: &mut RenderState) {
        state.bind_texture(
            unit,
            BoundTexture {
                view: self.view.clone(),
                sampler: self.sampler.clone(),
            },
        );
    }

    /// Overwrite one sampling parameter.
    ///
    /// Rebuilds the sampler object; compatibility of parameter
    /// combinations is left to the backend.
    pub fn set_parameter(&mut self, context: &RenderContext, parameter: TextureParameter) {
        match parameter {
            TextureParameter::WrapU(mode) => self.sampling.wrap_u = mode,
            TextureParameter::WrapV(mode) => self.sampling.wrap_v = mode,
            TextureParameter::MinFilter(filter) => self.sampling.min_filter = filter,
            TextureParameter::MagFilter(filter) => self.sampling.mag_filter = filter,
            TextureParameter::MipmapFilter(filter) => self.sampling.mipmap_filter = filter,
        }
        self.sampler = self.sampling.create(&context.device, &self.label);
    }

    /// Base-level width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Base-level height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channel count of the decoded file.
    #[must_use]
    pub fn color_channels(&self) -> u8 {
        self.color_channels
    }

    /// Current sampling parameters.
    #[must_use]
    pub fn sampling(&self) -> &SamplerOptions {
        &self.sampling
    }

    /// The underlying GPU texture.
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Full-texture view.
    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// The current sampler object.
    #[must_use]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([x as u8, y as u8, 0, 10])
        }))
    }

    #[test]
    fn nonexistent_path_fails_before_any_upload() {
        let err = TextureImage::load("/definitely/not/here.png", &TextureOptions::default())
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("not/here.png"), "got: {text}");
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let image = TextureImage::from_image(gradient(8, 4), &TextureOptions::default());
        assert_eq!(image.mip_level_count(), 4);
        let dims: Vec<(u32, u32)> = (0..4)
            .map(|i| image.level(i).map(RgbaImage::dimensions))
            .map(Option::unwrap)
            .collect();
        assert_eq!(dims, vec![(8, 4), (4, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn single_pixel_image_has_one_level() {
        let image = TextureImage::from_image(gradient(1, 1), &TextureOptions::default());
        assert_eq!(image.mip_level_count(), 1);
    }

    #[test]
    fn vertical_flip_reverses_row_order() {
        let source = DynamicImage::ImageRgba8(ImageBuffer::from_fn(2, 2, |_, y| {
            Rgba([if y == 0 { 200 } else { 50 }, 0, 0, 255])
        }));

        let flipped = TextureImage::from_image(
            source.clone(),
            &TextureOptions {
                flip_vertical: true,
                ..Default::default()
            },
        );
        let unflipped = TextureImage::from_image(
            source,
            &TextureOptions {
                flip_vertical: false,
                ..Default::default()
            },
        );

        let top = |img: &TextureImage| img.level(0).map(|l| l.get_pixel(0, 0).0[0]);
        assert_eq!(top(&unflipped), Some(200));
        assert_eq!(top(&flipped), Some(50));
    }

    #[test]
    fn rgb8_format_forces_opaque_alpha() {
        let image = TextureImage::from_image(
            gradient(2, 2),
            &TextureOptions {
                flip_vertical: false,
                format: PixelFormat::Rgb8,
            },
        );
        let alpha = image.level(0).map(|l| l.get_pixel(1, 1).0[3]);
        assert_eq!(alpha, Some(255));
        // The source file still reports its own channel count.
        assert_eq!(image.color_channels(), 4);
    }

    #[test]
    fn channel_count_comes_from_the_decoded_file() {
        let rgb = DynamicImage::ImageRgb8(ImageBuffer::from_fn(2, 2, |x, _| {
            image::Rgb([x as u8, 0, 0])
        }));
        let image = TextureImage::from_image(rgb, &TextureOptions::default());
        assert_eq!(image.color_channels(), 3);
    }
}
