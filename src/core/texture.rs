//! Texture abstractions
//!
//! 2D material textures, depth targets and reflection probe cube maps.

use crate::context::WgpuContext;
use crate::error::RenderError;

/// Pixel formats accepted for material texture upload.
pub const UPLOAD_FORMATS: &[wgpu::TextureFormat] = &[
    wgpu::TextureFormat::R8Unorm,
    wgpu::TextureFormat::Rg8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba8UnormSrgb,
    wgpu::TextureFormat::Bgra8Unorm,
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba16Float,
];

/// Validate an upload and return its bytes per row.
pub fn check_upload(
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    data_len: usize,
) -> Result<u32, RenderError> {
    if !UPLOAD_FORMATS.contains(&format) {
        return Err(RenderError::UnsupportedFormat(format!("{format:?}")));
    }
    if width == 0 || height == 0 {
        return Err(RenderError::UnsupportedFormat(format!(
            "{format:?} texture of size {width}x{height}"
        )));
    }
    let texel = format
        .block_copy_size(None)
        .ok_or_else(|| RenderError::UnsupportedFormat(format!("{format:?}")))?;
    let expected = texel as usize * width as usize * height as usize;
    if data_len != expected {
        return Err(RenderError::UnsupportedFormat(format!(
            "{format:?} {width}x{height} needs {expected} bytes, got {data_len}"
        )));
    }
    Ok(texel * width)
}

fn linear_sampler(ctx: &WgpuContext, label: Option<&str>) -> wgpu::Sampler {
    ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: label.map(|l| format!("{} sampler", l)).as_deref(),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// A 2D texture with associated view and sampler.
pub struct Texture2D {
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) size: wgpu::Extent3d,
    pub(crate) format: wgpu::TextureFormat,
}

impl Texture2D {
    /// Upload pixel data. Unsupported formats or mismatched sizes are
    /// rejected before touching the device.
    pub fn from_pixels(
        ctx: &WgpuContext,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        data: &[u8],
        label: Option<&str>,
    ) -> Result<Self, RenderError> {
        let bytes_per_row = check_upload(format, width, height, data.len())?;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
            size,
        );

        Ok(Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler: linear_sampler(ctx, label),
            size,
            format,
        })
    }

    /// 1x1 white texture bound for untextured materials.
    pub fn white(ctx: &WgpuContext) -> Result<Self, RenderError> {
        Self::from_pixels(
            ctx,
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            &[255; 4],
            Some("white texture"),
        )
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// A depth texture for depth testing and shadow maps.
pub struct DepthTexture {
    pub(crate) view: wgpu::TextureView,
    pub(crate) size: wgpu::Extent3d,
}

impl DepthTexture {
    /// The depth format used by this texture.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(ctx: &WgpuContext, width: u32, height: u32, label: Option<&str>) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
        }
    }

    /// Recreate the texture if the size changed.
    pub fn resize(&mut self, ctx: &WgpuContext, width: u32, height: u32) {
        if self.size.width != width || self.size.height != height {
            *self = Self::new(ctx, width, height, Some("depth texture"));
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

/// A cube map rendered by a probe capture or loaded as the scene
/// environment.
pub struct TextureCubeMap {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) face_views: Vec<wgpu::TextureView>,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) size: u32,
}

impl TextureCubeMap {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Create an empty cube map usable as a render target per face.
    pub fn new(ctx: &WgpuContext, size: u32, label: Option<&str>) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        // Face order: +X, -X, +Y, -Y, +Z, -Z
        let face_views = (0..6)
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        Self {
            texture,
            view,
            face_views,
            sampler: linear_sampler(ctx, label),
            size,
        }
    }

    /// Fill every face with one color.
    pub fn fill(&self, ctx: &WgpuContext, color: [f32; 4]) {
        let texel: Vec<u8> = color
            .iter()
            .flat_map(|c| half_bits(*c).to_le_bytes())
            .collect();
        let face: Vec<u8> = texel
            .iter()
            .copied()
            .cycle()
            .take(texel.len() * (self.size * self.size) as usize)
            .collect();
        for layer in 0..6 {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                    aspect: wgpu::TextureAspect::All,
                },
                &face,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(8 * self.size),
                    rows_per_image: Some(self.size),
                },
                wgpu::Extent3d {
                    width: self.size,
                    height: self.size,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Render target view of one face.
    pub fn face_view(&self, face: usize) -> Option<&wgpu::TextureView> {
        self.face_views.get(face)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

/// IEEE half-precision bits of `value`, truncating the mantissa.
fn half_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = bits & 0x007f_ffff;
    if value.is_nan() {
        return sign | 0x7e00;
    }
    if exponent >= 0x1f {
        return sign | 0x7c00;
    }
    if exponent <= 0 {
        return sign;
    }
    sign | ((exponent as u16) << 10) | (mantissa >> 13) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_upload() {
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        assert_eq!(check_upload(format, 4, 2, 32).unwrap(), 16);
        assert!(matches!(
            check_upload(format, 4, 2, 31),
            Err(RenderError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            check_upload(wgpu::TextureFormat::Bc1RgbaUnorm, 4, 4, 8),
            Err(RenderError::UnsupportedFormat(_))
        ));
        assert!(check_upload(format, 0, 2, 0).is_err());
    }

    #[test]
    fn test_half_bits() {
        assert_eq!(half_bits(1.0), 0x3c00);
        assert_eq!(half_bits(0.0), 0);
        assert_eq!(half_bits(-2.0), 0xc000);
        assert_eq!(half_bits(0.5), 0x3800);
        assert_eq!(half_bits(f32::INFINITY), 0x7c00);
    }
}
