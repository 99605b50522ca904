//! Render state configurations

use crate::render::CullMode;

/// Depth test configuration.
#[derive(Debug, Clone, Copy)]
pub struct DepthState {
    /// Whether to write to the depth buffer.
    pub write: bool,
    /// Comparison function for depth test.
    pub compare: wgpu::CompareFunction,
    /// Constant and slope bias, used by shadow passes to avoid acne.
    pub bias: wgpu::DepthBiasState,
}

impl DepthState {
    /// Depth testing enabled with writes.
    pub fn read_write() -> Self {
        Self {
            write: true,
            compare: wgpu::CompareFunction::Less,
            bias: wgpu::DepthBiasState::default(),
        }
    }

    /// Depth writes with a slope-scaled bias for shadow maps.
    pub fn shadow() -> Self {
        Self {
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
            ..Self::read_write()
        }
    }

    /// Convert to wgpu depth stencil state.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write,
            depth_compare: self.compare,
            stencil: wgpu::StencilState::default(),
            bias: self.bias,
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::read_write()
    }
}

impl CullMode {
    /// Convert to wgpu cull mode.
    pub fn to_wgpu(self) -> Option<wgpu::Face> {
        match self {
            CullMode::Back => Some(wgpu::Face::Back),
            CullMode::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cull_mode_mapping() {
        assert_eq!(CullMode::Back.to_wgpu(), Some(wgpu::Face::Back));
        assert_eq!(CullMode::None.to_wgpu(), None);
    }

    #[test]
    fn test_shadow_depth_biased() {
        let state = DepthState::shadow();
        assert!(state.write);
        assert_eq!(state.compare, wgpu::CompareFunction::Less);
        assert_eq!(state.bias.constant, 2);
        assert_eq!(DepthState::default().bias.constant, 0);
    }
}
