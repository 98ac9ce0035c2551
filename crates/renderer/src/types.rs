use crate::grid::GridSpec;

/// Linear RGB triple handed to the shader as the base wireframe color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Splits a packed `0xRRGGBB` value into normalised channels.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Travelling-wave parameters applied to every lattice point each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    /// Peak height contributed by each of the two sine terms.
    pub amplitude: f64,
    /// Spatial frequency along the `ix` axis.
    pub frequency_x: f64,
    /// Spatial frequency along the `iy` axis.
    pub frequency_y: f64,
    /// Phase drift added after every frame.
    pub phase_step: f64,
    /// Shader clock advance per frame.
    pub time_step: f64,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            amplitude: 50.0,
            frequency_x: 0.2,
            frequency_y: 0.3,
            phase_step: 0.02,
            time_step: 0.01,
        }
    }
}

/// Perspective camera placement and follow behaviour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Fixed camera `y`.
    pub height: f32,
    /// Fixed camera `z`.
    pub distance: f32,
    /// Exponential smoothing factor used to chase the pointer.
    pub smoothing: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 1.0,
            far: 10_000.0,
            height: -100.0,
            distance: 1500.0,
            smoothing: 0.01,
        }
    }
}

/// Placement of the grid mesh in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPlacement {
    /// World-space `y` translation of the whole mesh.
    pub offset_y: f32,
    /// Rotation about the X axis in radians.
    pub tilt: f32,
}

impl Default for MeshPlacement {
    fn default() -> Self {
        Self {
            offset_y: -400.0,
            tilt: 0.2,
        }
    }
}

/// Everything the engine needs to build and animate the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParams {
    pub grid: GridSpec,
    pub wave: WaveParams,
    pub camera: CameraParams,
    pub mesh: MeshPlacement,
    /// Base wireframe color fed to the shader.
    pub color: Rgb,
    /// Clear color behind the additive wireframe pass.
    pub background: Rgb,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            wave: WaveParams::default(),
            camera: CameraParams::default(),
            mesh: MeshPlacement::default(),
            color: Rgb::from_hex(0x7b2fff),
            background: Rgb::from_hex(0x0a0014),
        }
    }
}

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Summary of the adapter chosen for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    /// Software rasterizers (llvmpipe, SwiftShader, WARP) report as CPU devices
    /// on most drivers, but some only give themselves away by name.
    pub fn is_software(&self) -> bool {
        if matches!(self.device_type, wgpu::DeviceType::Cpu) {
            return true;
        }
        let name = self.name.to_ascii_lowercase();
        ["llvmpipe", "swiftshader", "softpipe", "lavapipe", "warp"]
            .iter()
            .any(|needle| name.contains(needle))
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the resolved CLI/TOML settings: how large the
/// window should be, how frames are paced, and the scene constants.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub window_size: (u32, u32),
    /// Optional FPS cap; `None` renders at display cadence.
    pub target_fps: Option<f32>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Scene constants (grid, wave, camera, colors).
    pub scene: SceneParams,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_size: (1280, 720),
            target_fps: None,
            antialiasing: Antialiasing::default(),
            scene: SceneParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_split_into_channels() {
        let purple = Rgb::from_hex(0x7b2fff);
        assert!((purple.r - 123.0 / 255.0).abs() < 1e-6);
        assert!((purple.g - 47.0 / 255.0).abs() < 1e-6);
        assert!((purple.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn software_adapters_are_detected_by_name() {
        let profile = AdapterProfile {
            name: "llvmpipe (LLVM 17.0.6, 256 bits)".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::Other,
        };
        assert!(profile.is_software());

        let discrete = AdapterProfile {
            name: "AMD Radeon RX 7800 XT".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::DiscreteGpu,
        };
        assert!(!discrete.is_software());
    }
}
