use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::types::{AdapterProfile, Antialiasing};

/// Instance, device and swapchain for one window.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        // The window outlives the surface: `GpuState` is dropped on unmount,
        // before the host releases its window.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_profile = AdapterProfile::from_wgpu(&adapter.get_info());
        let limits = adapter.limits();
        let is_software = adapter_profile.is_software();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software,
            "selected GPU adapter"
        );

        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {requested_width}x{requested_height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            anyhow::bail!("surface reports no supported formats for this adapter");
        };
        // The wireframe colors are authored as display values, so write them
        // to a non-sRGB target untouched.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no linear (non-sRGB) surface format available; colors will be gamma-encoded"
                );
                first_format
            });

        let format_features = adapter.get_texture_format_features(surface_format);
        let sample_count = select_sample_count(
            antialiasing,
            format_features.flags.supported_sample_counts(),
            format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE),
            is_software,
        );

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("wavegrid device"),
            required_features,
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        tracing::debug!(?present_mode, ?surface_format, sample_count, "configuring surface");

        let size = PhysicalSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
            adapter_profile,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Re-applies the current configuration after the swapchain was lost.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Picks the MSAA sample count for the requested policy.
///
/// Falls back to the largest supported count below an unsupported request,
/// and to 1 when the format cannot resolve or the adapter is a software
/// rasterizer.
pub(crate) fn select_sample_count(
    antialiasing: Antialiasing,
    mut supported: Vec<u32>,
    can_resolve: bool,
    is_software: bool,
) -> u32 {
    if !supported.contains(&1) {
        supported.push(1);
    }
    supported.sort_unstable();
    supported.dedup();

    let sample_count = match antialiasing {
        Antialiasing::Auto => supported.last().copied().unwrap_or(1),
        Antialiasing::Off => 1,
        Antialiasing::Samples(requested) => {
            if supported.contains(&requested) {
                requested
            } else {
                let fallback = supported
                    .iter()
                    .copied()
                    .filter(|&count| count <= requested)
                    .max()
                    .unwrap_or(1);
                tracing::warn!(
                    requested,
                    fallback,
                    ?supported,
                    "requested MSAA sample count not supported; falling back"
                );
                fallback
            }
        }
    };

    if sample_count > 1 && !can_resolve {
        tracing::warn!("surface format does not support MSAA resolve; disabling MSAA");
        return 1;
    }
    if sample_count > 1 && is_software {
        tracing::warn!(
            sample_count,
            "software rasterizer detected; disabling MSAA for performance"
        );
        return 1;
    }
    sample_count
}
