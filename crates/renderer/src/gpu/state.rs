use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::input::ViewportSize;
use crate::scene::{FrameUniforms, RenderBackend, Scene, SceneError, SceneSetup};
use crate::types::{AdapterProfile, Antialiasing, Rgb, SceneParams};

use super::context::GpuContext;
use super::pipeline::WirePipeline;
use super::uniforms::WireUniforms;

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Rolling frame-rate counter, logged once per second.
struct FrameStats {
    frame_count: u64,
    frames_since_last_update: u32,
    last_update: Instant,
    frames_per_second: f32,
}

impl FrameStats {
    fn new(now: Instant) -> Self {
        Self {
            frame_count: 0,
            frames_since_last_update: 0,
            last_update: now,
            frames_per_second: 0.0,
        }
    }

    fn record(&mut self, now: Instant, time: f32) {
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                time,
                "render stats"
            );
        }
    }
}

/// wgpu backend for a window: swapchain, line pipeline and mesh buffers.
pub struct GpuState {
    context: GpuContext,
    pipeline: WirePipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    multisample_target: Option<MultisampleTarget>,
    clear_color: wgpu::Color,
    stats: FrameStats,
}

impl GpuState {
    pub(crate) fn new<T>(target: &T, setup: &SceneSetup<'_>, antialiasing: Antialiasing) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let size = PhysicalSize::new(setup.viewport.width, setup.viewport.height);
        let context = GpuContext::new(target, size, antialiasing)?;
        let pipeline = WirePipeline::new(&context.device, context.surface_format, context.sample_count);

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: WireUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let vertex_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("grid positions"),
                contents: bytemuck::cast_slice(&setup.topology.positions),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let index_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("grid edges"),
                contents: bytemuck::cast_slice(&setup.topology.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let index_count = u32::try_from(setup.topology.indices.len())
            .map_err(|_| anyhow::anyhow!("grid has too many edges for a 32-bit index buffer"))?;

        let multisample_target = (context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        });

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            index_count,
            multisample_target,
            clear_color: clear_color(setup.params.background),
            stats: FrameStats::new(Instant::now()),
        })
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    /// Reconfigures the swapchain at its current size after `Lost`/`Outdated`.
    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn encode_draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(view)),
            None => (view, None),
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("wire pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment_view,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

impl RenderBackend for GpuState {
    type Error = wgpu::SurfaceError;

    fn resize(&mut self, size: ViewportSize) {
        self.context
            .resize(PhysicalSize::new(size.width, size.height));
        self.multisample_target = (self.context.sample_count > 1).then(|| {
            MultisampleTarget::new(
                &self.context.device,
                self.context.surface_format,
                self.context.size,
                self.context.sample_count,
            )
        });
    }

    fn upload_positions(&mut self, positions: &[f32]) {
        let expected = self.vertex_buffer.size();
        let bytes: &[u8] = bytemuck::cast_slice(positions);
        if bytes.len() as u64 != expected {
            warn!(
                expected,
                actual = bytes.len(),
                "position upload does not match the vertex buffer; skipping"
            );
            return;
        }
        self.context.queue.write_buffer(&self.vertex_buffer, 0, bytes);
    }

    fn draw(&mut self, frame: &FrameUniforms) -> Result<(), wgpu::SurfaceError> {
        let output = self.context.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniforms = WireUniforms::from_frame(frame);
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        self.encode_draw(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.stats.record(Instant::now(), frame.time);
        Ok(())
    }
}

impl Scene<GpuState> {
    /// Mounts a scene on a native window surface.
    ///
    /// `None` stands for a host that has no surface to offer.
    pub fn on_surface<T>(
        target: Option<&T>,
        viewport: ViewportSize,
        params: SceneParams,
        antialiasing: Antialiasing,
    ) -> Result<Self, SceneError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let target = target.ok_or(SceneError::MissingSurface)?;
        Scene::initialize(viewport, params, |setup| {
            GpuState::new(target, setup, antialiasing)
        })
    }
}

fn clear_color(background: Rgb) -> wgpu::Color {
    wgpu::Color {
        r: background.r as f64,
        g: background.g as f64,
        b: background.b as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_surface_fails_before_touching_the_gpu() {
        let result = Scene::<GpuState>::on_surface::<winit::window::Window>(
            None,
            ViewportSize::new(1280, 720, 1.0),
            SceneParams::default(),
            Antialiasing::Auto,
        );
        assert!(matches!(result, Err(SceneError::MissingSurface)));
    }

    #[test]
    fn clear_color_is_opaque_background() {
        let color = clear_color(Rgb::from_hex(0x0a0014));
        assert!((color.r - 10.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.g, 0.0);
        assert!((color.b - 20.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.a, 1.0);
    }

    #[test]
    fn stats_roll_over_each_second() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);
        for frame in 1..=30 {
            stats.record(start + Duration::from_millis(frame * 20), 0.0);
        }
        assert_eq!(stats.frame_count, 30);
        assert_eq!(stats.frames_since_last_update, 30);
        stats.record(start + Duration::from_millis(1000), 0.0);
        assert!((stats.frames_per_second - 31.0).abs() < 0.01);
        assert_eq!(stats.frames_since_last_update, 0);
    }
}
