pub mod playback;

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use winit::{dpi::PhysicalSize, event_loop::EventLoopProxy, window::Window};

use wgpu::{
    Adapter, CommandEncoderDescriptor, Device, ExperimentalFeatures, Features, Instance, Limits,
    MemoryHints, PolygonMode, PowerPreference, Queue, RequestAdapterOptions, Surface,
    SurfaceConfiguration, SurfaceError, TextureViewDescriptor,
};

pub type RcWindow = Arc<Window>;

use abcview_3d::{RenderOptions, SceneRenderer};
use abcview_camera::{TurntableCamera, update_camera_buffer};
use abcview_flatten::{BufferLimits, FlatBuffers, FlattenOptions, Flattener};
use abcview_scene::Archive;

pub use playback::{ConditionLog, Playback, STATIC_LOOP_END};

/// Frames longer than this are clamped so a stall does not skip playback.
const MAX_FRAME_DT: f32 = 0.1;

/// Everything the viewer needs besides the window.
#[derive(Clone, Debug)]
pub struct ViewerSettings {
    pub archive: Arc<Archive>,
    pub flatten: FlattenOptions,
    pub limits: BufferLimits,
    pub playback: Playback,
    pub camera: TurntableCamera,
    pub wireframe: bool,
    pub clear_color: [f64; 3],
    pub line_color: [f32; 4],
}

pub async fn create_graphics(
    window: RcWindow,
    proxy: EventLoopProxy<Graphics>,
    settings: ViewerSettings,
) -> Result<()> {
    let instance = Instance::default();
    let surface = instance
        .create_surface(Arc::clone(&window))
        .context("failed to create surface")?;

    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("could not get an adapter (GPU)")?;

    let line_supported = adapter.features().contains(Features::POLYGON_MODE_LINE);
    let (required_features, polygon_mode) = match (settings.wireframe, line_supported) {
        (true, true) => (Features::POLYGON_MODE_LINE, PolygonMode::Line),
        (true, false) => {
            log::warn!("adapter cannot draw line polygons, falling back to filled triangles");
            (Features::empty(), PolygonMode::Fill)
        }
        (false, _) => (Features::empty(), PolygonMode::Fill),
    };

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features,
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: MemoryHints::Performance,
            trace: Default::default(),
            experimental_features: ExperimentalFeatures::disabled(),
        })
        .await
        .context("failed to get device")?;

    let size = window.inner_size();
    let width = size.width.max(1);
    let height = size.height.max(1);

    let surface_config = surface
        .get_default_config(&adapter, width, height)
        .context("surface is not supported by the adapter")?;
    surface.configure(&device, &surface_config);

    let renderer = SceneRenderer::new(
        &device,
        surface_config.format,
        RenderOptions {
            polygon_mode,
            clear_color: settings.clear_color,
            line_color: settings.line_color,
        },
    );

    log::info!(
        "graphics ready: {} ({:?}), {}x{}",
        adapter.get_info().name,
        adapter.get_info().backend,
        width,
        height
    );

    let now = Instant::now();
    let gfx = Graphics {
        window,
        instance,
        surface,
        surface_config,
        adapter,
        device,
        queue,
        renderer,
        camera: settings.camera,
        archive: settings.archive,
        flattener: Flattener::new(settings.flatten),
        buffers: FlatBuffers::new(settings.limits),
        playback: settings.playback,
        conditions: ConditionLog::default(),
        start_time: now,
        last_frame_time: now,
    };

    let _ = proxy.send_event(gfx);
    Ok(())
}

#[allow(dead_code)]
pub struct Graphics {
    pub(crate) window: RcWindow,
    instance: Instance,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    adapter: Adapter,
    device: Device,
    queue: Queue,
    renderer: SceneRenderer,
    camera: TurntableCamera,
    archive: Arc<Archive>,
    flattener: Flattener,
    buffers: FlatBuffers,
    playback: Playback,
    conditions: ConditionLog,
    start_time: Instant,
    last_frame_time: Instant,
}

impl Graphics {
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Flattens the archive at the current playback time, uploads the result
    /// and draws it.
    pub fn draw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame_time)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame_time = now;

        let time = self.playback.advance(dt as f64);
        let report = self.flattener.flatten(&self.archive, time, &mut self.buffers);
        self.conditions.observe(&report);

        self.renderer.upload(
            &self.device,
            &self.queue,
            self.buffers.vertex_bytes(),
            self.buffers.index_bytes(),
        );
        update_camera_buffer(
            &self.queue,
            &self.renderer.uniform_buf,
            &self.camera,
            (now - self.start_time).as_secs_f32(),
            self.surface_config.width,
            self.surface_config.height,
        );

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                return;
            }
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return;
            }
        };

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });
        self.renderer.render(&mut encoder, &view);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }
}
