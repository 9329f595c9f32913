use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::cli::{AppConfig, RenderMode};
use crate::frame::{FrameClock, FrameInfo};
use crate::gfx::{GraphicsDevice, TextureHandle, WgpuDevice};
use crate::renderer::{FrameRenderer, PanelImage, PanelSize};
use crate::scene::Scene;
use crate::ui::{ControlsPanel, ViewportImage, ViewportPanel};

const FPS_UPDATE_INTERVAL: f32 = 1.0;
const WINDOW_TITLE: &str = "Enginish";

/// Offscreen color image currently registered with the egui renderer
struct RegisteredTexture {
    id: egui::TextureId,
    texture: TextureHandle,
    generation: u64,
}

/// Everything that needs a live window and GPU
struct Viewer {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: WgpuDevice,
    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
    scene: Scene,
    renderer: FrameRenderer,
    timing: FrameTiming,
    viewport: ViewportPanel,
    controls: ControlsPanel,
    panel_texture: Option<RegisteredTexture>,
    mode: RenderMode,
}

impl Viewer {
    async fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find an appropriate adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Enginish Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("failed to create device")?;

        let surface_config = Self::create_surface_config(&surface, &adapter, size)?;
        surface.configure(&device, &surface_config);
        log::info!(
            "surface {}x{} format {:?} on {}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
            adapter.get_info().name
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_config.format,
            egui_wgpu::RendererOptions::default(),
        );

        let mut device = WgpuDevice::new(
            device,
            queue,
            surface_config.format,
            surface_config.width,
            surface_config.height,
        );
        let mut scene = Scene::new(&mut device, config.spin_speed);
        scene.outline_scale = config.outline_scale;

        Ok(Self {
            surface,
            surface_config,
            device,
            egui_renderer,
            egui_state,
            egui_ctx,
            scene,
            renderer: FrameRenderer::new(),
            timing: FrameTiming::new(),
            viewport: ViewportPanel::new(),
            controls: ControlsPanel,
            panel_texture: None,
            mode: config.mode,
        })
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> anyhow::Result<wgpu::SurfaceConfiguration> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            self.timing.pause();
            return;
        }
        self.timing.resume();
        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.surface.configure(self.device.device(), &self.surface_config);
        self.device.resize_surface(size.width, size.height);
        log::debug!("surface resized to {}x{}", size.width, size.height);
    }

    fn reconfigure(&mut self) {
        self.surface.configure(self.device.device(), &self.surface_config);
    }

    fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let frame = self.timing.tick();
        self.scene.update(frame.delta);
        let fps = self.timing.fps();

        let panel_image = match self.mode {
            RenderMode::Panel => {
                let desired = self.viewport.desired_size();
                let image = self
                    .renderer
                    .render_to_panel(&mut self.device, &self.scene, desired);
                self.sync_panel_texture(image)
            }
            RenderMode::Direct => {
                let surface = PanelSize::new(self.surface_config.width, self.surface_config.height);
                self.renderer.render_direct(&mut self.device, &self.scene, surface);
                None
            }
        };

        let mut encoder = self
            .device
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.device.encode_frame(&mut encoder, &view);

        let raw_input = self.egui_state.take_egui_input(window);
        let mode = self.mode;
        let origin = self.device.texture_origin();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.controls.show(ctx, fps, mode, &mut self.scene);
            if mode == RenderMode::Panel {
                self.viewport.show(ctx, panel_image, origin);
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(
                self.device.device(),
                self.device.queue(),
                *id,
                image_delta,
            );
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        self.egui_renderer.update_buffers(
            self.device.device(),
            self.device.queue(),
            &mut encoder,
            &tris,
            &screen_descriptor,
        );

        // Nothing else touches the surface in panel mode
        let load = match self.mode {
            RenderMode::Panel => wgpu::LoadOp::Clear(wgpu::Color::BLACK),
            RenderMode::Direct => wgpu::LoadOp::Load,
        };

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                })
                .forget_lifetime();

            self.egui_renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.device.queue().submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Keeps the egui registration pointing at the current color storage
    fn sync_panel_texture(&mut self, image: Option<PanelImage>) -> Option<ViewportImage> {
        let image = image?;
        let view = self.device.texture_view(image.texture)?;
        let generation = self.device.texture_generation(image.texture)?;

        let same_handle = matches!(&self.panel_texture, Some(reg) if reg.texture == image.texture);
        if same_handle {
            if let Some(reg) = self.panel_texture.as_mut() {
                if reg.generation != generation {
                    self.egui_renderer.update_egui_texture_from_wgpu_texture(
                        self.device.device(),
                        view,
                        wgpu::FilterMode::Linear,
                        reg.id,
                    );
                    reg.generation = generation;
                }
            }
        } else {
            if let Some(old) = self.panel_texture.take() {
                self.egui_renderer.free_texture(&old.id);
            }
            let id = self.egui_renderer.register_native_texture(
                self.device.device(),
                view,
                wgpu::FilterMode::Linear,
            );
            self.panel_texture = Some(RegisteredTexture {
                id,
                texture: image.texture,
                generation,
            });
        }

        self.panel_texture
            .as_ref()
            .map(|reg| ViewportImage { id: reg.id, image })
    }

    fn shutdown(mut self) {
        if let Some(reg) = self.panel_texture.take() {
            self.egui_renderer.free_texture(&reg.id);
        }
        self.renderer.release(&mut self.device);
        self.scene.release(&mut self.device);
        log::info!("viewer shut down after {} frames", self.timing.frame_number());
    }
}

/// Frames-per-second estimate refreshed once per interval
#[derive(Debug, Default)]
struct FpsCounter {
    frame_count: u32,
    fps: f32,
    timer: f32,
}

impl FpsCounter {
    fn update(&mut self, delta: f32) {
        self.frame_count += 1;
        self.timer += delta;

        if self.timer >= FPS_UPDATE_INTERVAL {
            self.fps = self.frame_count as f32 / self.timer;
            log::debug!("FPS: {:.1}", self.fps);
            self.frame_count = 0;
            self.timer = 0.0;
        }
    }
}

/// Frame clock plus the FPS estimate fed from its deltas
#[derive(Debug, Default)]
struct FrameTiming {
    clock: FrameClock,
    fps: FpsCounter,
    paused: bool,
}

impl FrameTiming {
    fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self) -> FrameInfo {
        let frame = self.clock.tick();
        self.fps.update(frame.delta);
        frame
    }

    fn fps(&self) -> f32 {
        self.fps.fps
    }

    fn frame_number(&self) -> u64 {
        self.clock.frame_number()
    }

    /// Stops frames from being drawn, e.g. while the window is minimized
    fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes drawing without counting the paused time as one long frame
    fn resume(&mut self) {
        if self.paused {
            self.clock.reset_delta();
            self.paused = false;
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

// === Application ===

pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer>,
    init_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            viewer: None,
            init_error: None,
        }
    }

    /// Error that stopped the event loop during startup, if any
    pub fn take_init_error(&mut self) -> Option<anyhow::Error> {
        self.init_error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.init_error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window_width,
                self.config.window_height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("failed to create window"));
                return;
            }
        };

        let viewer = match pollster::block_on(Viewer::new(window.clone(), &self.config)) {
            Ok(viewer) => viewer,
            Err(e) => {
                self.fail(event_loop, e.context("failed to initialize renderer"));
                return;
            }
        };

        log::info!("Controls: WASD move, Space/Shift up/down, Q/E turn, Escape to quit");
        self.window = Some(window);
        self.viewer = Some(viewer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(viewer), Some(window)) = (&mut self.viewer, &self.window) else {
            return;
        };

        // Let egui handle the event first
        if viewer.handle_event(window, &event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => viewer.scene.camera.process_keyboard(&event),
            WindowEvent::Resized(size) => viewer.resize(size),
            WindowEvent::RedrawRequested if viewer.timing.is_paused() => {}
            WindowEvent::RedrawRequested => {
                match viewer.render(window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        viewer.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("surface out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("render error: {e}"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewer) = self.viewer.take() {
            viewer.shutdown();
        }
    }
}

/// Opens the window and runs until it is closed
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(config);

    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;

    match app.take_init_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
