mod panel_ui;

use anyhow::{Context as _, Result, anyhow};
use backdrop_media::{FrameSequence, MediaEvent, TestPattern, VideoSource};
use backdrop_panel::DebugPanel;
use backdrop_render_wgpu::{BackdropRenderer, builtin_registry};
use backdrop_scene::config::VideoConfig;
use backdrop_scene::{MaterialRegistry, Scene, SceneConfig, Variant};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(
    name = "backdrop-desktop",
    about = "Animated video backdrop with an interactive squares grid"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of video frames, overriding the config
    #[arg(long)]
    video: Option<PathBuf>,

    /// Scene variant (full or minimal), overriding the config
    #[arg(long)]
    variant: Option<Variant>,
}

/// Command-line values that win over the config file, re-applied on reload.
#[derive(Debug, Clone, Default)]
struct Overrides {
    video: Option<PathBuf>,
    variant: Option<Variant>,
}

impl Overrides {
    fn apply(&self, mut config: SceneConfig) -> SceneConfig {
        if let Some(path) = &self.video {
            config.video.path = Some(path.clone());
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        config
    }
}

/// Wheel notches from a scroll delta. Trackpads report pixels.
fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
    }
}

/// Whether a reloaded config needs the scene rebuilt rather than re-tuned.
fn needs_rebuild(old: &SceneConfig, new: &SceneConfig) -> bool {
    old.variant != new.variant
        || old.grid != new.grid
        || old.camera != new.camera
        || old.seed != new.seed
}

fn open_video(config: &VideoConfig) -> Option<Box<dyn VideoSource>> {
    match &config.path {
        Some(dir) => match FrameSequence::open(dir, config.fps) {
            Ok(sequence) => {
                tracing::info!(path = %dir.display(), fps = config.fps, "opened frame sequence");
                Some(Box::new(sequence))
            }
            Err(e) => {
                tracing::error!("video disabled: {e}");
                None
            }
        },
        None => {
            tracing::info!("no video configured, playing test pattern");
            Some(Box::new(TestPattern::default()))
        }
    }
}

/// Application state.
struct AppState {
    config_path: Option<PathBuf>,
    overrides: Overrides,
    config: SceneConfig,
    registry: MaterialRegistry,
    scene: Scene,
    panel: DebugPanel,
    video: Option<Box<dyn VideoSource>>,
    /// Bumped whenever `video` is replaced by a different source.
    video_generation: u64,
    show_panel: bool,
    // Input state
    dragging: bool,
    cursor: Option<(f32, f32)>,
    last_frame: Instant,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self> {
        let overrides = Overrides {
            video: cli.video.clone(),
            variant: cli.variant,
        };
        let config = match &cli.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SceneConfig::default(),
        };
        let config = overrides.apply(config);
        config.validate()?;

        let registry = builtin_registry();
        let scene = Scene::new(&config, &registry)?;
        let mut panel = DebugPanel::new();
        panel.sync(&config.settings());
        let video = open_video(&config.video);

        Ok(Self {
            config_path: cli.config.clone(),
            overrides,
            config,
            registry,
            scene,
            panel,
            video,
            video_generation: 0,
            show_panel: true,
            dragging: false,
            cursor: None,
            last_frame: Instant::now(),
        })
    }

    /// One frame of simulation: media, panel edits, clock.
    fn update(&mut self, dt: f32) {
        self.poll_video();
        if let Some(video) = &mut self.video {
            video.advance(dt);
        }

        for change in self.panel.drain_changes() {
            if let Err(e) = self.scene.apply_setting(&change) {
                tracing::warn!(key = %change.key, "setting not applied: {e}");
            }
        }

        if let Err(e) = self.scene.update(dt) {
            tracing::error!("scene update failed: {e}");
        }
    }

    fn poll_video(&mut self) {
        let Some(source) = &mut self.video else {
            return;
        };
        let event = match source.poll() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("video disabled: {e}");
                self.video = None;
                return;
            }
        };
        let Some(event) = event else {
            return;
        };
        let info = source.info();
        match event {
            MediaEvent::LoadedMetadata => {
                tracing::info!(width = info.width, height = info.height, "video metadata loaded");
            }
            MediaEvent::CanPlay => {
                tracing::info!("video can play");
                source.play();
            }
        }
        if let Err(e) = self.scene.observe_video(info) {
            tracing::error!("video fit failed: {e}");
        }
    }

    fn pointer_moved(&mut self, x: f32, y: f32) {
        if let (true, Some((px, py))) = (self.dragging, self.cursor) {
            let height = self
                .scene
                .viewport()
                .map(|v| v.height as f32)
                .unwrap_or(1.0);
            self.scene.orbit_mut().rotate(x - px, y - py, height);
        }
        self.cursor = Some((x, y));
        if let Err(e) = self.scene.pointer_move(x, y) {
            tracing::warn!("pointer update failed: {e}");
        }
    }

    /// Returns true if the scene was rebuilt and the renderer must follow.
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::F1 => {
                self.show_panel = !self.show_panel;
                false
            }
            KeyCode::F5 => self.reload_config(),
            _ => false,
        }
    }

    /// Re-read the config file. Settings-only changes go through the panel;
    /// structural changes rebuild the scene. Returns true on rebuild.
    fn reload_config(&mut self) -> bool {
        let Some(path) = &self.config_path else {
            tracing::info!("no config file to reload");
            return false;
        };
        let config = match SceneConfig::load(path) {
            Ok(config) => self.overrides.apply(config),
            Err(e) => {
                tracing::error!("config reload failed: {e}");
                return false;
            }
        };

        let mut rebuilt = false;
        if needs_rebuild(&self.config, &config) {
            match Scene::new(&config, &self.registry) {
                Ok(mut scene) => {
                    if let Some(viewport) = self.scene.viewport() {
                        if let Err(e) = scene.resize(viewport.width, viewport.height) {
                            tracing::error!("scene resize failed: {e}");
                        }
                    }
                    self.scene = scene;
                    rebuilt = true;
                    tracing::info!("scene rebuilt from config");
                }
                Err(e) => {
                    tracing::error!("config reload rejected: {e}");
                    return false;
                }
            }
        }

        if config.video != self.config.video {
            self.video = open_video(&config.video);
            self.video_generation += 1;
        }
        let info = self
            .video
            .as_ref()
            .map(|v| v.info())
            .unwrap_or_default();
        if let Err(e) = self.scene.observe_video(info) {
            tracing::error!("video fit failed: {e}");
        }

        // A rebuilt scene starts from defaults; force every value through again.
        if rebuilt {
            self.panel.unmount();
        }
        self.panel.sync(&config.settings());
        self.config = config;
        rebuilt
    }

    fn status(&self, layers: String) -> panel_ui::Status {
        panel_ui::Status {
            variant: format!("{:?}", self.scene.variant()),
            time: self.scene.time(),
            fov: self.scene.rig().fov_degrees(),
            distance: self.scene.orbit().distance(),
            layers,
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, layers: String) {
        if !self.scene.is_ready() {
            panel_ui::loading(ctx);
        }
        if self.show_panel {
            let status = self.status(layers);
            panel_ui::settings_window(ctx, &mut self.panel, &status);
        }
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<BackdropRenderer>,
    /// Video generation whose frames the renderer's texture holds.
    uploaded_generation: u64,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            uploaded_generation: 0,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Backdrop")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("backdrop_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.state.scene.resize(config.width, config.height)?;
        let renderer = BackdropRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &self.state.registry,
            &self.state.scene,
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        Ok(())
    }

    fn rebuild_renderer(&mut self) {
        if let (Some(device), Some(config)) = (&self.device, &self.config) {
            self.renderer = Some(BackdropRenderer::new(
                device,
                config.format,
                config.width,
                config.height,
                &self.state.registry,
                &self.state.scene,
            ));
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let (Some(surface), Some(device), Some(config)) =
            (&self.surface, &self.device, &mut self.config)
        else {
            return;
        };
        config.width = new_size.width.max(1);
        config.height = new_size.height.max(1);
        surface.configure(device, config);
        if let Err(e) = self.state.scene.resize(config.width, config.height) {
            tracing::error!("scene resize failed: {e}");
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(device, config.width, config.height);
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut layers = String::new();
        if let Some(renderer) = &mut self.renderer {
            if self.uploaded_generation != self.state.video_generation {
                renderer.reset_video();
                self.uploaded_generation = self.state.video_generation;
            }
            if let Some(frame) = self.state.video.as_ref().and_then(|v| v.current_frame()) {
                renderer.upload_video_frame(device, queue, frame);
            }
            renderer.render(device, queue, &view, &self.state.scene);
            layers = renderer
                .active_layers()
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", ");
        }

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx, layers.clone());
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("GPU initialization failed: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if self.state.handle_key(key) {
                    self.rebuild_renderer();
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.dragging = btn_state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
                self.state.dragging = false;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.scene.orbit_mut().dolly(wheel_steps(delta));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("backdrop-desktop starting");

    let state = AppState::new(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn overrides_win_over_config() {
        let overrides = Overrides {
            video: Some(PathBuf::from("frames")),
            variant: Some(Variant::Minimal),
        };
        let config = overrides.apply(SceneConfig::default());
        assert_eq!(config.variant, Variant::Minimal);
        assert_eq!(config.video.path, Some(PathBuf::from("frames")));
        assert_eq!(Overrides::default().apply(config.clone()), config);
    }

    #[test]
    fn settings_edits_do_not_rebuild() {
        let old = SceneConfig::default();
        let mut new = old.clone();
        new.settings.insert(
            backdrop_scene::settings::TIME_SCALE,
            backdrop_panel::Setting::number(2.0),
        );
        assert!(!needs_rebuild(&old, &new));
        new.variant = Variant::Minimal;
        assert!(needs_rebuild(&old, &new));
    }

    #[test]
    fn wheel_deltas_become_notches() {
        assert_eq!(wheel_steps(MouseScrollDelta::LineDelta(0.0, 2.0)), 2.0);
        assert_eq!(
            wheel_steps(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -100.0))),
            -2.0
        );
    }

    #[test]
    fn reload_to_new_video_drops_the_old_fit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, "variant: minimal\n").unwrap();
        let cli = Cli::parse_from([
            "backdrop-desktop",
            "--config",
            path.to_str().unwrap(),
        ]);
        let mut state = AppState::new(&cli).unwrap();
        state.scene.resize(1280, 720).unwrap();
        state.update(0.0);
        state.update(0.0);
        assert!(state.scene.video().fit().is_some());

        // Settings-only reload keeps the source.
        std::fs::write(&path, "variant: minimal\nsettings:\n  timeScale:\n    value: 2.0\n")
            .unwrap();
        assert!(!state.reload_config());
        assert_eq!(state.video_generation, 0);
        assert!(state.scene.video().fit().is_some());

        let missing = dir.path().join("no-frames");
        std::fs::write(
            &path,
            format!("variant: minimal\nvideo:\n  path: {}\n", missing.display()),
        )
        .unwrap();
        assert!(!state.reload_config());
        assert_eq!(state.video_generation, 1);
        assert!(state.video.is_none());
        assert!(!state.scene.is_ready());
        assert!(state.scene.video().fit().is_none());
        assert_eq!(
            state.scene.video().uniforms().get("image"),
            Some(backdrop_scene::UniformValue::Texture(false))
        );
    }

    #[test]
    fn app_state_boots_on_test_pattern() {
        let cli = Cli::parse_from(["backdrop-desktop", "--variant", "minimal"]);
        let mut state = AppState::new(&cli).unwrap();
        assert!(state.video.is_some());
        assert!(!state.scene.is_ready());
        // Metadata, then the first frame.
        state.update(0.0);
        state.update(0.0);
        assert!(state.scene.is_ready());
        assert!(state.video.as_ref().unwrap().is_playing());
        assert_eq!(state.scene.variant(), Variant::Minimal);
    }
}
