use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use heightscape_assets::{AssetPaths, SceneTextures};
use heightscape_common::{Camera, Extent};
use heightscape_input::{Action, Navigator};
use heightscape_render::{DemoScene, DrawList};
use heightscape_render_wgpu::TwoPassRenderer;
use heightscape_terrain::{HeightfieldMesh, TerrainConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Where the camera starts, above the middle of the terrain.
const CAMERA_START: Vec3 = Vec3::new(0.0, 30.0, 0.0);

#[derive(Parser)]
#[command(name = "heightscape-desktop", about = "Heightmap terrain demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the heightmap, textures and sky faces
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Grid cells along each side of the terrain
    #[arg(long, default_value_t = 100)]
    slices: u32,

    /// Height of a white heightmap texel
    #[arg(long, default_value_t = 15.0)]
    max_height: f32,
}

/// Physical key to the character the navigation layer understands.
fn movement_key(code: KeyCode) -> Option<char> {
    match code {
        KeyCode::KeyW => Some('w'),
        KeyCode::KeyS => Some('s'),
        KeyCode::KeyA => Some('a'),
        KeyCode::KeyD => Some('d'),
        KeyCode::KeyE => Some('e'),
        KeyCode::KeyQ => Some('q'),
        _ => None,
    }
}

/// Everything that exists only once a window and device do.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: TwoPassRenderer,
}

struct GpuApp {
    initial_size: PhysicalSize<u32>,
    textures: SceneTextures,
    terrain: HeightfieldMesh,
    scene: DemoScene,
    draws: DrawList,
    camera: Camera,
    navigator: Navigator,
    cursor: (f32, f32),
    gpu: Option<Gpu>,
}

impl GpuApp {
    fn new(cli: &Cli) -> Result<Self> {
        let paths = AssetPaths::with_root(&cli.assets);
        let config = TerrainConfig {
            x_slices: cli.slices,
            z_slices: cli.slices,
            max_height: cli.max_height,
            ..TerrainConfig::default()
        };
        let terrain = HeightfieldMesh::load(paths.heightmap_path(), &config)
            .context("terrain configuration")?;
        let textures = SceneTextures::load(&paths);

        let mut camera = Camera::new();
        camera.set_location(CAMERA_START);

        Ok(Self {
            initial_size: PhysicalSize::new(cli.width, cli.height),
            textures,
            terrain,
            scene: DemoScene::new(),
            draws: DrawList::new(),
            camera,
            navigator: Navigator::new(),
            cursor: (0.0, 0.0),
            gpu: None,
        })
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("Heightscape")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("heightscape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;
        device.on_uncaptured_error(Box::new(|e| tracing::error!("wgpu: {e}")));

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // The post pass writes final colours; keep them out of sRGB encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut renderer = TwoPassRenderer::new(
            &device,
            &queue,
            surface_format,
            Extent::new(config.width, config.height),
            &self.textures,
            &self.terrain,
        );
        renderer.resize(&device, &mut self.camera, config.width, config.height);

        tracing::info!(
            "GPU initialized with {} backend, surface {:?}",
            adapter.get_info().backend.to_str(),
            surface_format
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn redraw(&mut self) {
        self.navigator.update(&mut self.camera);
        self.scene.update();
        self.scene.collect(&mut self.draws);

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
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

        gpu.renderer
            .render(&gpu.device, &gpu.queue, &view, &self.camera, &self.draws);
        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("{e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer.resize(
                        &gpu.device,
                        &mut self.camera,
                        gpu.config.width,
                        gpu.config.height,
                    );
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if key == KeyCode::Escape && pressed {
                    event_loop.exit();
                } else if let Some(c) = movement_key(key) {
                    self.navigator.apply(Action::from_key(c, pressed));
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                let (x, y) = self.cursor;
                self.navigator
                    .pointer
                    .on_click(x, y, btn_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                if let Some(gpu) = &self.gpu {
                    let extent = Extent::new(gpu.config.width, gpu.config.height);
                    let action = self.navigator.pointer.on_drag(
                        self.cursor.0,
                        self.cursor.1,
                        extent,
                    );
                    self.navigator.apply(action);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("heightscape-desktop starting");

    let mut app = GpuApp::new(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use heightscape_input::Movement;

    #[test]
    fn wasd_eq_physical_keys_map_to_movement() {
        for (code, movement) in [
            (KeyCode::KeyW, Movement::Forward),
            (KeyCode::KeyS, Movement::Backward),
            (KeyCode::KeyA, Movement::Left),
            (KeyCode::KeyD, Movement::Right),
            (KeyCode::KeyE, Movement::Up),
            (KeyCode::KeyQ, Movement::Down),
        ] {
            let c = movement_key(code).unwrap();
            assert_eq!(Movement::from_key(c), Some(movement));
        }
        assert_eq!(movement_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["heightscape-desktop"]);
        assert_eq!((cli.width, cli.height), (1280, 720));
        assert_eq!(cli.slices, 100);
        assert_eq!(cli.max_height, 15.0);
        assert_eq!(cli.assets, PathBuf::from("./assets"));
    }

    #[test]
    fn app_starts_without_assets() {
        let dir = std::env::temp_dir().join("heightscape-desktop-missing-assets");
        let cli = Cli::parse_from([
            "heightscape-desktop",
            "--assets",
            dir.to_str().unwrap(),
            "--slices",
            "4",
        ]);
        let app = GpuApp::new(&cli).unwrap();
        assert_eq!(app.terrain.vertex_count(), 25);
        assert!(app.textures.ground_is_fallback);
        assert_eq!(app.camera.location(), CAMERA_START);
    }
}
