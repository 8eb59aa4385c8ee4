//! GPU tests for the off-screen target and the two-pass frame.
//! Each test returns early when no adapter is available.

use glam::{Mat4, Vec2, Vec3, Vec4};
use heightscape_assets::{SKY_FALLBACK_RGBA, SceneTextures, solid_rgba};
use heightscape_common::{Camera, Extent};
use heightscape_render::{DrawList, MeshDraw, MeshKind, SceneNode, SepiaVignette};
use heightscape_render_wgpu::{RenderTarget, TwoPassRenderer};
use heightscape_terrain::{HeightfieldMesh, TerrainConfig};

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const SIZE: u32 = 64;

fn try_create_device_and_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))?;
    let descriptor = wgpu::DeviceDescriptor {
        label: Some("heightscape-test-device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
        memory_hints: Default::default(),
    };
    let (device, queue) = pollster::block_on(adapter.request_device(&descriptor, None)).ok()?;
    device.on_uncaptured_error(Box::new(|e| eprintln!("uncaptured wgpu error: {e}")));
    Some((device, queue))
}

fn solid_textures() -> SceneTextures {
    SceneTextures {
        ground: solid_rgba([90, 120, 60, 255]),
        cube: solid_rgba([200, 200, 200, 255]),
        sky_faces: std::array::from_fn(|_| solid_rgba(SKY_FALLBACK_RGBA)),
        cube_reuses_ground: false,
        ground_is_fallback: true,
        sky_is_fallback: true,
    }
}

fn flat_terrain() -> HeightfieldMesh {
    let config = TerrainConfig {
        x_slices: 8,
        z_slices: 8,
        ..TerrainConfig::default()
    };
    HeightfieldMesh::from_heightmap(None, &config).unwrap()
}

fn output_texture(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test_output"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Read back an RGBA8 texture of `SIZE` x `SIZE` (one row is exactly 256 bytes).
fn read_pixels(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
    let bytes_per_row = SIZE * 4;
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: u64::from(bytes_per_row * SIZE),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| ());
    device.poll(wgpu::Maintain::Wait);
    let pixels = slice.get_mapped_range().to_vec();
    buffer.unmap();
    pixels
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn demo_camera() -> Camera {
    let mut camera = Camera::new();
    camera.set_location(Vec3::new(0.0, 30.0, 0.0));
    camera.set_target(Vec3::new(0.0, 30.0, -1.0));
    camera.set_ratio(1.0);
    camera
}

#[test]
fn render_target_tracks_requested_size() {
    let Some((device, _queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping render_target_tracks_requested_size (no GPU)");
        return;
    };

    let mut target = RenderTarget::new(&device, 64, 32);
    assert!(target.is_complete());
    assert_eq!((target.width(), target.height()), (64, 32));

    assert!(!target.resize(&device, 64, 32));
    assert!(target.resize(&device, 0, 10));
    assert_eq!(target.extent(), Extent::new(1, 10));
    assert!(target.status().is_ok());
}

#[test]
fn oversize_target_is_incomplete_but_kept() {
    let Some((device, _queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping oversize_target_is_incomplete_but_kept (no GPU)");
        return;
    };

    let too_big = device.limits().max_texture_dimension_2d + 1;
    let mut target = RenderTarget::new(&device, too_big, 4);
    assert!(!target.is_complete());
    assert_eq!(target.width(), too_big);

    assert!(target.resize(&device, 16, 16));
    assert!(target.is_complete());
}

#[test]
fn empty_scene_shows_toned_sky() {
    let Some((device, queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping empty_scene_shows_toned_sky (no GPU)");
        return;
    };

    let extent = Extent::new(SIZE, SIZE);
    let mut renderer = TwoPassRenderer::new(
        &device,
        &queue,
        OUTPUT_FORMAT,
        extent,
        &solid_textures(),
        &flat_terrain(),
    );
    let output = output_texture(&device);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.render(&device, &queue, &view, &demo_camera(), &DrawList::new());
    let pixels = read_pixels(&device, &queue, &output);

    let sky = Vec4::from_array(SKY_FALLBACK_RGBA.map(|c| c as f32 / 255.0));
    let uv = Vec2::splat((SIZE as f32 / 2.0 + 0.5) / SIZE as f32);
    let expected = SepiaVignette::apply(sky, uv) * 255.0;
    let centre = pixel(&pixels, SIZE / 2, SIZE / 2);
    for (channel, want) in centre.iter().zip(expected.to_array()) {
        assert!(
            (f32::from(*channel) - want).abs() <= 3.0,
            "centre {centre:?}, expected {expected}"
        );
    }

    let corner = pixel(&pixels, 0, 0);
    assert!(corner[0] < centre[0] / 2, "vignette should darken corners");
    assert_eq!(corner[3], 255);
}

#[test]
fn scene_graph_frame_and_resize() {
    let Some((device, queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping scene_graph_frame_and_resize (no GPU)");
        return;
    };

    let mut renderer = TwoPassRenderer::new(
        &device,
        &queue,
        OUTPUT_FORMAT,
        Extent::new(32, 16),
        &solid_textures(),
        &flat_terrain(),
    );
    let mut camera = demo_camera();

    renderer.resize(&device, &mut camera, SIZE, SIZE);
    assert_eq!(renderer.viewport(), Extent::new(SIZE, SIZE));
    assert_eq!(renderer.target().extent(), renderer.viewport());
    assert_eq!(camera.ratio, 1.0);

    let mut root = SceneNode::new();
    root.add_child(SceneNode::new().with_drawable(MeshDraw::opaque(MeshKind::Terrain)));
    root.add_child(
        SceneNode::new()
            .with_transform(Mat4::from_translation(Vec3::new(0.0, 30.0, -12.0)))
            .with_drawable(MeshDraw::translucent(MeshKind::Cube, 0.75)),
    );
    let mut items = DrawList::new();
    root.update_and_render(&Mat4::IDENTITY, &mut items);
    assert_eq!(items.len(), 2);

    let output = output_texture(&device);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    renderer.render(&device, &queue, &view, &camera, &items);
    let error = pollster::block_on(device.pop_error_scope());
    assert!(error.is_none(), "validation error: {error:?}");

    let pixels = read_pixels(&device, &queue, &output);
    let centre = pixel(&pixels, SIZE / 2, SIZE / 2);
    assert_eq!(centre[3], 255);
    // The grey cube sits in front of the camera and covers the centre.
    let sky_only = SepiaVignette::apply(
        Vec4::from_array(SKY_FALLBACK_RGBA.map(|c| c as f32 / 255.0)),
        Vec2::splat(0.5),
    ) * 255.0;
    assert!((f32::from(centre[2]) - sky_only.z).abs() > 3.0);
}

#[test]
fn mipmapped_ground_renders_cleanly() {
    let Some((device, queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping mipmapped_ground_renders_cleanly (no GPU)");
        return;
    };

    let mut textures = solid_textures();
    textures.ground = image::RgbaImage::from_fn(16, 8, |x, y| {
        let v = if (x + y) % 2 == 0 { 40 } else { 220 };
        image::Rgba([v, v, v, 255])
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let mut renderer = TwoPassRenderer::new(
        &device,
        &queue,
        OUTPUT_FORMAT,
        Extent::new(SIZE, SIZE),
        &textures,
        &flat_terrain(),
    );
    let mut items = DrawList::new();
    let mut root = SceneNode::new();
    root.add_child(SceneNode::new().with_drawable(MeshDraw::opaque(MeshKind::Terrain)));
    root.update_and_render(&Mat4::IDENTITY, &mut items);

    let output = output_texture(&device);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.render(&device, &queue, &view, &demo_camera(), &items);
    let error = pollster::block_on(device.pop_error_scope());
    assert!(error.is_none(), "validation error: {error:?}");
}

#[test]
fn calls_from_another_thread_are_skipped() {
    let Some((device, queue)) = try_create_device_and_queue() else {
        eprintln!("Skipping calls_from_another_thread_are_skipped (no GPU)");
        return;
    };

    let mut renderer = TwoPassRenderer::new(
        &device,
        &queue,
        OUTPUT_FORMAT,
        Extent::new(SIZE, SIZE),
        &solid_textures(),
        &flat_terrain(),
    );
    let mut camera = demo_camera();
    let output = output_texture(&device);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    std::thread::scope(|s| {
        s.spawn(|| {
            renderer.resize(&device, &mut camera, 8, 4);
            renderer.render(&device, &queue, &view, &camera, &DrawList::new());
        });
    });

    // Neither call took effect: no resize, and nothing was drawn to the output.
    assert_eq!(renderer.viewport(), Extent::new(SIZE, SIZE));
    assert_eq!(renderer.target().extent(), Extent::new(SIZE, SIZE));
    assert_eq!(camera.ratio, 1.0);
    let pixels = read_pixels(&device, &queue, &output);
    assert!(pixels.iter().all(|&b| b == 0), "output was written");

    renderer.render(&device, &queue, &view, &camera, &DrawList::new());
    let pixels = read_pixels(&device, &queue, &output);
    assert_eq!(pixel(&pixels, SIZE / 2, SIZE / 2)[3], 255);
}
