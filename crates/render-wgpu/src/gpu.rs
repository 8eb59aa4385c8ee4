use bytemuck::{Pod, Zeroable};
use heightscape_assets::SceneTextures;
use heightscape_common::{Camera, Extent};
use heightscape_render::{
    BlendMode, DEFAULT_CLEAR_COLOR, DirectionalLight, DrawItem, DrawList, FULLSCREEN_QUAD,
    FramePhase, FrameSequencer, MeshKind, OFFSCREEN_CLEAR_COLOR, RasterState, RenderError,
    ThreadAffinity,
};
use heightscape_terrain::HeightfieldMesh;
use wgpu::util::DeviceExt;

use crate::mesh::{CUBE_EDGE, GpuMesh, Vertex};
use crate::render_target::{COLOR_FORMAT, DEPTH_STENCIL_FORMAT, RenderTarget};
use crate::shaders;
use crate::skybox::Skybox;
use crate::texture;

/// Per-draw uniform slots available in one frame.
pub const MAX_DRAWS: usize = 64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    projection: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model_view: [[f32; 4]; 4],
    alpha: [f32; 4],
}

const DRAW_UNIFORMS_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Opaque items first, then translucent, at most `max` in total.
/// Returns the ordered items, how many of them are opaque and how many were dropped.
fn order_draws(list: &DrawList, max: usize) -> (Vec<DrawItem>, usize, usize) {
    let ordered: Vec<DrawItem> = list
        .opaque()
        .chain(list.translucent())
        .take(max)
        .copied()
        .collect();
    let opaque = ordered.iter().filter(|item| !item.is_translucent()).count();
    let dropped = list.len() - ordered.len();
    (ordered, opaque, dropped)
}

pub(crate) fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Off => None,
        BlendMode::SrcAlphaOneMinusSrcAlpha => {
            let component = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: component,
                alpha: component,
            })
        }
    }
}

pub(crate) fn depth_stencil_state(
    state: RasterState,
    compare: wgpu::CompareFunction,
) -> Option<wgpu::DepthStencilState> {
    state.depth_test.then(|| wgpu::DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: state.depth_write,
        depth_compare: compare,
        stencil: Default::default(),
        bias: Default::default(),
    })
}

fn clear_color(c: [f64; 4]) -> wgpu::Color {
    wgpu::Color {
        r: c[0],
        g: c[1],
        b: c[2],
        a: c[3],
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    state: RasterState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: blend_state(state.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: depth_stencil_state(state, wgpu::CompareFunction::Less),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// Two-pass frame renderer.
///
/// Pass 1 draws the skybox, the opaque items and then the translucent items
/// into an off-screen [`RenderTarget`]. Pass 2 samples that target through
/// the sepia/vignette shader onto the caller's output view.
pub struct TwoPassRenderer {
    affinity: ThreadAffinity,
    sequencer: FrameSequencer,
    light: DirectionalLight,
    viewport: Extent,
    target: RenderTarget,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    ground_material: wgpu::BindGroup,
    cube_material: wgpu::BindGroup,
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    terrain: GpuMesh,
    cube: GpuMesh,
    skybox: Skybox,
    post_pipeline: wgpu::RenderPipeline,
    post_layout: wgpu::BindGroupLayout,
    post_sampler: wgpu::Sampler,
    post_bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
    output_format: wgpu::TextureFormat,
}

impl TwoPassRenderer {
    /// Upload the scene's meshes and textures and build both passes.
    ///
    /// Must be called on the thread that will render; every later call is
    /// checked against it.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_format: wgpu::TextureFormat,
        extent: Extent,
        textures: &SceneTextures,
        terrain: &HeightfieldMesh,
    ) -> Self {
        let viewport = extent.at_least_one();
        let target = RenderTarget::new(device, viewport.width, viewport.height);

        // Frame uniforms (group 0)
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Per-draw uniforms (group 1), one aligned slot per draw
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let draw_stride = align_to(DRAW_UNIFORMS_SIZE, alignment);
        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: draw_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(DRAW_UNIFORMS_SIZE),
                },
                count: None,
            }],
        });
        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORMS_SIZE),
                }),
            }],
        });

        // Materials (group 2)
        let material_layout = texture::texture_pair_layout(device, "material_bind_group_layout");
        let material_sampler =
            texture::linear_sampler(device, "material_sampler", wgpu::AddressMode::Repeat);
        let ground_view = texture::upload_rgba(device, queue, "ground_texture", &textures.ground);
        let cube_view = texture::upload_rgba(device, queue, "cube_texture", &textures.cube);
        let ground_material = texture::texture_pair_bind_group(
            device,
            "ground_material",
            &material_layout,
            &ground_view,
            &material_sampler,
        );
        let cube_material = texture::texture_pair_bind_group(
            device,
            "cube_material",
            &material_layout,
            &cube_view,
            &material_sampler,
        );

        // Scene pipelines
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let opaque_pipeline = scene_pipeline(
            device,
            "opaque_pipeline",
            &scene_layout,
            &scene_shader,
            RasterState::OPAQUE,
        );
        let translucent_pipeline = scene_pipeline(
            device,
            "translucent_pipeline",
            &scene_layout,
            &scene_shader,
            RasterState::TRANSLUCENT,
        );

        // Post-process pipeline
        let post_layout = texture::texture_pair_layout(device, "post_bind_group_layout");
        let post_sampler =
            texture::linear_sampler(device, "post_sampler", wgpu::AddressMode::ClampToEdge);
        let post_bind_group = texture::texture_pair_bind_group(
            device,
            "post_bind_group",
            &post_layout,
            target.color_view(),
            &post_sampler,
        );
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("post_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::POST_SHADER.into()),
        });
        let post_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("post_pipeline_layout"),
            bind_group_layouts: &[&post_layout],
            push_constant_ranges: &[],
        });
        let post_state = RasterState::FULLSCREEN;
        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("post_pipeline"),
            layout: Some(&post_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &post_shader,
                entry_point: Some("vs_quad"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 4]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x2,
                        1 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_shader,
                entry_point: Some("fs_sepia_vignette"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: blend_state(post_state.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth_stencil_state(post_state, wgpu::CompareFunction::Always),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen_quad_buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let terrain = GpuMesh::terrain(device, terrain);
        let cube = GpuMesh::cube(device, CUBE_EDGE);
        let skybox = Skybox::new(device, queue, &textures.sky_faces);

        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            terrain_indices = terrain.index_count,
            draw_stride,
            "two-pass renderer ready"
        );

        Self {
            affinity: ThreadAffinity::current(),
            sequencer: FrameSequencer::new(),
            light: DirectionalLight::default(),
            viewport,
            target,
            frame_buffer,
            frame_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            ground_material,
            cube_material,
            opaque_pipeline,
            translucent_pipeline,
            terrain,
            cube,
            skybox,
            post_pipeline,
            post_layout,
            post_sampler,
            post_bind_group,
            quad_buffer,
            output_format,
        }
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn viewport(&self) -> Extent {
        self.viewport
    }

    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.output_format
    }

    pub fn light(&self) -> &DirectionalLight {
        &self.light
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = light;
    }

    /// Follow a new output size: camera aspect ratio, viewport, off-screen
    /// target and the post-pass binding of its colour attachment.
    pub fn resize(&mut self, device: &wgpu::Device, camera: &mut Camera, width: u32, height: u32) {
        if let Err(e) = self.affinity.ensure() {
            tracing::error!("{e}; resize ignored");
            return;
        }
        let extent = Extent::new(width, height).at_least_one();
        camera.set_ratio(extent.aspect_ratio());
        self.viewport = extent;
        if self.target.resize(device, extent.width, extent.height) {
            self.post_bind_group = texture::texture_pair_bind_group(
                device,
                "post_bind_group",
                &self.post_layout,
                self.target.color_view(),
                &self.post_sampler,
            );
        }
    }

    /// Render one frame of `items` seen through `camera` onto `output`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        camera: &Camera,
        items: &DrawList,
    ) {
        if let Err(e) = self.affinity.ensure() {
            tracing::error!("{e}; frame skipped");
            return;
        }

        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let light_dir = self.light.view_direction(&view);
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                projection: projection.to_cols_array_2d(),
                light_dir: light_dir.extend(0.0).to_array(),
                light_color: self.light.color.extend(1.0).to_array(),
                ambient: self.light.ambient.extend(1.0).to_array(),
            }),
        );

        let (ordered, opaque_count, dropped) = order_draws(items, MAX_DRAWS);
        if dropped > 0 {
            tracing::warn!(dropped, max = MAX_DRAWS, "draw list exceeds uniform slots");
        }
        if !ordered.is_empty() {
            let stride = self.draw_stride as usize;
            let mut bytes = vec![0u8; stride * ordered.len()];
            for (slot, item) in ordered.iter().enumerate() {
                let uniforms = DrawUniforms {
                    model_view: (view * item.world).to_cols_array_2d(),
                    alpha: [item.alpha(), 0.0, 0.0, 0.0],
                };
                let start = slot * stride;
                bytes[start..start + DRAW_UNIFORMS_SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(&uniforms));
            }
            queue.write_buffer(&self.draw_buffer, 0, &bytes);
        }
        self.skybox.update(queue, &view, &projection);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame_encoder"),
        });
        match self.encode(&mut encoder, output, &ordered, opaque_count) {
            Ok(()) => {
                queue.submit(std::iter::once(encoder.finish()));
            }
            Err(e) => {
                tracing::error!("{e}; frame dropped");
                self.sequencer.reset();
            }
        }
    }

    fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        ordered: &[DrawItem],
        opaque_count: usize,
    ) -> Result<(), RenderError> {
        self.sequencer.reset();
        let (opaque, translucent) = ordered.split_at(opaque_count);

        self.sequencer.enter(FramePhase::Pass1BindOffscreen)?;
        self.sequencer.enter(FramePhase::Pass1Clear)?;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offscreen_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(OFFSCREEN_CLEAR_COLOR)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target.depth_stencil_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });
            pass.set_viewport(
                0.0,
                0.0,
                self.viewport.width as f32,
                self.viewport.height as f32,
                0.0,
                1.0,
            );

            self.sequencer.enter(FramePhase::Pass1DrawSkybox)?;
            self.skybox.draw(&mut pass);

            self.sequencer.enter(FramePhase::Pass1DrawOpaque)?;
            pass.set_pipeline(&self.opaque_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            self.draw_items(&mut pass, opaque, 0);

            self.sequencer.enter(FramePhase::Pass1DrawTransparent)?;
            pass.set_pipeline(&self.translucent_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            self.draw_items(&mut pass, translucent, opaque_count);
        }

        self.sequencer.enter(FramePhase::Pass2BindDefault)?;
        self.sequencer.enter(FramePhase::Pass2Clear)?;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("post_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(DEFAULT_CLEAR_COLOR)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            self.sequencer.enter(FramePhase::Pass2DrawFullscreenQuad)?;
            pass.set_pipeline(&self.post_pipeline);
            pass.set_bind_group(0, &self.post_bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            pass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
        }

        self.sequencer.finish()
    }

    fn draw_items(&self, pass: &mut wgpu::RenderPass<'_>, items: &[DrawItem], first_slot: usize) {
        for (i, item) in items.iter().enumerate() {
            let offset = (first_slot + i) as u64 * self.draw_stride;
            pass.set_bind_group(1, &self.draw_bind_group, &[offset as u32]);
            let (material, mesh) = match item.mesh {
                MeshKind::Terrain => (&self.ground_material, &self.terrain),
                MeshKind::Cube => (&self.cube_material, &self.cube),
            };
            pass.set_bind_group(2, material, &[]);
            mesh.draw(pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use heightscape_render::Blend;

    fn item(mesh: MeshKind, blend: Blend) -> DrawItem {
        DrawItem {
            mesh,
            world: Mat4::IDENTITY,
            blend,
        }
    }

    #[test]
    fn draw_slots_respect_offset_alignment() {
        assert_eq!(DRAW_UNIFORMS_SIZE, 80);
        assert_eq!(align_to(DRAW_UNIFORMS_SIZE, 256), 256);
        assert_eq!(align_to(DRAW_UNIFORMS_SIZE, 16), 80);
        assert_eq!(align_to(256, 256), 256);
    }

    #[test]
    fn opaque_items_come_first() {
        let mut list = DrawList::new();
        list.push(item(MeshKind::Cube, Blend::Translucent { alpha: 0.75 }));
        list.push(item(MeshKind::Terrain, Blend::Opaque));

        let (ordered, opaque, dropped) = order_draws(&list, MAX_DRAWS);
        assert_eq!(opaque, 1);
        assert_eq!(dropped, 0);
        assert_eq!(ordered[0].mesh, MeshKind::Terrain);
        assert_eq!(ordered[1].mesh, MeshKind::Cube);
    }

    #[test]
    fn excess_draws_are_dropped() {
        let mut list = DrawList::new();
        for _ in 0..3 {
            list.push(item(MeshKind::Cube, Blend::Translucent { alpha: 0.5 }));
        }
        list.push(item(MeshKind::Terrain, Blend::Opaque));

        let (ordered, opaque, dropped) = order_draws(&list, 2);
        assert_eq!(ordered.len(), 2);
        assert_eq!(opaque, 1);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn blend_only_for_translucent_state() {
        assert!(blend_state(RasterState::OPAQUE.blend).is_none());
        let blend = blend_state(RasterState::TRANSLUCENT.blend).unwrap();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn depth_state_follows_raster_state() {
        let sky = depth_stencil_state(RasterState::SKYBOX, wgpu::CompareFunction::LessEqual).unwrap();
        assert!(!sky.depth_write_enabled);
        assert_eq!(sky.format, DEPTH_STENCIL_FORMAT);
        assert!(depth_stencil_state(RasterState::FULLSCREEN, wgpu::CompareFunction::Always).is_none());
    }
}
