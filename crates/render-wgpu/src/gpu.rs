use crate::mesh::{
    self, CornerVertex, PointVertex, QUAD_INDICES, SquareInstanceData, Vertex,
};
use crate::uniforms::{
    CameraUniform, LinesUniform, ParticlesUniform, SquaresUniform, VideoUniform,
};
use backdrop_media::VideoFrame;
use backdrop_scene::{MaterialKind, MaterialRegistry, Scene, SceneError, UniformValue};
use glam::Mat4;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const VIDEO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Errors that disable a single layer. The rest of the scene keeps drawing.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("{material} shader failed to compile: {message}")]
    ShaderCompile {
        material: MaterialKind,
        message: String,
    },
}

/// Vertex input and fixed-function state for one material pipeline.
struct PipelineSpec<'a> {
    kind: MaterialKind,
    material_layout: &'a wgpu::BindGroupLayout,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

/// Buffers and bindings of one drawable layer.
struct MaterialPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    instances: Option<(wgpu::Buffer, u32)>,
    indexed: bool,
}

impl MaterialPass {
    fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera: &wgpu::BindGroup,
        quad_indices: &wgpu::Buffer,
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera, &[]);
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        let instance_count = match &self.instances {
            Some((buffer, count)) => {
                pass.set_vertex_buffer(1, buffer.slice(..));
                *count
            }
            None => 1,
        };
        if self.indexed {
            pass.set_index_buffer(quad_indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..instance_count);
        } else {
            pass.draw(0..self.vertex_count, 0..instance_count);
        }
    }
}

/// The uploaded video frame backing the video layer's `image` uniform.
struct VideoTexture {
    view: wgpu::TextureView,
    texture: wgpu::Texture,
    slot: FrameSlot,
}

/// Texture size plus the index of the frame it holds, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameSlot {
    size: (u32, u32),
    index: Option<u64>,
}

impl FrameSlot {
    fn empty(size: (u32, u32)) -> Self {
        Self { size, index: None }
    }

    fn holds(&self, size: (u32, u32), index: u64) -> bool {
        self.size == size && self.index == Some(index)
    }

    fn forget(&mut self) {
        self.index = None;
    }
}

/// wgpu renderer for the background scene.
///
/// Draw order is video, particles, lines, squares. The video plane is opaque
/// and writes depth; the overlays blend over it without writing depth.
pub struct BackdropRenderer {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    quad_index_buffer: wgpu::Buffer,
    video_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    video_texture: VideoTexture,
    video: Option<MaterialPass>,
    squares: Option<MaterialPass>,
    particles: Option<MaterialPass>,
    lines: Option<MaterialPass>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl BackdropRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        registry: &MaterialRegistry,
        scene: &Scene,
    ) -> Self {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let video_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("video_bind_group_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("video_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let video_texture = create_video_texture(device, 1, 1);

        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_index_buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let ctx = BuildContext {
            device,
            registry,
            surface_format,
            camera_layout: &camera_layout,
        };

        let video = ctx.enable(MaterialKind::Video, || {
            ctx.video_pass(&video_layout, &sampler, &video_texture)
        });
        let squares = ctx.enable(MaterialKind::Squares, || {
            ctx.squares_pass(&material_layout, scene)
        });
        let particles = match scene.points() {
            Some(layer) => ctx.enable(MaterialKind::Particles, || {
                ctx.particles_pass(&material_layout, layer)
            }),
            None => None,
        };
        let lines = match scene.lines() {
            Some(layer) => ctx.enable(MaterialKind::Lines, || {
                ctx.lines_pass(&material_layout, layer)
            }),
            None => None,
        };

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            camera_buffer,
            camera_bind_group,
            quad_index_buffer,
            video_layout,
            sampler,
            video_texture,
            video,
            squares,
            particles,
            lines,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Materials whose pipelines built successfully.
    pub fn active_layers(&self) -> Vec<MaterialKind> {
        [
            (MaterialKind::Video, &self.video),
            (MaterialKind::Squares, &self.squares),
            (MaterialKind::Particles, &self.particles),
            (MaterialKind::Lines, &self.lines),
        ]
        .into_iter()
        .filter(|(_, pass)| pass.is_some())
        .map(|(kind, _)| kind)
        .collect()
    }

    /// Upload a decoded frame unless it is the one already on the GPU.
    /// Returns whether anything was written.
    pub fn upload_video_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: VideoFrame<'_>,
    ) -> bool {
        let size = (frame.width, frame.height);
        if self.video_texture.slot.holds(size, frame.index) {
            return false;
        }
        if frame.rgba.len() != frame.width as usize * frame.height as usize * 4 {
            tracing::warn!(
                index = frame.index,
                len = frame.rgba.len(),
                "video frame has wrong byte length, skipped"
            );
            return false;
        }

        if size != self.video_texture.slot.size {
            self.video_texture = create_video_texture(device, frame.width, frame.height);
            if let Some(pass) = &mut self.video {
                pass.bind_group = video_bind_group(
                    device,
                    &self.video_layout,
                    &pass.uniform_buffer,
                    &self.video_texture.view,
                    &self.sampler,
                );
            }
            tracing::debug!(width = frame.width, height = frame.height, "video texture resized");
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.video_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * frame.width),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        self.video_texture.slot.index = Some(frame.index);
        true
    }

    /// Forget the uploaded frame so the next upload always writes, even when
    /// a new source repeats the old one's size and frame index. The video
    /// layer stays undrawn until then.
    pub fn reset_video(&mut self) {
        self.video_texture.slot.forget();
        tracing::debug!("video texture reset for a new source");
    }

    /// Render one frame of the scene into `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::new(scene.view_projection())),
        );

        let video_ready = scene.video().uniforms().get("image") == Some(UniformValue::Texture(true))
            && self.video_texture.slot.index.is_some();
        if let Some(pass) = &self.video {
            let uniform = VideoUniform::pack(scene.video().uniforms(), scene.video_matrix());
            queue.write_buffer(&pass.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
        if let Some(pass) = &self.squares {
            let uniform = SquaresUniform::pack(scene.squares().uniforms(), scene.squares_matrix());
            queue.write_buffer(&pass.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
        if let (Some(pass), Some(layer), Some(model)) =
            (&self.particles, scene.points(), scene.points_matrix())
        {
            let uniform = ParticlesUniform::pack(layer.uniforms(), model);
            queue.write_buffer(&pass.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
        if let (Some(pass), Some(layer), Some(model)) =
            (&self.lines, scene.lines(), scene.lines_matrix())
        {
            let uniform = LinesUniform::pack(layer.uniforms(), model);
            queue.write_buffer(&pass.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }

        let mut rgb = scene.clear_color();
        if self.surface_format.is_srgb() {
            rgb = rgb.map(srgb_to_linear);
        }
        let [r, g, b] = rgb;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("backdrop_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if video_ready {
                if let Some(video) = &self.video {
                    video.draw(&mut pass, &self.camera_bind_group, &self.quad_index_buffer);
                }
            }
            for layer in [&self.particles, &self.lines, &self.squares]
                .into_iter()
                .flatten()
            {
                layer.draw(&mut pass, &self.camera_bind_group, &self.quad_index_buffer);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Shared inputs for building the per-material passes.
struct BuildContext<'a> {
    device: &'a wgpu::Device,
    registry: &'a MaterialRegistry,
    surface_format: wgpu::TextureFormat,
    camera_layout: &'a wgpu::BindGroupLayout,
}

impl BuildContext<'_> {
    /// Run a pass builder, logging and disabling the layer on failure.
    fn enable(
        &self,
        kind: MaterialKind,
        build: impl FnOnce() -> Result<MaterialPass, RenderError>,
    ) -> Option<MaterialPass> {
        match build() {
            Ok(pass) => {
                tracing::debug!(material = %kind, "pipeline ready");
                Some(pass)
            }
            Err(e) => {
                tracing::error!(material = %kind, "layer disabled: {e}");
                None
            }
        }
    }

    /// Compile the material's program and build its pipeline. Validation
    /// errors are captured in an error scope instead of reaching the
    /// device's uncaptured-error handler.
    fn pipeline(&self, spec: PipelineSpec<'_>) -> Result<wgpu::RenderPipeline, RenderError> {
        let program = self.registry.program(spec.kind)?;
        let device = self.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_label = format!("{}_vertex_shader", spec.kind);
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&vertex_label),
            source: wgpu::ShaderSource::Wgsl(program.vertex.clone()),
        });
        let fragment_label = format!("{}_fragment_shader", spec.kind);
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&fragment_label),
            source: wgpu::ShaderSource::Wgsl(program.fragment.clone()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("material_pipeline_layout"),
            bind_group_layouts: &[self.camera_layout, spec.material_layout],
            push_constant_ranges: &[],
        });

        let label = format!("{}_pipeline", spec.kind);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: Some(spec.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: spec.topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            Some(e) => Err(RenderError::ShaderCompile {
                material: spec.kind,
                message: e.to_string(),
            }),
            None => Ok(pipeline),
        }
    }

    fn uniform_buffer(&self, kind: MaterialKind, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{kind}_uniform_buffer")),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
    }

    fn vertex_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
    }

    fn uniform_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    fn video_pass(
        &self,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        texture: &VideoTexture,
    ) -> Result<MaterialPass, RenderError> {
        let pipeline = self.pipeline(PipelineSpec {
            kind: MaterialKind::Video,
            material_layout: layout,
            buffers: &[plane_vertex_layout()],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: wgpu::BlendState::REPLACE,
            depth_write: true,
        })?;
        let uniform_buffer = self.uniform_buffer(
            MaterialKind::Video,
            bytemuck::bytes_of(&VideoUniform {
                model: Mat4::IDENTITY.to_cols_array_2d(),
                resolution: [0.0; 4],
            }),
        );
        let bind_group = video_bind_group(self.device, layout, &uniform_buffer, &texture.view, sampler);
        let plane = mesh::unit_plane();
        Ok(MaterialPass {
            pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer: self.vertex_buffer("video_vertex_buffer", bytemuck::cast_slice(&plane)),
            vertex_count: plane.len() as u32,
            instances: None,
            indexed: true,
        })
    }

    fn squares_pass(
        &self,
        layout: &wgpu::BindGroupLayout,
        scene: &Scene,
    ) -> Result<MaterialPass, RenderError> {
        let pipeline = self.pipeline(PipelineSpec {
            kind: MaterialKind::Squares,
            material_layout: layout,
            buffers: &[
                plane_vertex_layout(),
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SquareInstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        2 => Float32x3,
                        3 => Float32,
                    ],
                },
            ],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: wgpu::BlendState::ALPHA_BLENDING,
            depth_write: false,
        })?;
        let layer = scene.squares();
        let uniform_buffer = self.uniform_buffer(
            MaterialKind::Squares,
            bytemuck::bytes_of(&SquaresUniform::pack(layer.uniforms(), scene.squares_matrix())),
        );
        let bind_group = self.uniform_bind_group(layout, &uniform_buffer);
        let plane = mesh::unit_plane();
        let instances = mesh::square_instances(layer);
        Ok(MaterialPass {
            pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer: self.vertex_buffer("squares_vertex_buffer", bytemuck::cast_slice(&plane)),
            vertex_count: plane.len() as u32,
            instances: Some((
                self.vertex_buffer("squares_instance_buffer", bytemuck::cast_slice(&instances)),
                instances.len() as u32,
            )),
            indexed: true,
        })
    }

    fn particles_pass(
        &self,
        layout: &wgpu::BindGroupLayout,
        layer: &backdrop_scene::layers::PointsLayer,
    ) -> Result<MaterialPass, RenderError> {
        let pipeline = self.pipeline(PipelineSpec {
            kind: MaterialKind::Particles,
            material_layout: layout,
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<CornerVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![1 => Float32x3],
                },
            ],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: wgpu::BlendState::ALPHA_BLENDING,
            depth_write: false,
        })?;
        let uniform_buffer = self.uniform_buffer(
            MaterialKind::Particles,
            bytemuck::bytes_of(&ParticlesUniform::pack(layer.uniforms(), Mat4::IDENTITY)),
        );
        let bind_group = self.uniform_bind_group(layout, &uniform_buffer);
        let corners = mesh::sprite_corners();
        let points = mesh::point_vertices(layer);
        Ok(MaterialPass {
            pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer: self.vertex_buffer("particles_corner_buffer", bytemuck::cast_slice(&corners)),
            vertex_count: corners.len() as u32,
            instances: Some((
                self.vertex_buffer("particles_instance_buffer", bytemuck::cast_slice(&points)),
                points.len() as u32,
            )),
            indexed: true,
        })
    }

    fn lines_pass(
        &self,
        layout: &wgpu::BindGroupLayout,
        layer: &backdrop_scene::layers::LinesLayer,
    ) -> Result<MaterialPass, RenderError> {
        let pipeline = self.pipeline(PipelineSpec {
            kind: MaterialKind::Lines,
            material_layout: layout,
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
            topology: wgpu::PrimitiveTopology::LineList,
            blend: wgpu::BlendState::ALPHA_BLENDING,
            depth_write: false,
        })?;
        let uniform_buffer = self.uniform_buffer(
            MaterialKind::Lines,
            bytemuck::bytes_of(&LinesUniform::pack(layer.uniforms(), Mat4::IDENTITY)),
        );
        let bind_group = self.uniform_bind_group(layout, &uniform_buffer);
        let vertices = mesh::line_vertices(layer);
        Ok(MaterialPass {
            pipeline,
            uniform_buffer,
            bind_group,
            vertex_buffer: self.vertex_buffer("lines_vertex_buffer", bytemuck::cast_slice(&vertices)),
            vertex_count: vertices.len() as u32,
            instances: None,
            indexed: false,
        })
    }
}

/// Clear colors are authored as sRGB hex; sRGB targets expect linear values.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn plane_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &PLANE_ATTRIBUTES,
    }
}

const PLANE_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
];

fn create_video_texture(device: &wgpu::Device, width: u32, height: u32) -> VideoTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("video_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: VIDEO_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    VideoTexture {
        view: texture.create_view(&Default::default()),
        texture,
        slot: FrameSlot::empty((width, height)),
    }
}

fn video_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("video_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgotten_slot_accepts_the_same_frame_again() {
        let mut slot = FrameSlot::empty((1280, 720));
        assert!(!slot.holds((1280, 720), 0));
        slot.index = Some(0);
        assert!(slot.holds((1280, 720), 0));
        assert!(!slot.holds((640, 360), 0));
        assert!(!slot.holds((1280, 720), 1));

        slot.forget();
        assert!(!slot.holds((1280, 720), 0));
        assert_eq!(slot.size, (1280, 720));
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(0.5) - 0.214).abs() < 1e-3);
    }
}
