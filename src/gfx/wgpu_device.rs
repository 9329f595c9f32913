use std::collections::HashMap;

use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use super::{
    attachment_status, ActiveTarget, AttachmentInfo, ColorFormat, CompareFunc, DepthStencilFormat,
    DrawState, DrawUniforms, FramebufferHandle, FramebufferStatus, GraphicsDevice, MeshHandle,
    RenderbufferHandle, StencilConfig, StencilOp, TextureHandle, TextureOrigin, UniformBlock,
};
use crate::error::DeviceError;
use crate::mesh::{Mesh, Vertex};

const OFFSCREEN_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_STENCIL_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
const INITIAL_UNIFORM_CAPACITY: u64 = 16;

struct GpuImage {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuImage {
    fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
            width,
            height,
        }
    }

    fn info(image: Option<&GpuImage>) -> AttachmentInfo {
        AttachmentInfo {
            size: image.map(|i| (i.width, i.height)),
        }
    }
}

#[derive(Default)]
struct TextureSlot {
    image: Option<GpuImage>,
    /// Bumped on every storage allocation
    generation: u64,
}

#[derive(Default)]
struct FramebufferSlot {
    color: Option<TextureHandle>,
    depth_stencil: Option<RenderbufferHandle>,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    format: wgpu::TextureFormat,
    state: DrawState,
}

struct DrawOp {
    mesh: MeshHandle,
    index_count: u32,
    uniform_index: u32,
    state: DrawState,
}

/// Draws destined for one target, in submission order
struct RecordedPass {
    target: ActiveTarget,
    clear: Option<[f32; 4]>,
    draws: Vec<DrawOp>,
}

/// Uniform ring rebuilt whenever a frame needs more slots than it holds
struct UniformArena {
    stride: u64,
    capacity: u64,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl UniformArena {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<UniformBlock>() as u64),
                }),
            }],
        });
        Self {
            stride,
            capacity,
            buffer,
            bind_group,
        }
    }
}

/// [`GraphicsDevice`] backed by wgpu.
///
/// Calls made through the trait are recorded into per-target passes and
/// replayed into a command encoder by [`WgpuDevice::encode_frame`]. Handles
/// keep their identity across storage reallocation; the wgpu texture behind
/// a handle is replaced.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    default_depth: GpuImage,

    framebuffers: SlotMap<FramebufferHandle, FramebufferSlot>,
    textures: SlotMap<TextureHandle, TextureSlot>,
    renderbuffers: SlotMap<RenderbufferHandle, Option<GpuImage>>,
    meshes: SlotMap<MeshHandle, GpuMesh>,

    active: ActiveTarget,
    state: DrawState,
    passes: Vec<RecordedPass>,
    staged_uniforms: Vec<UniformBlock>,

    shader: wgpu::ShaderModule,
    uniform_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniforms: UniformArena,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Outline Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/outline.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<UniformBlock>() as u64,
                    ),
                },
                count: None,
            }],
            label: Some("draw_uniform_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Outline Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = wgpu::util::align_to(std::mem::size_of::<UniformBlock>() as u64, alignment);
        let uniforms = UniformArena::new(&device, &uniform_layout, stride, INITIAL_UNIFORM_CAPACITY);

        let default_depth = Self::create_default_depth(&device, width, height);

        Self {
            device,
            queue,
            surface_format,
            default_depth,
            framebuffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            active: ActiveTarget::Default,
            state: DrawState::default(),
            passes: Vec::new(),
            staged_uniforms: Vec::new(),
            shader,
            uniform_layout,
            pipeline_layout,
            uniforms,
            pipelines: HashMap::new(),
        }
    }

    fn create_default_depth(device: &wgpu::Device, width: u32, height: u32) -> GpuImage {
        GpuImage::new(
            device,
            "Surface Depth Stencil",
            width.max(1),
            height.max(1),
            DEPTH_STENCIL_TEXTURE_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Keeps the default depth/stencil buffer matched to the window surface
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if (self.default_depth.width, self.default_depth.height) == (width.max(1), height.max(1)) {
            return;
        }
        self.default_depth = Self::create_default_depth(&self.device, width, height);
    }

    /// View of a color image, for registration with a UI renderer
    pub fn texture_view(&self, texture: TextureHandle) -> Option<&wgpu::TextureView> {
        self.textures
            .get(texture)
            .and_then(|slot| slot.image.as_ref())
            .map(|image| &image.view)
    }

    /// Changes whenever the storage behind `texture` is reallocated
    pub fn texture_generation(&self, texture: TextureHandle) -> Option<u64> {
        self.textures.get(texture).map(|slot| slot.generation)
    }

    /// Replays everything recorded since the last call into `encoder`.
    ///
    /// Passes aimed at the default target render into `surface_view`. Passes
    /// whose offscreen target is incomplete or released are dropped.
    pub fn encode_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) -> usize {
        let passes = std::mem::take(&mut self.passes);
        let staged = std::mem::take(&mut self.staged_uniforms);

        self.upload_uniforms(&staged);
        for pass in &passes {
            let format = self.pass_format(pass.target);
            for draw in &pass.draws {
                self.ensure_pipeline(PipelineKey {
                    format,
                    state: draw.state.without_reference(),
                });
            }
        }

        let mut encoded = 0;
        for pass in &passes {
            let (color_view, depth_view) = match pass.target {
                ActiveTarget::Default => (surface_view, &self.default_depth.view),
                ActiveTarget::Offscreen(framebuffer) => match self.offscreen_views(framebuffer) {
                    Some(views) => views,
                    None => {
                        log::warn!(
                            "skipping pass for incomplete framebuffer {framebuffer:?} ({} draws)",
                            pass.draws.len()
                        );
                        continue;
                    }
                },
            };
            self.encode_pass(encoder, pass, color_view, depth_view);
            encoded += 1;
        }
        encoded
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &RecordedPass,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        let (color_load, depth_load, stencil_load) = match pass.clear {
            Some([r, g, b, a]) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: f64::from(a),
                }),
                wgpu::LoadOp::Clear(1.0),
                wgpu::LoadOp::Clear(0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: stencil_load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let format = self.pass_format(pass.target);
        for draw in &pass.draws {
            let key = PipelineKey {
                format,
                state: draw.state.without_reference(),
            };
            let (Some(pipeline), Some(mesh)) = (self.pipelines.get(&key), self.meshes.get(draw.mesh))
            else {
                log::warn!("dropping draw of released mesh {:?}", draw.mesh);
                continue;
            };
            let offset = u64::from(draw.uniform_index) * self.uniforms.stride;

            render_pass.set_pipeline(pipeline);
            render_pass.set_stencil_reference(draw.state.stencil.reference);
            render_pass.set_bind_group(0, &self.uniforms.bind_group, &[offset as u32]);
            render_pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            render_pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
    }

    fn upload_uniforms(&mut self, staged: &[UniformBlock]) {
        if staged.is_empty() {
            return;
        }
        let count = staged.len() as u64;
        if count > self.uniforms.capacity {
            let capacity = count.next_power_of_two();
            log::debug!("growing draw uniform buffer to {capacity} slots");
            self.uniforms =
                UniformArena::new(&self.device, &self.uniform_layout, self.uniforms.stride, capacity);
        }

        let stride = self.uniforms.stride as usize;
        let mut bytes = vec![0u8; stride * staged.len()];
        for (chunk, block) in bytes.chunks_exact_mut(stride).zip(staged) {
            let block = bytemuck::bytes_of(block);
            chunk[..block.len()].copy_from_slice(block);
        }
        self.queue.write_buffer(&self.uniforms.buffer, 0, &bytes);
    }

    fn pass_format(&self, target: ActiveTarget) -> wgpu::TextureFormat {
        match target {
            ActiveTarget::Default => self.surface_format,
            ActiveTarget::Offscreen(_) => OFFSCREEN_COLOR_FORMAT,
        }
    }

    fn offscreen_views(
        &self,
        framebuffer: FramebufferHandle,
    ) -> Option<(&wgpu::TextureView, &wgpu::TextureView)> {
        if !self.framebuffer_status(framebuffer).is_complete() {
            return None;
        }
        let slot = self.framebuffers.get(framebuffer)?;
        let color = self.textures.get(slot.color?)?.image.as_ref()?;
        let depth_stencil = self.renderbuffers.get(slot.depth_stencil?)?.as_ref()?;
        Some((&color.view, &depth_stencil.view))
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("building pipeline for {:?}", key);
        let pipeline = self.create_pipeline(key);
        self.pipelines.insert(key, pipeline);
    }

    fn create_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: Vertex::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
        };

        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Outline Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil_state(&key.state)),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    fn current_pass(&mut self) -> &mut RecordedPass {
        let active = self.active;
        if !matches!(self.passes.last(), Some(pass) if pass.target == active) {
            self.passes.push(RecordedPass {
                target: self.active,
                clear: None,
                draws: Vec::new(),
            });
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), DeviceError> {
        let limit = self.max_texture_dimension();
        if width == 0 || height == 0 || width > limit || height > limit {
            return Err(DeviceError::StorageTooLarge {
                width,
                height,
                limit,
            });
        }
        Ok(())
    }
}

fn depth_stencil_state(state: &DrawState) -> wgpu::DepthStencilState {
    let stencil = if state.stencil.enabled {
        let face = stencil_face(&state.stencil);
        wgpu::StencilState {
            front: face,
            back: face,
            read_mask: state.stencil.read_mask,
            write_mask: state.stencil.write_mask,
        }
    } else {
        wgpu::StencilState {
            front: wgpu::StencilFaceState::IGNORE,
            back: wgpu::StencilFaceState::IGNORE,
            read_mask: 0,
            write_mask: 0,
        }
    };

    wgpu::DepthStencilState {
        format: DEPTH_STENCIL_TEXTURE_FORMAT,
        depth_write_enabled: state.depth_test,
        depth_compare: if state.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil,
        bias: wgpu::DepthBiasState::default(),
    }
}

fn stencil_face(config: &StencilConfig) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare_function(config.compare),
        fail_op: stencil_operation(config.fail_op),
        depth_fail_op: stencil_operation(config.depth_fail_op),
        pass_op: stencil_operation(config.pass_op),
    }
}

fn compare_function(func: CompareFunc) -> wgpu::CompareFunction {
    match func {
        CompareFunc::Always => wgpu::CompareFunction::Always,
        CompareFunc::Never => wgpu::CompareFunction::Never,
        CompareFunc::Equal => wgpu::CompareFunction::Equal,
        CompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunc::Less => wgpu::CompareFunction::Less,
        CompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunc::Greater => wgpu::CompareFunction::Greater,
        CompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
    }
}

fn stencil_operation(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::Increment => wgpu::StencilOperation::IncrementClamp,
        StencilOp::Decrement => wgpu::StencilOperation::DecrementClamp,
        StencilOp::Invert => wgpu::StencilOperation::Invert,
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_framebuffer(&mut self) -> FramebufferHandle {
        self.framebuffers.insert(FramebufferSlot::default())
    }

    fn create_texture(&mut self) -> TextureHandle {
        self.textures.insert(TextureSlot::default())
    }

    fn create_renderbuffer(&mut self) -> RenderbufferHandle {
        self.renderbuffers.insert(None)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffers.remove(framebuffer);
        if self.active == ActiveTarget::Offscreen(framebuffer) {
            self.active = ActiveTarget::Default;
        }
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(texture);
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.renderbuffers.remove(renderbuffer);
    }

    fn allocate_texture_storage(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> Result<(), DeviceError> {
        self.check_size(width, height)?;
        let wgpu_format = match format {
            ColorFormat::Rgba8 => OFFSCREEN_COLOR_FORMAT,
        };
        let image = GpuImage::new(
            &self.device,
            "Offscreen Color",
            width,
            height,
            wgpu_format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let slot = self
            .textures
            .get_mut(texture)
            .ok_or(DeviceError::UnknownHandle("texture"))?;
        slot.image = Some(image);
        slot.generation += 1;
        Ok(())
    }

    fn allocate_renderbuffer_storage(
        &mut self,
        renderbuffer: RenderbufferHandle,
        width: u32,
        height: u32,
        format: DepthStencilFormat,
    ) -> Result<(), DeviceError> {
        self.check_size(width, height)?;
        let wgpu_format = match format {
            DepthStencilFormat::Depth24Stencil8 => DEPTH_STENCIL_TEXTURE_FORMAT,
        };
        let image = GpuImage::new(
            &self.device,
            "Offscreen Depth Stencil",
            width,
            height,
            wgpu_format,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let slot = self
            .renderbuffers
            .get_mut(renderbuffer)
            .ok_or(DeviceError::UnknownHandle("renderbuffer"))?;
        *slot = Some(image);
        Ok(())
    }

    fn attach_color(
        &mut self,
        framebuffer: FramebufferHandle,
        texture: TextureHandle,
    ) -> Result<(), DeviceError> {
        if !self.textures.contains_key(texture) {
            return Err(DeviceError::UnknownHandle("texture"));
        }
        let slot = self
            .framebuffers
            .get_mut(framebuffer)
            .ok_or(DeviceError::UnknownHandle("framebuffer"))?;
        slot.color = Some(texture);
        Ok(())
    }

    fn attach_depth_stencil(
        &mut self,
        framebuffer: FramebufferHandle,
        renderbuffer: RenderbufferHandle,
    ) -> Result<(), DeviceError> {
        if !self.renderbuffers.contains_key(renderbuffer) {
            return Err(DeviceError::UnknownHandle("renderbuffer"));
        }
        let slot = self
            .framebuffers
            .get_mut(framebuffer)
            .ok_or(DeviceError::UnknownHandle("framebuffer"))?;
        slot.depth_stencil = Some(renderbuffer);
        Ok(())
    }

    fn framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let Some(slot) = self.framebuffers.get(framebuffer) else {
            return FramebufferStatus::Unknown;
        };
        let color = slot
            .color
            .and_then(|handle| self.textures.get(handle))
            .map(|tex| GpuImage::info(tex.image.as_ref()));
        let depth_stencil = slot
            .depth_stencil
            .and_then(|handle| self.renderbuffers.get(handle))
            .map(|rb| GpuImage::info(rb.as_ref()));
        attachment_status(color, depth_stencil)
    }

    fn bind_target(&mut self, target: ActiveTarget) {
        self.active = target;
    }

    fn active_target(&self) -> ActiveTarget {
        self.active
    }

    fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    fn texture_origin(&self) -> TextureOrigin {
        TextureOrigin::TopLeft
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> MeshHandle {
        let vertices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.meshes.insert(GpuMesh { vertices, indices })
    }

    fn delete_mesh(&mut self, mesh: MeshHandle) {
        self.meshes.remove(mesh);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.passes.push(RecordedPass {
            target: self.active,
            clear: Some(color),
            draws: Vec::new(),
        });
    }

    fn draw_state(&self) -> DrawState {
        self.state
    }

    fn set_draw_state(&mut self, state: DrawState) {
        self.state = state;
    }

    fn draw_indexed(&mut self, mesh: MeshHandle, index_count: u32, uniforms: &DrawUniforms) {
        if !self.meshes.contains_key(mesh) {
            log::warn!("draw with unknown mesh {mesh:?} ignored");
            return;
        }
        let uniform_index = self.staged_uniforms.len() as u32;
        self.staged_uniforms.push(UniformBlock::from(uniforms));
        let state = self.state;
        self.current_pass().draws.push(DrawOp {
            mesh,
            index_count,
            uniform_index,
            state,
        });
    }
}
