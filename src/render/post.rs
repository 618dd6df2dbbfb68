//! Post-processing chain
//!
//! HDR scene -> bright pass (half resolution) -> separable blur ping-pong ->
//! composite to the swapchain with exposure tonemap and vignette.

use bytemuck::{Pod, Zeroable};

use crate::render::HDR_FORMAT;

/// Tunables shared by the bright and composite passes.
/// Must match the WGSL `PostParams` struct.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PostParams {
    pub threshold: f32,
    pub intensity: f32,
    pub exposure: f32,
    pub vignette_offset: f32,
    pub vignette_darkness: f32,
    pub _pad: [f32; 3],
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            intensity: 1.2,
            exposure: 1.5,
            vignette_offset: 0.1,
            vignette_darkness: 1.1,
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct BlurParams {
    dir: [f32; 2],
    _pad: [f32; 2],
}

pub struct PostChain {
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,

    io_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    params_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,

    bloom_a_view: wgpu::TextureView,
    bloom_b_view: wgpu::TextureView,

    bright_bind_group: wgpu::BindGroup,
    blur_h_bind_group: wgpu::BindGroup,
    blur_v_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
}

impl PostChain {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        hdr_view: &wgpu::TextureView,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Post Params Buffer"),
            size: std::mem::size_of::<PostParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&params_buffer, 0, bytemuck::bytes_of(&PostParams::default()));

        let blur_h_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blur H Params Buffer"),
            size: std::mem::size_of::<BlurParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let blur_v_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blur V Params Buffer"),
            size: std::mem::size_of::<BlurParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // One texture + sampler + uniform: bright pass and blur passes
        let io_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post IO Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // Scene + bloom + sampler + uniform
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
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
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bright_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bright Pass Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/bright_pass.wgsl").into()),
        });
        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/blur.wgsl").into()),
        });
        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/composite.wgsl").into()),
        });

        let fullscreen_pipeline = |label: &str,
                                   shader: &wgpu::ShaderModule,
                                   layout: &wgpu::BindGroupLayout,
                                   format: wgpu::TextureFormat| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let bright_pipeline =
            fullscreen_pipeline("Bright Pipeline", &bright_shader, &io_layout, HDR_FORMAT);
        let blur_pipeline =
            fullscreen_pipeline("Blur Pipeline", &blur_shader, &io_layout, HDR_FORMAT);
        let composite_pipeline = fullscreen_pipeline(
            "Composite Pipeline",
            &composite_shader,
            &composite_layout,
            surface_format,
        );

        let (
            bloom_a_view,
            bloom_b_view,
            bright_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
        ) = Self::create_targets(
            device,
            queue,
            &io_layout,
            &composite_layout,
            &sampler,
            &params_buffer,
            &blur_h_buffer,
            &blur_v_buffer,
            width,
            height,
            hdr_view,
        );

        Self {
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            io_layout,
            composite_layout,
            sampler,
            params_buffer,
            blur_h_buffer,
            blur_v_buffer,
            bloom_a_view,
            bloom_b_view,
            bright_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_targets(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        io_layout: &wgpu::BindGroupLayout,
        composite_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        params_buffer: &wgpu::Buffer,
        blur_h_buffer: &wgpu::Buffer,
        blur_v_buffer: &wgpu::Buffer,
        width: u32,
        height: u32,
        hdr_view: &wgpu::TextureView,
    ) -> (
        wgpu::TextureView,
        wgpu::TextureView,
        wgpu::BindGroup,
        wgpu::BindGroup,
        wgpu::BindGroup,
        wgpu::BindGroup,
    ) {
        // Bloom runs at half resolution
        let bloom_width = (width / 2).max(1);
        let bloom_height = (height / 2).max(1);

        let bloom_texture = |label| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: bloom_width,
                    height: bloom_height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: HDR_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let bloom_a = bloom_texture("Bloom Texture A");
        let bloom_b = bloom_texture("Bloom Texture B");
        let bloom_a_view = bloom_a.create_view(&wgpu::TextureViewDescriptor::default());
        let bloom_b_view = bloom_b.create_view(&wgpu::TextureViewDescriptor::default());

        queue.write_buffer(
            blur_h_buffer,
            0,
            bytemuck::bytes_of(&BlurParams {
                dir: [1.0 / bloom_width as f32, 0.0],
                _pad: [0.0; 2],
            }),
        );
        queue.write_buffer(
            blur_v_buffer,
            0,
            bytemuck::bytes_of(&BlurParams {
                dir: [0.0, 1.0 / bloom_height as f32],
                _pad: [0.0; 2],
            }),
        );

        let io_bind_group = |label, view: &wgpu::TextureView, buffer: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: io_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffer.as_entire_binding(),
                    },
                ],
            })
        };

        let bright_bind_group = io_bind_group("Bright Bind Group", hdr_view, params_buffer);
        let blur_h_bind_group = io_bind_group("Blur H Bind Group", &bloom_a_view, blur_h_buffer);
        let blur_v_bind_group = io_bind_group("Blur V Bind Group", &bloom_b_view, blur_v_buffer);

        let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: composite_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(hdr_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&bloom_a_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        (
            bloom_a_view,
            bloom_b_view,
            bright_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
        )
    }

    /// Recreate size-dependent targets after a surface resize
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        hdr_view: &wgpu::TextureView,
    ) {
        let (
            bloom_a_view,
            bloom_b_view,
            bright_bind_group,
            blur_h_bind_group,
            blur_v_bind_group,
            composite_bind_group,
        ) = Self::create_targets(
            device,
            queue,
            &self.io_layout,
            &self.composite_layout,
            &self.sampler,
            &self.params_buffer,
            &self.blur_h_buffer,
            &self.blur_v_buffer,
            width,
            height,
            hdr_view,
        );
        self.bloom_a_view = bloom_a_view;
        self.bloom_b_view = bloom_b_view;
        self.bright_bind_group = bright_bind_group;
        self.blur_h_bind_group = blur_h_bind_group;
        self.blur_v_bind_group = blur_v_bind_group;
        self.composite_bind_group = composite_bind_group;
    }

    /// Update the tunables
    pub fn write_params(&self, queue: &wgpu::Queue, params: &PostParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Run the whole chain, presenting into `surface_view`
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        let fullscreen = |encoder: &mut wgpu::CommandEncoder,
                          label: &str,
                          target: &wgpu::TextureView,
                          pipeline: &wgpu::RenderPipeline,
                          bind_group: &wgpu::BindGroup| {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        };

        fullscreen(
            encoder,
            "Bright Pass",
            &self.bloom_a_view,
            &self.bright_pipeline,
            &self.bright_bind_group,
        );
        fullscreen(
            encoder,
            "Blur H Pass",
            &self.bloom_b_view,
            &self.blur_pipeline,
            &self.blur_h_bind_group,
        );
        fullscreen(
            encoder,
            "Blur V Pass",
            &self.bloom_a_view,
            &self.blur_pipeline,
            &self.blur_v_bind_group,
        );
        fullscreen(
            encoder,
            "Composite Pass",
            surface_view,
            &self.composite_pipeline,
            &self.composite_bind_group,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_params_layout() {
        assert_eq!(std::mem::size_of::<PostParams>(), 32);
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
    }

    #[test]
    fn test_post_params_defaults() {
        let params = PostParams::default();
        assert_eq!(params.threshold, 0.8);
        assert_eq!(params.intensity, 1.2);
        assert_eq!(params.exposure, 1.5);
    }
}
