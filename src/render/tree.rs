//! Tree render pipelines
//!
//! Three pipelines drawing into the HDR target: instanced ornament spheres
//! (plus the star), textured photo cards, and additive foliage sprites.
//! Instance data lives in storage buffers rewritten each frame from the
//! effect's CPU-side vectors.

use crate::effects::tree_morph::{CardInstance, FoliageInstance, MeshInstance, TreeMorphEffect};
use crate::render::{mesh, DEPTH_FORMAT, HDR_FORMAT};

pub struct TreeRenderer {
    foliage_pipeline: wgpu::RenderPipeline,
    mesh_pipeline: wgpu::RenderPipeline,
    card_pipeline: wgpu::RenderPipeline,

    foliage_buffer: wgpu::Buffer,
    mesh_buffer: wgpu::Buffer,
    card_buffer: wgpu::Buffer,

    sphere_vertices: wgpu::Buffer,
    sphere_indices: wgpu::Buffer,
    sphere_index_count: u32,

    foliage_bind_group: wgpu::BindGroup,
    mesh_bind_group: wgpu::BindGroup,
    card_bind_group: wgpu::BindGroup,

    foliage_count: u32,
    mesh_count: u32,
    card_count: u32,
}

impl TreeRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        globals_layout: &wgpu::BindGroupLayout,
        card_texture_view: &wgpu::TextureView,
        effect: &TreeMorphEffect,
    ) -> Self {
        let foliage_count = effect.foliage_instances().len() as u32;
        let mesh_count = effect.mesh_instances().len() as u32;
        let card_count = effect.card_instances().len() as u32;

        // Instance storage buffers, rewritten every frame
        let foliage_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Foliage Instance Buffer"),
            size: (foliage_count as usize * std::mem::size_of::<FoliageInstance>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mesh_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ornament Instance Buffer"),
            size: (mesh_count as usize * std::mem::size_of::<MeshInstance>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let card_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Card Instance Buffer"),
            size: (card_count as usize * std::mem::size_of::<CardInstance>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Shared unit sphere for ornaments and the star
        let (sphere_verts, sphere_idx) = mesh::uv_sphere(12, 16);
        let sphere_vertices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sphere Vertex Buffer"),
            size: (sphere_verts.len() * std::mem::size_of::<mesh::MeshVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let sphere_indices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sphere Index Buffer"),
            size: (sphere_idx.len() * std::mem::size_of::<u16>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&sphere_vertices, 0, bytemuck::cast_slice(&sphere_verts));
        queue.write_buffer(&sphere_indices, 0, bytemuck::cast_slice(&sphere_idx));

        // Bind group layouts
        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let foliage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Foliage Bind Group Layout"),
            entries: &[storage_entry(0)],
        });
        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ornament Bind Group Layout"),
            entries: &[storage_entry(0)],
        });
        let card_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Card Bind Group Layout"),
            entries: &[
                storage_entry(0),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
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

        let card_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Card Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let foliage_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Foliage Bind Group"),
            layout: &foliage_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: foliage_buffer.as_entire_binding(),
            }],
        });
        let mesh_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ornament Bind Group"),
            layout: &mesh_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: mesh_buffer.as_entire_binding(),
            }],
        });
        let card_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Card Bind Group"),
            layout: &card_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: card_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(card_texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&card_sampler),
                },
            ],
        });

        // Shaders and pipelines
        let foliage_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Foliage Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/foliage.wgsl").into()),
        });
        let ornament_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ornament Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/ornament.wgsl").into()),
        });
        let card_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Card Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/card.wgsl").into()),
        });

        let depth_write = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };
        let depth_read = wgpu::DepthStencilState {
            depth_write_enabled: false,
            ..depth_write.clone()
        };

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Ornament Pipeline Layout"),
            bind_group_layouts: &[globals_layout, &mesh_layout],
            push_constant_ranges: &[],
        });
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ornament Pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &ornament_shader,
                entry_point: Some("vs_main"),
                buffers: &[mesh::MeshVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &ornament_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_write.clone()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let card_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Card Pipeline Layout"),
            bind_group_layouts: &[globals_layout, &card_layout],
            push_constant_ranges: &[],
        });
        let card_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Card Pipeline"),
            layout: Some(&card_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &card_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &card_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Two-sided: the paper back is visible
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_write),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let foliage_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Foliage Pipeline Layout"),
                bind_group_layouts: &[globals_layout, &foliage_layout],
                push_constant_ranges: &[],
            });
        let foliage_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Foliage Pipeline"),
            layout: Some(&foliage_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &foliage_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &foliage_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    // Additive glow
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Occluded by ornaments and cards but never occludes them
            depth_stencil: Some(depth_read),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let renderer = Self {
            foliage_pipeline,
            mesh_pipeline,
            card_pipeline,
            foliage_buffer,
            mesh_buffer,
            card_buffer,
            sphere_vertices,
            sphere_indices,
            sphere_index_count: sphere_idx.len() as u32,
            foliage_bind_group,
            mesh_bind_group,
            card_bind_group,
            foliage_count,
            mesh_count,
            card_count,
        };
        renderer.upload(queue, effect);
        renderer
    }

    /// Push the effect's instance data to the GPU
    pub fn upload(&self, queue: &wgpu::Queue, effect: &TreeMorphEffect) {
        queue.write_buffer(
            &self.foliage_buffer,
            0,
            bytemuck::cast_slice(effect.foliage_instances()),
        );
        queue.write_buffer(
            &self.mesh_buffer,
            0,
            bytemuck::cast_slice(effect.mesh_instances()),
        );
        queue.write_buffer(
            &self.card_buffer,
            0,
            bytemuck::cast_slice(effect.card_instances()),
        );
    }

    /// Draw the whole tree into the HDR target
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        hdr_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        globals_bind_group: &wgpu::BindGroup,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Tree Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: hdr_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Opaque ornaments and star first
        render_pass.set_pipeline(&self.mesh_pipeline);
        render_pass.set_bind_group(0, globals_bind_group, &[]);
        render_pass.set_bind_group(1, &self.mesh_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
        render_pass.set_index_buffer(self.sphere_indices.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..self.sphere_index_count, 0, 0..self.mesh_count);

        // Photo cards
        render_pass.set_pipeline(&self.card_pipeline);
        render_pass.set_bind_group(0, globals_bind_group, &[]);
        render_pass.set_bind_group(1, &self.card_bind_group, &[]);
        render_pass.draw(0..6, 0..self.card_count);

        // Additive foliage last
        render_pass.set_pipeline(&self.foliage_pipeline);
        render_pass.set_bind_group(0, globals_bind_group, &[]);
        render_pass.set_bind_group(1, &self.foliage_bind_group, &[]);
        render_pass.draw(0..6, 0..self.foliage_count);
    }
}
