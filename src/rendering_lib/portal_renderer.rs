// src/rendering_lib/portal_renderer.rs

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use log::debug;
use wgpu::util::DeviceExt;

use super::mesh::{aperture_vertices, frame_vertices};
use super::render_target::{target_size, PortalRenderTarget, DEPTH_FORMAT};
use super::renderer::{SceneDrawer, SceneView, ViewSlot};
use super::shader::{portal_frame_shader_source, portal_surface_shader_source};
use super::vertex::Vertex;
use crate::config::PortalConfig;
use crate::engine_lib::portal::{EndpointId, PortalTable};
use crate::engine_lib::pose::ObserverPose;
use crate::engine_lib::virtual_view::VisibilityGate;
use crate::error::Result;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct PortalParamsUniform {
    edge_color: [f32; 4],
    linked: f32,
    _padding: [f32; 3],
}

/// GPU side of one endpoint.
struct PortalGpu {
    id: EndpointId,
    target: PortalRenderTarget,
    view_slot: ViewSlot,
    params_bind_group: wgpu::BindGroup,
    aperture: Range<u32>,
    frame: Range<u32>,
}

/// Per-frame inputs for the virtual-view passes.
pub struct PortalViewRequest<'a> {
    pub portals: &'a PortalTable,
    pub observer: &'a ObserverPose,
    pub projection: Mat4,
    pub time: f32,
    pub apply_distortion: bool,
}

/// Owns every portal's offscreen target plus the aperture and frame geometry, and draws them.
pub struct PortalRenderer {
    surface_pipeline: wgpu::RenderPipeline,
    frame_pipeline: wgpu::RenderPipeline,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    aperture_vertex_buffer: wgpu::Buffer,
    frame_vertex_buffer: wgpu::Buffer,
    portals: Vec<PortalGpu>,
    gate: VisibilityGate,
    render_scale: f32,
    clear_color: wgpu::Color,
}

impl PortalRenderer {
    /// Links are read once here; the aperture of an endpoint without a destination is drawn
    /// in its edge color only.
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        view_layout: &wgpu::BindGroupLayout,
        table: &PortalTable,
        viewport: (u32, u32),
        config: &PortalConfig,
    ) -> Result<Self> {
        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Portal Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let params_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Portal Params Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Portal Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let surface_pipeline = create_pipeline(
            device,
            "Portal Surface",
            &portal_surface_shader_source(),
            &[view_layout, &texture_bind_group_layout, &params_bind_group_layout],
            color_format,
            None,
        );
        let frame_pipeline = create_pipeline(
            device,
            "Portal Frame",
            &portal_frame_shader_source(),
            &[view_layout],
            color_format,
            Some(wgpu::Face::Back),
        );

        let size = target_size(
            viewport.0,
            viewport.1,
            config.render_scale,
            device.limits().max_texture_dimension_2d,
        )?;

        let mut aperture_mesh: Vec<Vertex> = Vec::new();
        let mut frame_mesh: Vec<Vertex> = Vec::new();
        let mut portals = Vec::with_capacity(table.len());
        for (id, endpoint) in table.iter() {
            let label = format!("Portal {id}");
            let target = PortalRenderTarget::new(
                device,
                &label,
                size,
                color_format,
                &texture_bind_group_layout,
                &sampler,
            )
            .await?;
            let view_slot = ViewSlot::new(device, view_layout, &format!("{label} View"));

            let params = PortalParamsUniform {
                edge_color: endpoint.edge_color(),
                linked: if endpoint.is_linked() { 1.0 } else { 0.0 },
                _padding: [0.0; 3],
            };
            let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Params Buffer")),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label} Params Bind Group")),
                layout: &params_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                }],
            });

            let aperture = append(&mut aperture_mesh, &aperture_vertices(endpoint.surface(), endpoint.edge_color()));
            let frame = append(&mut frame_mesh, &frame_vertices(endpoint.surface(), endpoint.edge_color()));

            portals.push(PortalGpu {
                id,
                target,
                view_slot,
                params_bind_group,
                aperture,
                frame,
            });
        }

        let aperture_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Aperture Vertex Buffer"),
            contents: bytemuck::cast_slice(&aperture_mesh),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let frame_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Frame Vertex Buffer"),
            contents: bytemuck::cast_slice(&frame_mesh),
            usage: wgpu::BufferUsages::VERTEX,
        });

        debug!("Portal renderer ready: {} portals, targets {}x{}", portals.len(), size.0, size.1);

        let [r, g, b, a] = config.clear_color.map(f64::from);
        Ok(Self {
            surface_pipeline,
            frame_pipeline,
            texture_bind_group_layout,
            sampler,
            aperture_vertex_buffer,
            frame_vertex_buffer,
            portals,
            gate: VisibilityGate {
                max_distance: config.max_visible_distance,
                facing_threshold: config.facing_threshold,
            },
            render_scale: config.render_scale,
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    /// Recreates every target for the new viewport size.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: (u32, u32)) -> Result<()> {
        let size = target_size(
            viewport.0,
            viewport.1,
            self.render_scale,
            device.limits().max_texture_dimension_2d,
        )?;
        for portal in &mut self.portals {
            portal
                .target
                .resize(device, size, &self.texture_bind_group_layout, &self.sampler);
        }
        Ok(())
    }

    /// Draws the scene from each visible portal's virtual view into that portal's target.
    /// Must be encoded before the main pass that samples the targets. Returns the number of
    /// views rendered.
    pub fn render_portal_views<D>(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        request: &PortalViewRequest<'_>,
        drawer: &D,
    ) -> u32
    where
        D: SceneDrawer + ?Sized,
    {
        let mut rendered = 0;
        for id in request.portals.visible_portals(request.observer, &self.gate) {
            let Some(portal) = self.portals.iter().find(|p| p.id == id) else {
                continue;
            };

            let virtual_view = request.portals.virtual_view(id, request.observer, request.projection);
            portal.view_slot.write(
                queue,
                &SceneView {
                    view: virtual_view.view,
                    projection: virtual_view.projection,
                    time: request.time,
                    apply_distortion: request.apply_distortion,
                },
            );

            let mut render_pass = portal.target.begin_render(encoder, self.clear_color);
            drawer.draw(&mut render_pass, &portal.view_slot);
            rendered += 1;
        }
        rendered
    }

    /// Textured apertures, drawn from the real camera.
    pub fn render_portal_surfaces<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, main_view: &'a ViewSlot) {
        if self.portals.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.surface_pipeline);
        render_pass.set_bind_group(0, main_view.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, self.aperture_vertex_buffer.slice(..));
        for portal in &self.portals {
            render_pass.set_bind_group(1, portal.target.sample_bind_group(), &[]);
            render_pass.set_bind_group(2, &portal.params_bind_group, &[]);
            render_pass.draw(portal.aperture.clone(), 0..1);
        }
    }

    pub fn render_portal_frames<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, main_view: &'a ViewSlot) {
        if self.portals.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.frame_pipeline);
        render_pass.set_bind_group(0, main_view.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, self.frame_vertex_buffer.slice(..));
        for portal in &self.portals {
            render_pass.draw(portal.frame.clone(), 0..1);
        }
    }

    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.portals.first().map(|p| p.target.size())
    }
}

/// Appends `vertices` and returns the range they occupy.
fn append(mesh: &mut Vec<Vertex>, vertices: &[Vertex]) -> Range<u32> {
    let start = mesh.len() as u32;
    mesh.extend_from_slice(vertices);
    start..mesh.len() as u32
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    color_format: wgpu::TextureFormat,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} Shader Module")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader_module,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader_module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
