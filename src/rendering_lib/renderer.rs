// src/rendering_lib/renderer.rs

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::mesh::scene_vertices;
use super::render_target::DEPTH_FORMAT;
use super::shader::scene_shader_source;
use super::vertex::Vertex;
use crate::engine_lib::scene_types::Prop;

/// Everything a scene draw needs to know about the camera it is drawn from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneView {
    pub view: Mat4,
    pub projection: Mat4,
    pub time: f32,
    pub apply_distortion: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    time: f32,
    distortion: f32,
    _padding: [f32; 2],
}

impl From<&SceneView> for ViewUniform {
    fn from(view: &SceneView) -> Self {
        Self {
            view: view.view.to_cols_array_2d(),
            projection: view.projection.to_cols_array_2d(),
            time: view.time,
            distortion: if view.apply_distortion { 1.0 } else { 0.0 },
            _padding: [0.0; 2],
        }
    }
}

pub fn view_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("view_bind_group_layout"),
    })
}

/// A uniform buffer plus bind group holding one camera. The main camera and every portal own
/// a separate slot, so writing one view never clobbers another within the same submission.
pub struct ViewSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ViewSlot {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&ViewUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, view: &SceneView) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&ViewUniform::from(view)));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Draws the world. Called once for the real camera and once per visible portal each frame,
/// always with a different slot, so implementations must not keep per-view state.
pub trait SceneDrawer {
    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, view: &'a ViewSlot);
}

/// Draws the static props: all geometry baked into one world-space vertex buffer.
pub struct SceneRenderer {
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        view_layout: &wgpu::BindGroupLayout,
        props: &[Prop],
    ) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader Module"),
            source: wgpu::ShaderSource::Wgsl(scene_shader_source().into()),
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[view_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Pipeline"),
            layout: Some(&render_pipeline_layout),
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
                cull_mode: Some(wgpu::Face::Back),
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
        });

        let vertices = scene_vertices(props);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            render_pipeline,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

impl SceneDrawer for SceneRenderer {
    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, view: &'a ViewSlot) {
        if self.vertex_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, view.bind_group(), &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::{SceneView, ViewUniform};

    #[test]
    fn uniform_matches_wgsl_layout() {
        // two mat4x4 + time + distortion + vec2 padding
        assert_eq!(std::mem::size_of::<ViewUniform>(), 144);
        assert_eq!(std::mem::size_of::<ViewUniform>() % 16, 0);
    }

    #[test]
    fn uniform_packs_flag_and_matrices() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(0.8, 1.5, 0.1, 100.0);
        let scene_view = SceneView { view, projection, time: 2.5, apply_distortion: true };

        let uniform = ViewUniform::from(&scene_view);
        assert_eq!(uniform.view, view.to_cols_array_2d());
        assert_eq!(uniform.projection, projection.to_cols_array_2d());
        assert_eq!(uniform.time, 2.5);
        assert_eq!(uniform.distortion, 1.0);

        let plain = ViewUniform::from(&SceneView { apply_distortion: false, ..scene_view });
        assert_eq!(plain.distortion, 0.0);
    }
}
