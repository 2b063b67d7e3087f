// src/rendering_lib/render_target.rs

use log::{debug, error};

use crate::error::{PortalError, Result};

/// Shared by the main pass and every portal target so one scene pipeline serves both.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Offscreen size for a viewport, scaled and clamped to the device limit.
pub fn target_size(viewport_width: u32, viewport_height: u32, render_scale: f32, max_dimension: u32) -> Result<(u32, u32)> {
    if viewport_width == 0 || viewport_height == 0 {
        return Err(PortalError::RenderTarget {
            label: "portal target".to_string(),
            reason: format!("viewport {viewport_width} x {viewport_height} has no area"),
        });
    }
    if !render_scale.is_finite() || render_scale <= 0.0 {
        return Err(PortalError::RenderTarget {
            label: "portal target".to_string(),
            reason: format!("render scale {render_scale} must be positive"),
        });
    }
    let scale = |dimension: u32| {
        let scaled = (dimension as f32 * render_scale).round().max(1.0) as u32;
        scaled.min(max_dimension.max(1))
    };
    Ok((scale(viewport_width), scale(viewport_height)))
}

/// Depth buffer for the main pass.
pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&depth_descriptor("Main Depth Texture", width.max(1), height.max(1)))
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn depth_descriptor(label: &str, width: u32, height: u32) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

struct TargetTextures {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    sample_bind_group: wgpu::BindGroup,
}

impl TargetTextures {
    fn create(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        color_format: wgpu::TextureFormat,
        sample_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let color_label = format!("{label} Color Texture");
        let color_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&color_label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_label = format!("{label} Depth Texture");
        let depth_view = device
            .create_texture(&depth_descriptor(&depth_label, width, height))
            .create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group_label = format!("{label} Sample Bind Group");
        let sample_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&bind_group_label),
            layout: sample_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Self {
            color_view,
            depth_view,
            sample_bind_group,
        }
    }
}

/// Color plus depth/stencil target that one portal's virtual view is drawn into. The textures
/// live exactly as long as this value; `resize` swaps them out wholesale.
pub struct PortalRenderTarget {
    label: String,
    color_format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    textures: TargetTextures,
}

impl PortalRenderTarget {
    /// Allocation errors are caught in an error scope and reported once as
    /// `PortalError::RenderTarget`.
    pub async fn new(
        device: &wgpu::Device,
        label: &str,
        size: (u32, u32),
        color_format: wgpu::TextureFormat,
        sample_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Result<Self> {
        let (width, height) = size;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let textures = TargetTextures::create(device, label, width, height, color_format, sample_layout, sampler);
        let validation = device.pop_error_scope().await;
        let out_of_memory = device.pop_error_scope().await;

        if let Some(err) = validation.or(out_of_memory) {
            error!("Failed to create render target {label} ({width}x{height}): {err}");
            return Err(PortalError::RenderTarget {
                label: label.to_string(),
                reason: err.to_string(),
            });
        }

        debug!("Created render target {label} ({width}x{height}, {color_format:?})");
        Ok(Self {
            label: label.to_string(),
            color_format,
            width,
            height,
            textures,
        })
    }

    /// Recreates both textures at the new size. The old ones are released when replaced.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        size: (u32, u32),
        sample_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) {
        let (width, height) = size;
        if width == self.width && height == self.height {
            return;
        }
        self.textures = TargetTextures::create(
            device,
            &self.label,
            width,
            height,
            self.color_format,
            sample_layout,
            sampler,
        );
        self.width = width;
        self.height = height;
        debug!("Resized render target {} to {width}x{height}", self.label);
    }

    /// Binds and clears the target. Drawing happens on the returned pass, and the target is
    /// released when the pass is dropped.
    pub fn begin_render<'a>(&'a self, encoder: &'a mut wgpu::CommandEncoder, clear: wgpu::Color) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.textures.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.textures.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        })
    }

    pub fn texture_view(&self) -> &wgpu::TextureView {
        &self.textures.color_view
    }

    pub fn sample_bind_group(&self) -> &wgpu::BindGroup {
        &self.textures.sample_bind_group
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
