// src/app.rs

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use winit::{
    event::{DeviceEvent, WindowEvent},
    window::{CursorGrabMode, Window},
};

use crate::ui::{build_ui, FrameStats};
use portal_engine::config::EngineConfig;
use portal_engine::demo_scene;
use portal_engine::engine_lib::camera::Camera;
use portal_engine::engine_lib::controller::CameraController;
use portal_engine::engine_lib::scene_types::{Scene, StepOutcome};
use portal_engine::error::{PortalError, Result};
use portal_engine::rendering_lib::portal_renderer::{PortalRenderer, PortalViewRequest};
use portal_engine::rendering_lib::render_target::create_depth_view;
use portal_engine::rendering_lib::renderer::{view_bind_group_layout, SceneDrawer, SceneRenderer, SceneView, ViewSlot};

pub struct PortalApp {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    depth_view: wgpu::TextureView,
    main_view: ViewSlot,
    scene_renderer: SceneRenderer,
    portal_renderer: PortalRenderer,
    scene: Scene,
    camera: Camera,
    camera_controller: CameraController,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    clear_color: wgpu::Color,
    start_time: Instant,
    last_portal_views: u32,
    is_focused: bool,
}

impl PortalApp {
    pub async fn new(window: Arc<Window>, engine_config: &EngineConfig) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| PortalError::Surface(format!("failed to create surface: {e}")))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| PortalError::Surface("no compatible graphics adapter".to_string()))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| PortalError::Surface(format!("failed to create device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| PortalError::Surface("surface reports no formats".to_string()))?;
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
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!("Surface configured: {}x{} {:?}", config.width, config.height, config.format);

        let scene = demo_scene::create_demo_scene(engine_config)?;

        let view_layout = view_bind_group_layout(&device);
        let main_view = ViewSlot::new(&device, &view_layout, "Main View");
        let scene_renderer = SceneRenderer::new(&device, config.format, &view_layout, &scene.props);
        let portal_renderer = PortalRenderer::new(
            &device,
            config.format,
            &view_layout,
            &scene.portals,
            (config.width, config.height),
            &engine_config.portals,
        )
        .await?;
        let depth_view = create_depth_view(&device, config.width, config.height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        let camera_config = &engine_config.camera;
        let camera = Camera::new(camera_config.fov_y_deg, camera_config.znear, camera_config.zfar);

        let initial_focus = window.has_focus();
        let mut initial_grab = false;
        if initial_focus {
            if window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_e| window.set_cursor_grab(CursorGrabMode::Locked))
                .is_ok()
            {
                window.set_cursor_visible(false);
                initial_grab = true;
            } else {
                warn!("Could not grab cursor on init");
            }
        }

        let camera_controller = CameraController::new(
            initial_grab,
            camera_config.mouse_sensitivity,
            engine_config.distortion_enabled,
        );

        let [r, g, b, a] = engine_config.portals.clear_color.map(f64::from);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            depth_view,
            main_view,
            scene_renderer,
            portal_renderer,
            scene,
            camera,
            camera_controller,
            egui_ctx,
            egui_state,
            egui_renderer,
            clear_color: wgpu::Color { r, g, b, a },
            start_time: Instant::now(),
            last_portal_views: 0,
            is_focused: initial_focus,
        })
    }

    pub fn get_size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    /// Reconfigures the surface and recreates the depth buffer and every portal target.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
        if let Err(err) = self.portal_renderer.resize(&self.device, (new_size.width, new_size.height)) {
            error!("Failed to resize portal targets: {err}");
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.is_focused = focused;
    }

    pub fn update(&mut self, dt: f32) {
        if let StepOutcome::PassedUnlinked(id) = self.camera_controller.apply_to_scene(&mut self.scene, dt) {
            debug!("Walked through unlinked portal {id}");
        }
    }

    fn frame_stats(&self) -> FrameStats {
        let observer = &self.scene.observer;
        FrameStats {
            position: observer.position(),
            yaw_deg: observer.yaw(),
            pitch_deg: observer.pitch(),
            scale: observer.scale(),
            speed: self.scene.locomotion.speed(observer),
            portal_views: self.last_portal_views,
            portal_count: self.portal_renderer.portal_count(),
            distortion_enabled: self.camera_controller.distortion_enabled(),
            cursor_grabbed: self.camera_controller.cursor_grabbed,
        }
    }

    pub fn render(&mut self, window: &Window) -> std::result::Result<(), wgpu::SurfaceError> {
        let output_texture = self.surface.get_current_texture()?;
        let view = output_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Main Command Encoder"),
        });

        let time = self.start_time.elapsed().as_secs_f32();
        let apply_distortion = self.camera_controller.distortion_enabled();
        let projection = self.camera.projection_matrix(self.config.width, self.config.height);

        // Portal targets first: the main pass samples them.
        self.last_portal_views = self.portal_renderer.render_portal_views(
            &self.queue,
            &mut encoder,
            &PortalViewRequest {
                portals: &self.scene.portals,
                observer: &self.scene.observer,
                projection,
                time,
                apply_distortion,
            },
            &self.scene_renderer,
        );

        self.main_view.write(
            &self.queue,
            &SceneView {
                view: self.scene.observer.view_matrix(),
                projection,
                time,
                apply_distortion,
            },
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
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
            });
            self.scene_renderer.draw(&mut render_pass, &self.main_view);
            self.portal_renderer.render_portal_surfaces(&mut render_pass, &self.main_view);
            self.portal_renderer.render_portal_frames(&mut render_pass, &self.main_view);
        }

        let stats = self.frame_stats();
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            build_ui(ctx, &stats);
        });
        self.egui_state.handle_platform_output(window, full_output.platform_output);
        let tris = self.egui_ctx.tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        self.egui_renderer.update_buffers(&self.device, &self.queue, &mut encoder, &tris, &screen_descriptor);
        {
            let mut gui_render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.egui_renderer.render(&mut gui_render_pass, &tris, &screen_descriptor);
        }
        for tex_id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(tex_id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output_texture.present();
        Ok(())
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent, window: &Window) -> bool {
        if self.egui_state.on_window_event(window, event).consumed {
            return true;
        }
        if self.camera_controller.handle_window_event(event, window) {
            return true;
        }
        match event {
            WindowEvent::Focused(focused) => {
                self.is_focused = *focused;
                false
            }
            _ => false,
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if self.is_focused {
            self.camera_controller.handle_device_event(event);
        }
    }
}
