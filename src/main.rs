// src/main.rs

mod app;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{error, warn};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{Window, WindowBuilder},
};

use app::PortalApp;
use portal_engine::config::{EngineConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use portal_engine::error::{PortalError, Result};

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub async fn run() -> Result<()> {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            console_log::init_with_level(log::Level::Warn)
                .map_err(|e| PortalError::Surface(format!("couldn't initialize logger: {e}")))?;
        } else {
            env_logger::init();
        }
    }

    let engine_config = EngineConfig::load_or_default(&config_path());

    let event_loop = EventLoop::new().map_err(|e| PortalError::Surface(format!("failed to create event loop: {e}")))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(engine_config.window.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                engine_config.window.width,
                engine_config.window.height,
            ))
            .build(&event_loop)
            .map_err(|e| PortalError::Surface(format!("failed to create window: {e}")))?,
    );

    #[cfg(target_arch = "wasm32")]
    mount_canvas(&window)?;

    let mut app_state = PortalApp::new(window.clone(), &engine_config).await?;
    let mut last_time = Instant::now();

    event_loop
        .run(move |event, target: &EventLoopWindowTarget<()>| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                    if !app_state.handle_window_event(event, &window) {
                        match event {
                            WindowEvent::CloseRequested => {
                                target.exit();
                            }
                            WindowEvent::Resized(physical_size) => {
                                app_state.resize(*physical_size);
                            }
                            WindowEvent::Focused(is_focused) => {
                                app_state.set_focused(*is_focused);
                            }
                            _ => {}
                        }
                    }
                }
                Event::DeviceEvent { event: device_event, .. } => {
                    app_state.handle_device_event(&device_event);
                }
                Event::AboutToWait => {
                    let now = Instant::now();
                    let dt = (now - last_time).as_secs_f32();
                    last_time = now;
                    step_frame(&mut app_state, &window, target, dt);
                }
                _ => {}
            }
        })
        .map_err(|e| PortalError::Surface(format!("event loop failed: {e}")))
}

/// Appends the window's canvas to the page's `wasm-viewport` element.
#[cfg(target_arch = "wasm32")]
fn mount_canvas(window: &Window) -> Result<()> {
    use winit::platform::web::WindowExtWebSys;

    web_sys::window()
        .and_then(|win| win.document())
        .and_then(|doc| {
            let dst = doc.get_element_by_id("wasm-viewport")?;
            let canvas = web_sys::Element::from(window.canvas()?);
            dst.append_child(&canvas).ok()?;
            Some(())
        })
        .ok_or_else(|| PortalError::Surface("couldn't append canvas to #wasm-viewport".to_string()))
}

/// Simulation step, then render. Lost or outdated surfaces are reconfigured and the frame
/// is skipped.
fn step_frame(app_state: &mut PortalApp, window: &Window, target: &EventLoopWindowTarget<()>, dt: f32) {
    app_state.update(dt);
    match app_state.render(window) {
        Ok(()) => {}
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => app_state.resize(app_state.get_size()),
        Err(wgpu::SurfaceError::OutOfMemory) => {
            error!("GPU out of memory, exiting");
            target.exit();
        }
        Err(e) => warn!("Dropped frame: {e:?}"),
    }
    if !target.exiting() {
        window.request_redraw();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    wasm_bindgen_futures::spawn_local(async {
        if let Err(err) = run().await {
            error!("{err}");
        }
    });
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("{err}");
        std::process::exit(1);
    }
}
