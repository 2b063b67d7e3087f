// src/rendering_lib/mod.rs

pub mod vertex;
pub mod mesh;
pub mod shader;
pub mod renderer;
pub mod render_target;
pub mod portal_renderer;

pub use vertex::Vertex;
pub use renderer::{SceneDrawer, SceneRenderer, SceneView, ViewSlot};
pub use render_target::{PortalRenderTarget, DEPTH_FORMAT};
pub use portal_renderer::{PortalRenderer, PortalViewRequest};
