// src/engine_lib/mod.rs
pub mod surface;
pub mod portal;
pub mod pose;
pub mod transform; // point and pose transit through a linked pair
pub mod crossing;
pub mod virtual_view;
pub mod camera;
pub mod controller;
pub mod scene_types;
pub mod scene_logic;

pub use surface::OrientedSurface;
pub use portal::{EndpointId, PortalDefinition, PortalEndpoint, PortalLink, PortalTable};
pub use pose::ObserverPose;
pub use crossing::{first_crossing, is_crossing};
pub use virtual_view::{VirtualView, VisibilityGate};
pub use camera::Camera;
pub use controller::CameraController;
pub use scene_types::{Locomotion, Prop, PropKind, Scene, StepOutcome};
