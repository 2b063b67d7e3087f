// src/lib.rs

pub mod config;
pub mod error;
pub mod engine_lib;
pub mod rendering_lib;
pub mod demo_scene;

pub use config::EngineConfig;
pub use error::{PortalError, Result};
