// src/error.rs

use thiserror::Error;

use crate::engine_lib::portal::EndpointId;

/// Everything that can go wrong while setting up the portal world or its GPU resources.
/// The per-frame transform math never produces one of these.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("degenerate surface basis: {reason}")]
    DegenerateBasis { reason: &'static str },

    #[error("invalid surface extent {width} x {height}")]
    InvalidExtent { width: f32, height: f32 },

    #[error("scale effect must be finite and positive, got {0}")]
    InvalidScale(f32),

    #[error("rotation effect must be finite")]
    InvalidRotation,

    #[error("unknown portal endpoint {0}")]
    UnknownEndpoint(EndpointId),

    #[error("portal endpoint {0} cannot be linked to itself")]
    SelfLink(EndpointId),

    #[error("render target '{label}' could not be created: {reason}")]
    RenderTarget { label: String, reason: String },

    #[error("graphics setup failed: {0}")]
    Surface(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;
