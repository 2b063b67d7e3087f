// src/config.rs

use std::fs;
use std::path::Path;

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "portal_engine.toml";
pub const CONFIG_PATH_ENV: &str = "PORTAL_ENGINE_CONFIG";

const MIN_WINDOW_DIM: u32 = 64;
const MAX_WINDOW_DIM: u32 = 8192;
const MIN_FOV: f32 = 20.0;
const MAX_FOV: f32 = 120.0;
const MIN_ZNEAR: f32 = 0.001;
const MIN_MOUSE_SENSITIVITY: f32 = 0.01;
const MAX_MOUSE_SENSITIVITY: f32 = 2.0;
const MIN_RENDER_SCALE: f32 = 0.1;
const MAX_RENDER_SCALE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Portal Engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Degrees per pixel.
    pub mouse_sensitivity: f32,
    /// Units per second at scale 1.
    pub movement_speed: f32,
    pub collision_radius: f32,
    pub start_position: Vec3,
    pub start_yaw_deg: f32,
    pub start_pitch_deg: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            znear: 0.1,
            zfar: 100.0,
            mouse_sensitivity: 0.1,
            movement_speed: 2.5,
            collision_radius: 0.5,
            start_position: Vec3::new(0.0, 1.0, 5.0),
            start_yaw_deg: -90.0,
            start_pitch_deg: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub max_visible_distance: f32,
    pub facing_threshold: f32,
    /// Offscreen target size relative to the window.
    pub render_scale: f32,
    pub clear_color: [f32; 4],
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            max_visible_distance: 50.0,
            facing_threshold: 0.1,
            render_scale: 1.0,
            clear_color: [0.03, 0.03, 0.05, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial state of the scene distortion effect (toggled at runtime with N).
    pub distortion_enabled: bool,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub portals: PortalConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            distortion_enabled: true,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            portals: PortalConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Clamps every value into a range the engine can run with. Non-finite floats fall back
    /// to their defaults.
    pub fn sanitize(mut self) -> Self {
        let defaults = Self::default();

        self.window.width = self.window.width.clamp(MIN_WINDOW_DIM, MAX_WINDOW_DIM);
        self.window.height = self.window.height.clamp(MIN_WINDOW_DIM, MAX_WINDOW_DIM);

        let camera = &mut self.camera;
        camera.fov_y_deg = finite_or(camera.fov_y_deg, defaults.camera.fov_y_deg).clamp(MIN_FOV, MAX_FOV);
        camera.znear = finite_or(camera.znear, defaults.camera.znear).max(MIN_ZNEAR);
        camera.zfar = finite_or(camera.zfar, defaults.camera.zfar);
        if camera.zfar <= camera.znear * 2.0 {
            camera.zfar = (camera.znear * 1000.0).max(defaults.camera.zfar);
        }
        camera.mouse_sensitivity = finite_or(camera.mouse_sensitivity, defaults.camera.mouse_sensitivity)
            .clamp(MIN_MOUSE_SENSITIVITY, MAX_MOUSE_SENSITIVITY);
        camera.movement_speed = finite_or(camera.movement_speed, defaults.camera.movement_speed).max(0.0);
        camera.collision_radius = finite_or(camera.collision_radius, defaults.camera.collision_radius).max(0.0);
        if !camera.start_position.is_finite() {
            camera.start_position = defaults.camera.start_position;
        }
        camera.start_yaw_deg = finite_or(camera.start_yaw_deg, defaults.camera.start_yaw_deg);
        camera.start_pitch_deg = finite_or(camera.start_pitch_deg, defaults.camera.start_pitch_deg).clamp(-89.0, 89.0);

        let portals = &mut self.portals;
        portals.max_visible_distance =
            finite_or(portals.max_visible_distance, defaults.portals.max_visible_distance).max(0.0);
        portals.facing_threshold =
            finite_or(portals.facing_threshold, defaults.portals.facing_threshold).clamp(-1.0, 1.0);
        portals.render_scale =
            finite_or(portals.render_scale, defaults.portals.render_scale).clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE);
        for channel in &mut portals.clear_color {
            *channel = finite_or(*channel, 0.0).clamp(0.0, 1.0);
        }

        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let parsed = toml::from_str::<Self>(contents)
            .map_err(|e| PortalError::Config(format!("failed to deserialize config: {e}")))?;
        Ok(parsed.sanitize())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Missing files are normal and only logged at info level; anything else is a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(PortalError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                warn!("Failed to load config from {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PortalError::Config(format!("failed to serialize config: {e}")))
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
