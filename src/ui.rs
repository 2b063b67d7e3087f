// src/ui.rs

use glam::Vec3;

/// Snapshot of the observer and renderer shown in the overlay.
pub struct FrameStats {
    pub position: Vec3,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub scale: f32,
    pub speed: f32,
    pub portal_views: u32,
    pub portal_count: usize,
    pub distortion_enabled: bool,
    pub cursor_grabbed: bool,
}

pub fn build_ui(ctx: &egui::Context, stats: &FrameStats) {
    egui::Window::new("Controls & Info")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.vertical(|ui| {
                ui.label("Portal Engine");
                ui.separator();

                ui.label("🎮 Keyboard Controls:");
                ui.label("   W/A/S/D: Move");
                ui.label("   Space: Move Up");
                ui.label("   L-Shift/L-Ctrl: Move Down");
                ui.label("   Arrow Keys: Look Up/Down/Left/Right");
                ui.label("   Mouse (when grabbed): Look");
                ui.label("   Escape: Grab/Ungrab Mouse Cursor");
                ui.label("   N: Toggle Scene Distortion");
                ui.separator();

                let p = stats.position;
                ui.label(format!("Position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                ui.label(format!("Yaw / Pitch: {:.1}° / {:.1}°", stats.yaw_deg, stats.pitch_deg));
                ui.label(format!("Scale: {:.3}  (speed {:.2})", stats.scale, stats.speed));
                ui.label(format!("Portal views: {} / {}", stats.portal_views, stats.portal_count));
                ui.label(format!(
                    "Distortion: {}",
                    if stats.distortion_enabled { "on" } else { "off" }
                ));
                if !stats.cursor_grabbed {
                    ui.label("Click the window to grab the cursor");
                }
            });
        });
}
