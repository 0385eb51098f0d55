//! Software frame rendering for the viewer and `rgb_array` mode.
//!
//! A minimal pinhole projection: bodies become depth-sorted sprites, debug
//! markers become sampled line segments. No GPU, no external renderer.

use nalgebra::{Isometry3, Vector3};
use pushgym_math::Point3;

use crate::session::{BodyKind, SimSession};

/// Camera distance from the scene focus point.
const CAMERA_DISTANCE: f64 = 1.3;
/// Scene focus point height (table level-ish).
const FOCUS_HEIGHT: f64 = 0.8;
/// Vertical field of view in degrees.
const FOV_DEGREES: f64 = 60.0;
/// Near plane; anything closer is skipped.
const NEAR: f64 = 0.05;

const BACKGROUND: [u8; 3] = [235, 235, 240];
const FIXED_COLOR: [u8; 3] = [128, 128, 128];
const DYNAMIC_COLOR: [u8; 3] = [225, 130, 40];
const KINEMATIC_COLOR: [u8; 3] = [60, 120, 220];

struct Camera {
    view: Isometry3<f64>,
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Camera {
    fn new(width: usize, height: usize) -> Self {
        let eye = Point3::new(
            CAMERA_DISTANCE,
            -CAMERA_DISTANCE,
            FOCUS_HEIGHT + CAMERA_DISTANCE * 0.6,
        );
        let target = Point3::new(0.0, 0.0, FOCUS_HEIGHT);
        let view = Isometry3::look_at_rh(&eye, &target, &Vector3::z());
        let focal = height as f64 / (2.0 * (FOV_DEGREES.to_radians() / 2.0).tan());
        Self {
            view,
            focal,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        }
    }

    /// Project a world point to pixel coordinates plus camera depth.
    fn project(&self, p: &Point3) -> Option<(f64, f64, f64)> {
        let cam = self.view * p;
        let depth = -cam.z;
        if depth < NEAR {
            return None;
        }
        let u = self.cx + self.focal * cam.x / depth;
        let v = self.cy - self.focal * cam.y / depth;
        Some((u, v, depth))
    }
}

fn put_pixel(buf: &mut [u8], width: usize, height: usize, x: i64, y: i64, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return;
    }
    let idx = (y as usize * width + x as usize) * 3;
    buf[idx..idx + 3].copy_from_slice(&color);
}

fn draw_disc(buf: &mut [u8], width: usize, height: usize, u: f64, v: f64, r: f64, color: [u8; 3]) {
    let r = r.max(1.0);
    let (u0, v0) = (u.round() as i64, v.round() as i64);
    let ri = r.ceil() as i64;
    for dy in -ri..=ri {
        for dx in -ri..=ri {
            if (dx * dx + dy * dy) as f64 <= r * r {
                put_pixel(buf, width, height, u0 + dx, v0 + dy, color);
            }
        }
    }
}

impl SimSession {
    /// Render the current scene into a `width * height * 3` RGB byte buffer.
    pub fn render_frame(&self, width: usize, height: usize) -> Vec<u8> {
        let mut buf = vec![0u8; width * height * 3];
        for px in buf.chunks_exact_mut(3) {
            px.copy_from_slice(&BACKGROUND);
        }
        let camera = Camera::new(width, height);

        // Depth-sort so nearer bodies overdraw farther ones.
        let mut sprites: Vec<(f64, f64, f64, f64, [u8; 3])> = Vec::new();
        for name in self.body_names() {
            let Ok((pos, _)) = self.body_pose(&name) else {
                continue;
            };
            let Some((u, v, depth)) = camera.project(&pos) else {
                continue;
            };
            let radius = self.body_bounding_radius(&name).unwrap_or(0.02);
            let color = match self.body_kind(&name) {
                Some(BodyKind::Fixed) => FIXED_COLOR,
                Some(BodyKind::Dynamic) => DYNAMIC_COLOR,
                Some(BodyKind::Kinematic) | None => KINEMATIC_COLOR,
            };
            sprites.push((depth, u, v, camera.focal * radius / depth, color));
        }
        sprites.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (_, u, v, r, color) in sprites {
            draw_disc(&mut buf, width, height, u, v, r, color);
        }

        // Markers on top, sampled along the segment.
        for marker in self.markers() {
            let color = [
                (marker.color[0] * 255.0) as u8,
                (marker.color[1] * 255.0) as u8,
                (marker.color[2] * 255.0) as u8,
            ];
            const SAMPLES: usize = 48;
            for i in 0..=SAMPLES {
                let t = i as f64 / SAMPLES as f64;
                let p = Point3::new(
                    marker.from.x + t * (marker.to.x - marker.from.x),
                    marker.from.y + t * (marker.to.y - marker.from.y),
                    marker.from.z + t * (marker.to.z - marker.from.z),
                );
                if let Some((u, v, _)) = camera.project(&p) {
                    put_pixel(
                        &mut buf,
                        width,
                        height,
                        u.round() as i64,
                        v.round() as i64,
                        color,
                    );
                }
            }
        }

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BodyKind, SessionMode, ShapeDesc};

    #[test]
    fn test_frame_has_expected_size() {
        let sim = SimSession::connect(SessionMode::Headless).unwrap();
        let frame = sim.render_frame(64, 48);
        assert_eq!(frame.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_body_changes_pixels() {
        let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
        let empty = sim.render_frame(64, 48);
        sim.insert_body(
            "obj",
            BodyKind::Dynamic,
            ShapeDesc::Ball { radius: 0.05 },
            &Point3::new(0.0, 0.0, 0.8),
            &[0.0; 3],
            0.5,
            0.5,
        )
        .unwrap();
        let with_body = sim.render_frame(64, 48);
        assert_ne!(empty, with_body);
    }
}
