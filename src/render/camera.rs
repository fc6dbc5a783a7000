use crate::config::NavigatorConfig;
use crate::input::InputState;
use crate::render::pick::Ray;
use crate::scene::Bounds;
use glam::{Mat4, Vec2, Vec3};

/// First-person camera that walks the gallery floor plane.
///
/// Yaw 0 faces +X; the navigator starts at yaw -90 degrees, facing the back
/// wall down -Z. Steps are per tick, not per second.
#[derive(Debug, Clone)]
pub struct CameraNavigator {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    bounds: Bounds,
    input: InputState,
    move_speed: f32,
    rotation_speed: f32,
    mouse_sensitivity: f32,
    max_pitch: f32,
    fov_y: f32,
}

impl CameraNavigator {
    pub fn new(config: &NavigatorConfig, bounds: Bounds) -> Self {
        let position = bounds.clamp(Vec3::from_array(config.start_position));
        Self {
            position,
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            bounds,
            input: InputState::default(),
            move_speed: config.move_speed,
            rotation_speed: config.rotation_speed,
            mouse_sensitivity: config.mouse_sensitivity,
            max_pitch: config.max_vertical_angle_deg.to_radians(),
            fov_y: config.fov_y_deg.to_radians(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    pub fn look_at(&self) -> Vec3 {
        let (forward, _, _) = self.basis();
        self.position + forward
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (_, _, up) = self.basis();
        Mat4::look_at_rh(self.position, self.look_at(), up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 1000.0)
    }

    /// Advance one tick from the held keys. Returns true if anything moved.
    pub fn tick(&mut self) -> bool {
        let input = self.input;
        let mut changed = false;

        let mut yaw_delta = 0.0;
        if input.turn_left {
            yaw_delta -= self.rotation_speed;
        }
        if input.turn_right {
            yaw_delta += self.rotation_speed;
        }
        let mut pitch_delta = 0.0;
        if input.look_up {
            pitch_delta += self.rotation_speed;
        }
        if input.look_down {
            pitch_delta -= self.rotation_speed;
        }
        if input.turn_left || input.turn_right || input.look_up || input.look_down {
            self.rotate(yaw_delta, pitch_delta);
            changed = true;
        }

        let mut forward = 0.0;
        let mut right = 0.0;
        if input.move_forward {
            forward += self.move_speed;
        }
        if input.move_backward {
            forward -= self.move_speed;
        }
        if input.move_left {
            right -= self.move_speed;
        }
        if input.move_right {
            right += self.move_speed;
        }
        if forward != 0.0 || right != 0.0 {
            self.move_horizontal(right, forward);
            changed = true;
        }

        changed
    }

    /// Apply a pointer drag delta in pixels.
    pub fn mouse_look(&mut self, delta: Vec2) {
        self.rotate(
            delta.x * self.mouse_sensitivity,
            -delta.y * self.mouse_sensitivity,
        );
    }

    /// Ray through a point in normalized device coordinates (x right, y up,
    /// both in -1..1).
    pub fn view_ray(&self, ndc: Vec2, aspect: f32) -> Ray {
        let (forward, right, up) = self.basis();
        let tan_half = (self.fov_y * 0.5).tan();
        let direction = forward
            + right * (ndc.x * tan_half * aspect)
            + up * (ndc.y * tan_half);
        Ray::new(self.position, direction)
    }

    fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw = wrap_angle(self.yaw + yaw_delta);
        self.pitch = (self.pitch + pitch_delta).clamp(-self.max_pitch, self.max_pitch);
    }

    fn move_horizontal(&mut self, right: f32, forward: f32) {
        let forward_dir = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right_dir = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        let candidate = self.position + right_dir * right + forward_dir * forward;
        self.position = self.bounds.clamp(candidate);
    }
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

fn wrap_angle(angle: f32) -> f32 {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if angle.is_finite() {
        (angle + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI
    } else {
        0.0
    }
}
