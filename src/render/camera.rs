use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    pub fn from_bounds(center: Vec3, extent: Vec3) -> Self {
        let radius = extent.max_element();
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let position = center + Vec3::new(distance, distance * 0.4, distance);
        let forward = center - position;
        let (yaw, pitch) = forward_to_yaw_pitch(forward);
        Self::new(position, yaw, pitch)
    }

    /// Re-frames the given bounds without changing the view direction.
    pub fn frame_bounds_preserve_orientation(&mut self, center: Vec3, extent: Vec3) {
        let radius = extent.max_element();
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let (forward, _, _) = self.basis();
        self.position = center - forward * distance;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _, up) = self.basis();
        Mat4::look_at_rh(self.position, self.position + forward, up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(45f32.to_radians(), aspect.max(1e-3), 0.1, 1000.0)
    }

    pub fn nudge(&mut self, yaw_delta: f32, pitch_delta: f32, zoom_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        wrap_angles(&mut self.yaw, &mut self.pitch);
        if zoom_delta != 0.0 {
            let (forward, _, _) = self.basis();
            self.position += forward * zoom_delta;
        }
    }

    pub fn orbit_around(&mut self, pivot: Vec3, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        wrap_angles(&mut self.yaw, &mut self.pitch);

        let distance = (self.position - pivot).length().max(0.05);
        let (forward, _, _) = self.basis();
        self.position = pivot - forward * distance;
    }

    /// Screen-space pan: slides the camera along its right/up axes.
    pub fn pan(&mut self, right_delta: f32, up_delta: f32) {
        let (_, right, up) = self.basis();
        self.position += right * right_delta + up * up_delta;
    }

    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        camera_basis(self.yaw, self.pitch)
    }

    fn move_horizontal(&mut self, right: f32, up: f32, forward: f32) {
        let forward_dir = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right_dir = Vec3::new(-self.yaw.sin(), 0.0, self.yaw.cos());
        self.position += right_dir * right + Vec3::Y * up + forward_dir * forward;
    }

    pub fn update_movement(&mut self, input: &CameraMovement, frame_dt: f32) -> bool {
        let move_speed = 3.0 * frame_dt;
        let aim_speed = 1.8 * frame_dt;
        let mut changed = false;

        if input.aim_left {
            self.yaw -= aim_speed;
            changed = true;
        }
        if input.aim_right {
            self.yaw += aim_speed;
            changed = true;
        }
        if input.aim_up {
            self.pitch += aim_speed;
            changed = true;
        }
        if input.aim_down {
            self.pitch -= aim_speed;
            changed = true;
        }

        let mut forward = 0.0;
        let mut right = 0.0;
        let mut up = 0.0;
        if input.move_forward {
            forward += move_speed;
        }
        if input.move_backward {
            forward -= move_speed;
        }
        if input.move_left {
            right -= move_speed;
        }
        if input.move_right {
            right += move_speed;
        }
        if input.move_up {
            up += move_speed;
        }
        if input.move_down {
            up -= move_speed;
        }

        if forward != 0.0 || right != 0.0 || up != 0.0 {
            self.move_horizontal(right, up, forward);
            changed = true;
        }

        changed
    }
}

fn forward_to_yaw_pitch(forward: Vec3) -> (f32, f32) {
    let n = forward.normalize_or_zero();
    if n == Vec3::ZERO {
        return (0.0, 0.0);
    }
    (n.z.atan2(n.x), n.y.asin())
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

fn wrap_angles(yaw: &mut f32, pitch: &mut f32) {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if yaw.is_finite() {
        *yaw = (*yaw + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI;
    }
    // Clamp shy of the poles so the basis never degenerates.
    const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;
    if pitch.is_finite() {
        *pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraController, CameraMovement};
    use glam::Vec3;

    #[test]
    fn from_bounds_produces_finite_state() {
        let camera =
            CameraController::from_bounds(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        assert!(camera.position.is_finite());
        assert!(camera.yaw.is_finite());
        assert!(camera.pitch.is_finite());
    }

    #[test]
    fn movement_update_keeps_finite_values() {
        let mut camera = CameraController::new(Vec3::new(0.0, 0.0, 5.0), 0.0, 0.0);
        let movement = CameraMovement {
            move_forward: true,
            move_right: true,
            move_up: true,
            aim_right: true,
            aim_up: true,
            ..CameraMovement::default()
        };
        let changed = camera.update_movement(&movement, 1.0 / 60.0);
        assert!(changed);
        assert!(camera.position.is_finite());
        assert!(camera.yaw.is_finite());
        assert!(camera.pitch.is_finite());
    }

    #[test]
    fn frame_bounds_preserves_orientation() {
        let mut camera = CameraController::new(Vec3::new(5.0, 6.0, 7.0), 1.1, -0.3);
        camera.frame_bounds_preserve_orientation(Vec3::ZERO, Vec3::splat(2.0));
        assert!((camera.yaw - 1.1).abs() < 1e-6);
        assert!((camera.pitch + 0.3).abs() < 1e-6);
        assert!(camera.position.is_finite());
    }

    #[test]
    fn orbit_keeps_distance_to_pivot() {
        let pivot = Vec3::new(1.0, 0.0, 1.0);
        let mut camera = CameraController::new(Vec3::new(4.0, 2.0, 4.0), -2.2, -0.4);
        let before = (camera.position - pivot).length();
        camera.orbit_around(pivot, 0.3, 0.1);
        let after = (camera.position - pivot).length();
        assert!((before - after).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_clamped_away_from_the_poles() {
        let mut camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        for _ in 0..100 {
            camera.nudge(0.0, 0.5, 0.0);
        }
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        let (_, _, up) = camera.basis();
        assert!(up.length() > 0.5);
    }
}
