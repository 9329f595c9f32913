use glam::{Mat4, Vec3};
use winit::event::KeyEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

pub const CAMERA_SPEED: f32 = 2.0;
pub const CAMERA_ROTATION_SPEED: f32 = 1.5;
pub const FIELD_OF_VIEW: f32 = std::f32::consts::FRAC_PI_4;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

#[derive(Default, Clone, Copy, Debug)]
pub struct MovementState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
}

impl MovementState {
    const fn to_direction(&self, positive: bool, negative: bool) -> f32 {
        match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    const fn velocity(&self) -> (f32, f32, f32) {
        (
            self.to_direction(self.forward, self.backward),
            self.to_direction(self.right, self.left),
            self.to_direction(self.up, self.down),
        )
    }

    const fn rotation_velocity(&self) -> f32 {
        self.to_direction(self.rotate_right, self.rotate_left)
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub movement: MovementState,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Camera three units in front of the origin, looking down -Z
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: std::f32::consts::PI,
            pitch: 0.0,
            movement: MovementState::default(),
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Applies held movement keys over `delta` seconds
    pub fn update(&mut self, delta: f32) {
        let (fwd, right_dir, up_dir) = self.movement.velocity();
        let step = CAMERA_SPEED * delta;

        let displacement =
            self.forward() * fwd * step + self.right() * right_dir * step + Vec3::Y * up_dir * step;

        self.position += displacement;
        // Turning right lowers yaw given forward = (sin yaw, _, cos yaw)
        self.yaw -= self.movement.rotation_velocity() * CAMERA_ROTATION_SPEED * delta;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FIELD_OF_VIEW, aspect, NEAR_PLANE, FAR_PLANE)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    pub fn process_keyboard(&mut self, event: &KeyEvent) {
        let is_pressed = event.state.is_pressed();
        if let PhysicalKey::Code(keycode) = event.physical_key {
            self.set_key(keycode, is_pressed);
        }
    }

    pub fn set_key(&mut self, keycode: KeyCode, is_pressed: bool) {
        match keycode {
            KeyCode::KeyW => self.movement.forward = is_pressed,
            KeyCode::KeyS => self.movement.backward = is_pressed,
            KeyCode::KeyA => self.movement.left = is_pressed,
            KeyCode::KeyD => self.movement.right = is_pressed,
            KeyCode::Space => self.movement.up = is_pressed,
            KeyCode::ShiftLeft => self.movement.down = is_pressed,
            KeyCode::KeyQ => self.movement.rotate_left = is_pressed,
            KeyCode::KeyE => self.movement.rotate_right = is_pressed,
            _ => {}
        }
    }
}
