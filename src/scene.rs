use glam::{Mat4, Quat, Vec3};

use crate::camera::Camera;
use crate::gfx::GraphicsDevice;
use crate::mesh::{Mesh, UploadedMesh};
use crate::outline::{Transform, DEFAULT_SILHOUETTE_SCALE};

pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.2, 0.2, 1.0];

/// Continuous rotation about a fixed axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub axis: Vec3,
    /// Radians per second
    pub speed: f32,
    pub angle: f32,
}

impl Spin {
    pub fn new(axis: Vec3, speed: f32) -> Self {
        Self {
            axis: axis.try_normalize().unwrap_or(Vec3::Y),
            speed,
            angle: 0.0,
        }
    }

    pub fn advance(&mut self, delta: f32) {
        self.angle = (self.angle + self.speed * delta) % std::f32::consts::TAU;
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_axis_angle(self.axis, self.angle)
    }
}

/// Everything drawn in one frame: a single mesh instance and its camera
#[derive(Debug, Clone)]
pub struct Scene {
    pub mesh: UploadedMesh,
    pub placement: Transform,
    pub spin: Spin,
    pub camera: Camera,
    pub outline_enabled: bool,
    pub outline_scale: f32,
    pub clear_color: [f32; 4],
}

impl Scene {
    /// Uploads the cube and sets up the default view
    pub fn new<D: GraphicsDevice + ?Sized>(device: &mut D, spin_speed: f32) -> Self {
        Self::with_mesh(device, &Mesh::cube(), spin_speed)
    }

    pub fn with_mesh<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        mesh: &Mesh,
        spin_speed: f32,
    ) -> Self {
        Self {
            mesh: UploadedMesh::upload(device, mesh),
            placement: Transform::IDENTITY,
            spin: Spin::new(Vec3::new(0.5, 1.0, 0.0), spin_speed),
            camera: Camera::new(),
            outline_enabled: true,
            outline_scale: DEFAULT_SILHOUETTE_SCALE,
            clear_color: CLEAR_COLOR,
        }
    }

    pub fn update(&mut self, delta: f32) {
        self.spin.advance(delta);
        self.camera.update(delta);
    }

    /// Placement with the current spin applied on top of its rotation
    pub fn base_transform(&self) -> Transform {
        Transform {
            rotation: self.spin.rotation() * self.placement.rotation,
            ..self.placement
        }
    }

    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.camera.view_projection(aspect)
    }

    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) {
        self.mesh.release(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::HeadlessDevice;

    #[test]
    fn spin_accumulates_delta() {
        let mut spin = Spin::new(Vec3::Y, 2.0);
        spin.advance(0.25);
        spin.advance(0.25);
        assert!((spin.angle - 1.0).abs() < 1e-6);
    }

    #[test]
    fn spin_wraps_full_turns() {
        let mut spin = Spin::new(Vec3::Y, std::f32::consts::TAU);
        spin.advance(1.5);
        assert!(spin.angle < std::f32::consts::TAU);
        assert!((spin.angle - std::f32::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn zero_axis_falls_back_to_y() {
        let spin = Spin::new(Vec3::ZERO, 1.0);
        assert_eq!(spin.axis, Vec3::Y);
    }

    #[test]
    fn base_transform_follows_spin() {
        let mut device = HeadlessDevice::new();
        let mut scene = Scene::new(&mut device, 1.0);
        assert_eq!(scene.base_transform().rotation, Quat::IDENTITY);

        scene.update(0.5);
        let rotation = scene.base_transform().rotation;
        assert!((rotation.angle_between(Quat::IDENTITY) - 0.5).abs() < 1e-4);
        assert_eq!(scene.base_transform().translation, scene.placement.translation);
    }

    #[test]
    fn scene_defaults() {
        let mut device = HeadlessDevice::new();
        let scene = Scene::new(&mut device, 1.0);
        assert_eq!(scene.mesh.index_count, 36);
        assert!(scene.outline_enabled);
        assert_eq!(scene.outline_scale, DEFAULT_SILHOUETTE_SCALE);
    }
}
