use glam::{Mat4, Quat, Vec3};

use enginish::gfx::{
    CompareFunc, DeviceCommand, DrawState, GraphicsDevice, HeadlessDevice, StencilOp,
};
use enginish::mesh::{Mesh, UploadedMesh};
use enginish::outline::{silhouette_mvps, OutlinePass, Transform, DEFAULT_SILHOUETTE_SCALE};

#[cfg(test)]
mod outline_tests {
    use super::*;

    fn setup() -> (HeadlessDevice, UploadedMesh) {
        let mut device = HeadlessDevice::new();
        let mesh = UploadedMesh::upload(&mut device, &Mesh::cube());
        device.clear_commands();
        (device, mesh)
    }

    fn view_projection() -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 4.0 / 3.0, 0.1, 100.0) * view
    }

    #[test]
    fn test_stencil_write_precedes_stencil_test() {
        let (mut device, mesh) = setup();
        let base = Transform::from_rotation(Quat::from_rotation_y(0.4));

        OutlinePass::new().draw_with_outline(
            &mut device,
            &mesh,
            &base,
            DEFAULT_SILHOUETTE_SCALE,
            view_projection(),
        );

        let draws: Vec<_> = device.draws().cloned().collect();
        assert_eq!(draws.len(), 2);

        let first = &draws[0];
        assert_eq!(first.uniforms.is_outline, 0.0);
        assert!(first.state.stencil.enabled);
        assert_eq!(first.state.stencil.compare, CompareFunc::Always);
        assert_eq!(first.state.stencil.reference, 1);
        assert_eq!(first.state.stencil.write_mask, 0xFF);
        assert_eq!(first.state.stencil.pass_op, StencilOp::Replace);

        let second = &draws[1];
        assert_eq!(second.uniforms.is_outline, 1.0);
        assert!(second.state.stencil.enabled);
        assert_eq!(second.state.stencil.compare, CompareFunc::NotEqual);
        assert_eq!(second.state.stencil.reference, 1);
        assert_eq!(second.state.stencil.write_mask, 0);

        assert_eq!(first.mesh, mesh.handle);
        assert_eq!(second.mesh, mesh.handle);
        assert_eq!(first.index_count, 36);
    }

    #[test]
    fn test_draw_state_restored_after_pass() {
        let (mut device, mesh) = setup();

        OutlinePass::new().draw_with_outline(
            &mut device,
            &mesh,
            &Transform::IDENTITY,
            DEFAULT_SILHOUETTE_SCALE,
            view_projection(),
        );

        let restored = device.draw_state();
        assert_eq!(restored, DrawState::default());
        assert!(restored.depth_test);
        assert!(!restored.stencil.enabled);
        assert_eq!(restored.stencil.write_mask, 0xFF);
        assert_eq!(
            device.commands().last(),
            Some(&DeviceCommand::SetDrawState(DrawState::default()))
        );
    }

    #[test]
    fn test_custom_entry_state_is_restored_and_inherited() {
        let (mut device, mesh) = setup();
        let entry = DrawState {
            depth_test: false,
            ..DrawState::default()
        };
        device.set_draw_state(entry);

        OutlinePass::new().draw_with_outline(
            &mut device,
            &mesh,
            &Transform::IDENTITY,
            DEFAULT_SILHOUETTE_SCALE,
            view_projection(),
        );

        assert!(device.draws().all(|d| !d.state.depth_test));
        assert_eq!(device.draw_state(), entry);
    }

    #[test]
    fn test_silhouette_grows_with_scale() {
        let bounds = Mesh::cube().bounds().unwrap();
        let base = Transform {
            translation: Vec3::new(0.5, -0.25, 0.0),
            rotation: Quat::from_rotation_x(0.3),
            scale: Vec3::ONE,
        };

        let silhouettes: Vec<_> = [1.0, 1.1, 2.0]
            .iter()
            .map(|&scale| {
                let (_, silhouette) = silhouette_mvps(&base, scale, Mat4::IDENTITY);
                bounds.transformed(&silhouette)
            })
            .collect();

        for pair in silhouettes.windows(2) {
            let (smaller, larger) = (pair[0], pair[1]);
            assert!(larger.extent().cmpgt(smaller.extent()).all());
            assert!(larger.min.cmple(smaller.min).all());
            assert!(larger.max.cmpge(smaller.max).all());
            assert!((larger.center() - smaller.center()).length() < 1e-5);
        }
    }

    #[test]
    fn test_unit_scale_silhouette_coincides_with_base() {
        let (mut device, mesh) = setup();
        let base = Transform::from_rotation(Quat::from_rotation_z(1.2));

        OutlinePass::new().draw_with_outline(&mut device, &mesh, &base, 1.0, view_projection());

        let draws: Vec<_> = device.draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].uniforms.model_view_proj, draws[1].uniforms.model_view_proj);
    }

    #[test]
    fn test_default_scale_uses_scaled_model() {
        let vp = view_projection();
        let base = Transform::IDENTITY;
        let (base_mvp, silhouette_mvp) = silhouette_mvps(&base, DEFAULT_SILHOUETTE_SCALE, vp);

        assert!(base_mvp.abs_diff_eq(vp, 1e-6));
        assert!(silhouette_mvp.abs_diff_eq(vp * Mat4::from_scale(Vec3::splat(1.1)), 1e-6));
    }

    #[test]
    fn test_plain_draw_has_no_stencil() {
        let (mut device, mesh) = setup();

        OutlinePass::new().draw_plain(&mut device, &mesh, &Transform::IDENTITY, view_projection());

        let draws: Vec<_> = device.draws().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].uniforms.is_outline, 0.0);
        assert!(!draws[0].state.stencil.enabled);
    }
}
