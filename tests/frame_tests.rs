use enginish::gfx::{ActiveTarget, DeviceCommand, GraphicsDevice, HeadlessDevice};
use enginish::scene::Scene;
use enginish::{FrameRenderer, PanelSize};

#[cfg(test)]
mod frame_tests {
    use super::*;

    fn setup() -> (HeadlessDevice, Scene, FrameRenderer) {
        let mut device = HeadlessDevice::new();
        let scene = Scene::new(&mut device, 1.0);
        device.clear_commands();
        (device, scene, FrameRenderer::new())
    }

    fn allocations(device: &HeadlessDevice) -> usize {
        device
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::TextureStorage { .. }))
            .count()
    }

    #[test]
    fn test_panel_frame_returns_image_and_default_target() {
        let (mut device, scene, mut renderer) = setup();

        let image = renderer
            .render_to_panel(&mut device, &scene, PanelSize::new(640, 480))
            .unwrap();

        assert_eq!((image.width, image.height), (640, 480));
        assert_eq!(Some(image.texture), renderer.target().color_texture());
        assert_eq!(device.active_target(), ActiveTarget::Default);

        let framebuffer = renderer.target().handles().unwrap().framebuffer;
        let draws: Vec<_> = device.draws().collect();
        assert_eq!(draws.len(), 2);
        assert!(draws
            .iter()
            .all(|d| d.target == ActiveTarget::Offscreen(framebuffer)));
    }

    #[test]
    fn test_clear_lands_on_offscreen_target_before_draws() {
        let (mut device, scene, mut renderer) = setup();
        renderer.render_to_panel(&mut device, &scene, PanelSize::new(64, 64));
        let framebuffer = renderer.target().handles().unwrap().framebuffer;

        let commands = device.commands();
        let clear = commands
            .iter()
            .position(|c| matches!(c, DeviceCommand::Clear { target, .. } if *target == ActiveTarget::Offscreen(framebuffer)))
            .unwrap();
        let first_draw = commands
            .iter()
            .position(|c| matches!(c, DeviceCommand::Draw(_)))
            .unwrap();
        assert!(clear < first_draw);
        assert_eq!(
            commands.last(),
            Some(&DeviceCommand::BindTarget(ActiveTarget::Default))
        );
    }

    #[test]
    fn test_unchanged_panel_size_skips_resize() {
        let (mut device, scene, mut renderer) = setup();
        let size = PanelSize::new(320, 200);

        renderer.render_to_panel(&mut device, &scene, size);
        device.clear_commands();
        renderer.render_to_panel(&mut device, &scene, size);

        assert_eq!(allocations(&device), 0);
        assert_eq!(device.draws().count(), 2);
    }

    #[test]
    fn test_panel_resize_reallocates_in_place() {
        let (mut device, scene, mut renderer) = setup();

        let first = renderer
            .render_to_panel(&mut device, &scene, PanelSize::new(800, 600))
            .unwrap();
        let second = renderer
            .render_to_panel(&mut device, &scene, PanelSize::new(400, 300))
            .unwrap();

        assert_eq!(first.texture, second.texture);
        assert_eq!((second.width, second.height), (400, 300));
        assert_eq!(device.texture_size(second.texture), Some((400, 300)));
    }

    #[test]
    fn test_empty_panel_draws_nothing() {
        let (mut device, scene, mut renderer) = setup();

        assert!(renderer
            .render_to_panel(&mut device, &scene, PanelSize::new(0, 300))
            .is_none());

        assert!(device.commands().is_empty());
        assert!(!renderer.target().is_created());
    }

    #[test]
    fn test_collapsed_panel_keeps_target_for_later() {
        let (mut device, scene, mut renderer) = setup();
        let size = PanelSize::new(200, 100);
        renderer.render_to_panel(&mut device, &scene, size);

        renderer.render_to_panel(&mut device, &scene, PanelSize::default());
        device.clear_commands();
        let image = renderer.render_to_panel(&mut device, &scene, size);

        assert!(image.is_some());
        assert_eq!(allocations(&device), 0);
    }

    #[test]
    fn test_oversized_panel_is_skipped() {
        let mut device = HeadlessDevice::new().with_max_dimension(256);
        let scene = Scene::new(&mut device, 1.0);
        let mut renderer = FrameRenderer::new();

        let image = renderer.render_to_panel(&mut device, &scene, PanelSize::new(512, 128));

        assert!(image.is_none());
        assert_eq!(device.draws().count(), 0);
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_direct_mode_draws_to_default() {
        let (mut device, scene, mut renderer) = setup();

        renderer.render_direct(&mut device, &scene, PanelSize::new(1280, 720));

        assert!(device.draws().all(|d| d.target == ActiveTarget::Default));
        assert_eq!(device.draws().count(), 2);
        assert!(!renderer.target().is_created());
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn test_outline_disabled_draws_once() {
        let (mut device, mut scene, mut renderer) = setup();
        scene.outline_enabled = false;

        renderer.render_to_panel(&mut device, &scene, PanelSize::new(64, 64));

        let draws: Vec<_> = device.draws().collect();
        assert_eq!(draws.len(), 1);
        assert!(!draws[0].state.stencil.enabled);
    }

    #[test]
    fn test_release_frees_target() {
        let (mut device, scene, mut renderer) = setup();
        renderer.render_to_panel(&mut device, &scene, PanelSize::new(64, 64));

        renderer.release(&mut device);

        assert_eq!(device.live_resources(), 0);
        assert!(renderer.recorded_size().is_none());
        assert!(renderer
            .render_to_panel(&mut device, &scene, PanelSize::new(64, 64))
            .is_some());
    }

    #[test]
    fn test_failed_resize_skips_stale_image() {
        let (mut device, scene, mut renderer) = setup();
        renderer.render_to_panel(&mut device, &scene, PanelSize::new(64, 64));
        let handles = renderer.target().handles().unwrap();
        device.delete_renderbuffer(handles.depth_stencil);
        device.clear_commands();

        let image = renderer.render_to_panel(&mut device, &scene, PanelSize::new(128, 32));

        assert!(image.is_none());
        assert_eq!(device.draws().count(), 0);
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_incomplete_target_is_skipped() {
        let (mut device, scene, mut renderer) = setup();
        renderer.render_to_panel(&mut device, &scene, PanelSize::new(64, 64));
        let framebuffer = renderer.target().handles().unwrap().framebuffer;
        let bare = device.create_renderbuffer();
        device.attach_depth_stencil(framebuffer, bare).unwrap();
        device.clear_commands();

        let image = renderer.render_to_panel(&mut device, &scene, PanelSize::new(32, 32));

        assert!(image.is_none());
        assert!(!renderer.target().is_complete());
        assert_eq!(device.draws().count(), 0);
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }
}
