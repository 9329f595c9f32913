use enginish::gfx::{ActiveTarget, DeviceCommand, FramebufferStatus, GraphicsDevice, HeadlessDevice};
use enginish::{DeviceError, RenderTarget, RenderTargetError, SizeChange};

#[cfg(test)]
mod render_target_tests {
    use super::*;

    fn storage_commands(device: &HeadlessDevice) -> usize {
        device
            .commands()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DeviceCommand::TextureStorage { .. } | DeviceCommand::RenderbufferStorage { .. }
                )
            })
            .count()
    }

    #[test]
    fn test_resize_lifecycle_keeps_handles() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();

        assert_eq!(target.ensure_sized(&mut device, 800, 600), Ok(SizeChange::Created));
        let created = target.handles().unwrap();

        assert_eq!(target.ensure_sized(&mut device, 400, 300), Ok(SizeChange::Resized));
        assert_eq!(target.handles(), Some(created));
        assert_eq!(device.texture_size(created.color), Some((400, 300)));
        assert_eq!(device.renderbuffer_size(created.depth_stencil), Some((400, 300)));
        assert_eq!(device.framebuffer_status(created.framebuffer), FramebufferStatus::Complete);

        device.clear_commands();
        assert_eq!(target.ensure_sized(&mut device, 400, 300), Ok(SizeChange::Unchanged));
        assert!(device.commands().is_empty());
        assert_eq!(target.size(), (400, 300));
    }

    #[test]
    fn test_release_then_recreate_issues_fresh_handles() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();

        target.ensure_sized(&mut device, 800, 600).unwrap();
        target.ensure_sized(&mut device, 400, 300).unwrap();
        let old = target.handles().unwrap();

        target.release(&mut device);
        assert!(!target.is_created());
        assert_eq!(target.size(), (0, 0));
        assert!(!device.contains_framebuffer(old.framebuffer));
        assert!(!device.contains_texture(old.color));
        assert!(!device.contains_renderbuffer(old.depth_stencil));
        assert_eq!(device.live_resources(), 0);

        assert_eq!(target.ensure_sized(&mut device, 400, 300), Ok(SizeChange::Created));
        let new = target.handles().unwrap();
        assert_ne!(new.framebuffer, old.framebuffer);
        assert_ne!(new.color, old.color);
        assert_ne!(new.depth_stencil, old.depth_stencil);
        assert!(target.is_complete());
    }

    #[test]
    fn test_both_storages_reallocated_on_resize() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 64, 64).unwrap();

        device.clear_commands();
        target.ensure_sized(&mut device, 128, 32).unwrap();

        assert_eq!(storage_commands(&device), 2);
        assert!(!device
            .commands()
            .iter()
            .any(|c| matches!(c, DeviceCommand::CreateFramebuffer(_) | DeviceCommand::CreateTexture(_))));
    }

    #[test]
    fn test_oversized_request_rejected_before_allocation() {
        let mut device = HeadlessDevice::new().with_max_dimension(1024);
        let mut target = RenderTarget::new();

        let err = target.ensure_sized(&mut device, 2048, 100).unwrap_err();

        assert_eq!(
            err,
            RenderTargetError::TooLarge {
                width: 2048,
                height: 100,
                limit: 1024
            }
        );
        assert!(device.commands().is_empty());
        assert!(!target.is_created());
    }

    #[test]
    fn test_oversized_resize_keeps_previous_storage() {
        let mut device = HeadlessDevice::new().with_max_dimension(1024);
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 512, 512).unwrap();
        let handles = target.handles().unwrap();

        assert!(target.ensure_sized(&mut device, 4096, 512).is_err());

        assert_eq!(target.size(), (512, 512));
        assert_eq!(device.texture_size(handles.color), Some((512, 512)));
        assert!(target.is_complete());
    }

    #[test]
    fn test_ensure_sized_restores_caller_target() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        let mut other = RenderTarget::new();
        other.ensure_sized(&mut device, 32, 32).unwrap();
        other.bind(&mut device).unwrap();
        let bound = device.active_target();

        target.ensure_sized(&mut device, 100, 100).unwrap();
        assert_eq!(device.active_target(), bound);

        target.ensure_sized(&mut device, 50, 50).unwrap();
        assert_eq!(device.active_target(), bound);

        other.unbind(&mut device);
        target.ensure_sized(&mut device, 60, 60).unwrap();
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 16, 16).unwrap();
        let framebuffer = target.handles().unwrap().framebuffer;

        target.bind(&mut device).unwrap();
        assert_eq!(device.active_target(), ActiveTarget::Offscreen(framebuffer));

        target.unbind(&mut device);
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_release_while_bound_falls_back_to_default() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 16, 16).unwrap();
        target.bind(&mut device).unwrap();

        target.release(&mut device);

        assert_eq!(device.active_target(), ActiveTarget::Default);
        assert_eq!(target.bind(&mut device), Err(RenderTargetError::NotCreated));
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 16, 16).unwrap();

        target.release(&mut device);
        device.clear_commands();
        target.release(&mut device);

        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_failed_resize_marks_target_incomplete() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 64, 64).unwrap();
        let handles = target.handles().unwrap();
        device.delete_renderbuffer(handles.depth_stencil);

        let err = target.ensure_sized(&mut device, 128, 32).unwrap_err();

        assert_eq!(err, RenderTargetError::Device(DeviceError::UnknownHandle("renderbuffer")));
        assert_eq!(target.size(), (64, 64));
        assert!(!target.is_complete());
        assert_eq!(target.status(), Some(FramebufferStatus::MissingAttachment));
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_unallocated_attachment_reports_incomplete() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 64, 64).unwrap();
        let framebuffer = target.handles().unwrap().framebuffer;
        let bare = device.create_renderbuffer();
        device.attach_depth_stencil(framebuffer, bare).unwrap();

        assert_eq!(
            target.ensure_sized(&mut device, 32, 32),
            Err(RenderTargetError::Incomplete(FramebufferStatus::IncompleteAttachment))
        );
        assert!(!target.is_complete());
        assert_eq!(target.size(), (32, 32));

        assert_eq!(
            target.ensure_sized(&mut device, 32, 32),
            Err(RenderTargetError::Incomplete(FramebufferStatus::IncompleteAttachment))
        );
        assert_eq!(device.active_target(), ActiveTarget::Default);
    }

    #[test]
    fn test_same_size_request_rechecks_device_status() {
        let mut device = HeadlessDevice::new();
        let mut target = RenderTarget::new();
        target.ensure_sized(&mut device, 64, 64).unwrap();
        device.delete_texture(target.color_texture().unwrap());

        assert_eq!(
            target.ensure_sized(&mut device, 64, 64),
            Err(RenderTargetError::Incomplete(FramebufferStatus::MissingAttachment))
        );
        assert!(!target.is_complete());
    }
}
