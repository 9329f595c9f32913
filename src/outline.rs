//! Two-pass stencil outline.
//!
//! Pass one draws the mesh and stamps stencil value 1 wherever it passes the
//! depth test. Pass two draws a scaled copy only where the stencil is not 1,
//! so the copy shows as a fringe around the object and never over it.

use glam::{Mat4, Quat, Vec3};

use crate::gfx::{CompareFunc, DrawState, DrawUniforms, GraphicsDevice, StencilConfig, StencilOp};
use crate::mesh::UploadedMesh;

/// Silhouette scale used by the default scene
pub const DEFAULT_SILHOUETTE_SCALE: f32 = 1.1;

const STENCIL_MARK: u32 = 1;
const FLAG_BASE: f32 = 0.0;
const FLAG_OUTLINE: f32 = 1.0;

/// Position, orientation and scale of one mesh instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Same translation and rotation, scale multiplied by `factor`
    pub fn scaled_by(&self, factor: f32) -> Self {
        Self {
            scale: self.scale * factor,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineStage {
    /// Base object drawn, stencil stamped
    StencilWrite,
    /// Silhouette drawn where the stamp is absent
    StencilTest,
}

impl OutlineStage {
    /// Draw state for this stage, derived from the state in effect before the pass
    pub fn draw_state(self, entry: DrawState) -> DrawState {
        let stencil = match self {
            OutlineStage::StencilWrite => StencilConfig {
                enabled: true,
                compare: CompareFunc::Always,
                reference: STENCIL_MARK,
                read_mask: 0xFF,
                write_mask: 0xFF,
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Keep,
                pass_op: StencilOp::Replace,
            },
            OutlineStage::StencilTest => StencilConfig {
                enabled: true,
                compare: CompareFunc::NotEqual,
                reference: STENCIL_MARK,
                read_mask: 0xFF,
                write_mask: 0x00,
                fail_op: StencilOp::Keep,
                depth_fail_op: StencilOp::Keep,
                pass_op: StencilOp::Replace,
            },
        };
        DrawState {
            depth_test: entry.depth_test,
            stencil,
        }
    }

    pub fn flag(self) -> f32 {
        match self {
            OutlineStage::StencilWrite => FLAG_BASE,
            OutlineStage::StencilTest => FLAG_OUTLINE,
        }
    }
}

/// Model-view-projection matrices for the base draw and the silhouette draw
pub fn silhouette_mvps(
    base: &Transform,
    silhouette_scale: f32,
    view_projection: Mat4,
) -> (Mat4, Mat4) {
    (
        view_projection * base.matrix(),
        view_projection * base.scaled_by(silhouette_scale).matrix(),
    )
}

/// Stateless orchestrator for the outline draw sequence.
///
/// All stencil configuration is set and torn down inside one call; the draw
/// state found on entry is restored on exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutlinePass;

impl OutlinePass {
    pub fn new() -> Self {
        Self
    }

    /// Draws `mesh` and a silhouette scaled by `silhouette_scale` around it.
    ///
    /// A scale at or below 1.0 yields no visible outline; that is left to the caller.
    pub fn draw_with_outline<D>(
        &self,
        device: &mut D,
        mesh: &UploadedMesh,
        base: &Transform,
        silhouette_scale: f32,
        view_projection: Mat4,
    ) where
        D: GraphicsDevice + ?Sized,
    {
        let entry = device.draw_state();
        let (base_mvp, silhouette_mvp) = silhouette_mvps(base, silhouette_scale, view_projection);

        for (stage, mvp) in [
            (OutlineStage::StencilWrite, base_mvp),
            (OutlineStage::StencilTest, silhouette_mvp),
        ] {
            log::trace!("outline stage {stage:?}");
            device.set_draw_state(stage.draw_state(entry));
            device.draw_indexed(
                mesh.handle,
                mesh.index_count,
                &DrawUniforms {
                    model_view_proj: mvp,
                    is_outline: stage.flag(),
                },
            );
        }

        device.set_draw_state(entry);
    }

    /// Draws `mesh` once with no outline under the current draw state
    pub fn draw_plain<D>(
        &self,
        device: &mut D,
        mesh: &UploadedMesh,
        base: &Transform,
        view_projection: Mat4,
    ) where
        D: GraphicsDevice + ?Sized,
    {
        device.draw_indexed(
            mesh.handle,
            mesh.index_count,
            &DrawUniforms {
                model_view_proj: view_projection * base.matrix(),
                is_outline: FLAG_BASE,
            },
        );
    }
}
