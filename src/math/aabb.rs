use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        points.into_iter().fold(None, |acc: Option<AABB>, p| {
            Some(match acc {
                Some(b) => AABB::new(b.min.min(p), b.max.max(p)),
                None => AABB::new(p, p),
            })
        })
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after an affine transform
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let mut out = AABB::new(corners[0], corners[0]);
        for c in &corners[1..] {
            out.min = out.min.min(*c);
            out.max = out.max.max(*c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_aabb_from_points() {
        let aabb = AABB::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_aabb_from_no_points() {
        assert!(AABB::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_aabb_center_negative() {
        let aabb = AABB::new(Vec3::new(-2.0, -4.0, -6.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
    }

    #[test]
    fn test_aabb_extent() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.extent(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_aabb_union_contained() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 5.0, 5.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0));
        let union = aabb1.union(&aabb2);
        assert_eq!(union.min, aabb1.min);
        assert_eq!(union.max, aabb1.max);
    }

    #[test]
    fn test_aabb_transformed_by_scale() {
        let aabb = AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let scaled = aabb.transformed(&Mat4::from_scale(Vec3::splat(2.0)));
        assert_eq!(scaled.extent(), Vec3::splat(2.0));
    }

    #[test]
    fn test_aabb_transformed_by_rotation_grows() {
        let aabb = AABB::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let rotated = aabb.transformed(&Mat4::from_quat(Quat::from_rotation_y(
            std::f32::consts::FRAC_PI_4,
        )));
        // 45 degrees about Y widens the X/Z footprint to the face diagonal
        assert!((rotated.extent().x - 2.0_f32.sqrt()).abs() < 1e-5);
        assert!((rotated.extent().y - 1.0).abs() < 1e-5);
    }
}
