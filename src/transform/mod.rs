//! Transform composition between world space and group-local space.
//!
//! Transforms are kept decomposed as translation, rotation and scale rather
//! than as a matrix, so nesting a group many levels deep never accumulates
//! shear. Composition follows the usual `T · R · S` convention: a child's
//! translation is scaled by the parent's scale, then rotated, then offset.

mod bounds;

pub use bounds::Bounds;
use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Default per-component tolerance for transform comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;

/// A decomposed affine transform (translation, rotation, scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Translation component.
    pub translation: DVec3,
    /// Rotation component (unit quaternion).
    pub rotation: DQuat,
    /// Per-axis scale component.
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Build from all three components.
    #[must_use]
    pub fn from_trs(translation: DVec3, rotation: DQuat, scale: DVec3) -> Self {
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// Decompose an affine matrix. Any shear in `m` is discarded.
    #[must_use]
    pub fn from_mat4(m: &DMat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self::from_trs(translation, rotation, scale)
    }

    /// Recompose into an affine matrix.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(
            self.scale,
            self.rotation,
            self.translation,
        )
    }

    /// `self · child`: place `child` (expressed in this transform's space)
    /// into the space this transform lives in.
    #[must_use]
    pub fn mul_transform(&self, child: &Self) -> Self {
        Self {
            translation: self.translation
                + self.rotation * (self.scale * child.translation),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Express `world` relative to this transform: the exact inverse of
    /// [`Transform::mul_transform`] with `self` as the parent.
    ///
    /// Zero scale components on `self` have no inverse and map to zero.
    #[must_use]
    pub fn relative(&self, world: &Self) -> Self {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = recip_or_zero(self.scale);
        Self {
            translation: inv_scale
                * (inv_rotation * (world.translation - self.translation)),
            rotation: (inv_rotation * world.rotation).normalize(),
            scale: world.scale * inv_scale,
        }
    }

    /// Component-wise comparison. Rotations `q` and `-q` compare equal.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, tolerance: f64) -> bool {
        let other_rotation = if self.rotation.dot(other.rotation) < 0.0 {
            -other.rotation
        } else {
            other.rotation
        };
        self.translation.abs_diff_eq(other.translation, tolerance)
            && self.rotation.abs_diff_eq(other_rotation, tolerance)
            && self.scale.abs_diff_eq(other.scale, tolerance)
    }
}

fn recip_or_zero(v: DVec3) -> DVec3 {
    let r = |c: f64| if c.abs() < f64::EPSILON { 0.0 } else { c.recip() };
    DVec3::new(r(v.x), r(v.y), r(v.z))
}

/// `group_origin⁻¹ · world`.
#[must_use]
pub fn to_local(world: &Transform, group_origin: &Transform) -> Transform {
    group_origin.relative(world)
}

/// `group_origin · local`.
#[must_use]
pub fn to_world(local: &Transform, group_origin: &Transform) -> Transform {
    group_origin.mul_transform(local)
}

/// Origin for a new group built from `worlds` (in selection order).
///
/// A single entity lends its own transform. Several entities yield an
/// unrotated, unscaled origin at the mean of their translations. Returns
/// `None` for an empty selection.
#[must_use]
pub fn group_origin(worlds: &[Transform]) -> Option<Transform> {
    match worlds {
        [] => None,
        [single] => Some(*single),
        many => {
            let sum = many
                .iter()
                .fold(DVec3::ZERO, |acc, t| acc + t.translation);
            Some(Transform::from_translation(sum / many.len() as f64))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_3;

    use super::*;

    fn sample_transforms() -> Vec<Transform> {
        vec![
            Transform::IDENTITY,
            Transform::from_translation(DVec3::new(2.0, -3.5, 10.0)),
            Transform::from_trs(
                DVec3::new(-120.0, 45.25, 3.0),
                DQuat::from_rotation_y(FRAC_PI_3),
                DVec3::new(2.0, 0.5, 1.0),
            ),
            Transform::from_trs(
                DVec3::new(1.0e4, -2.0e3, 7.5),
                DQuat::from_euler(glam::EulerRot::XYZ, 0.3, -1.2, 2.9),
                DVec3::splat(0.01),
            ),
        ]
    }

    #[test]
    fn round_trip_restores_world() {
        let samples = sample_transforms();
        for world in &samples {
            for origin in &samples {
                let local = to_local(world, origin);
                let back = to_world(&local, origin);
                assert!(
                    back.abs_diff_eq(world, DEFAULT_TOLERANCE),
                    "round trip drifted: {world:?} via {origin:?} -> {back:?}"
                );
            }
        }
    }

    #[test]
    fn repeated_nesting_stays_stable() {
        let world = sample_transforms()[2];
        let origin = sample_transforms()[3];
        let mut t = world;
        for _ in 0..1000 {
            t = to_world(&to_local(&t, &origin), &origin);
        }
        assert!(t.abs_diff_eq(&world, DEFAULT_TOLERANCE));
    }

    #[test]
    fn composition_matches_matrix_for_uniform_scale() {
        let parent = Transform::from_trs(
            DVec3::new(1.0, 2.0, 3.0),
            DQuat::from_rotation_z(0.7),
            DVec3::splat(2.0),
        );
        let child = sample_transforms()[2];
        let composed = parent.mul_transform(&child).to_mat4();
        let expected = parent.to_mat4() * child.to_mat4();
        assert!(composed.abs_diff_eq(expected, 1e-9));
    }

    #[test]
    fn mat4_conversion_round_trips() {
        let t = sample_transforms()[2];
        let back = Transform::from_mat4(&t.to_mat4());
        assert!(back.abs_diff_eq(&t, 1e-9));
    }

    #[test]
    fn negated_quaternion_compares_equal() {
        let a = Transform::from_trs(
            DVec3::ZERO,
            DQuat::from_rotation_x(0.4),
            DVec3::ONE,
        );
        let b = Transform {
            rotation: -a.rotation,
            ..a
        };
        assert!(a.abs_diff_eq(&b, 1e-12));
    }

    #[test]
    fn origin_is_centroid_of_translations() {
        let worlds = [
            Transform::from_translation(DVec3::ZERO),
            Transform::from_trs(
                DVec3::new(2.0, 0.0, 0.0),
                DQuat::from_rotation_y(1.0),
                DVec3::splat(3.0),
            ),
        ];
        let origin = group_origin(&worlds).unwrap();
        assert!(origin.abs_diff_eq(
            &Transform::from_translation(DVec3::new(1.0, 0.0, 0.0)),
            1e-12
        ));
    }

    #[test]
    fn single_entity_lends_its_transform() {
        let t = sample_transforms()[2];
        assert_eq!(group_origin(&[t]), Some(t));
    }

    #[test]
    fn empty_selection_has_no_origin() {
        assert_eq!(group_origin(&[]), None);
    }

    #[test]
    fn zero_scale_origin_does_not_produce_nan() {
        let origin = Transform {
            scale: DVec3::new(0.0, 1.0, 1.0),
            ..Transform::IDENTITY
        };
        let local = to_local(&sample_transforms()[1], &origin);
        assert!(local.translation.is_finite());
        assert!(local.scale.is_finite());
    }
}
