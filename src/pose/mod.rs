// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rigid specimen orientations and their action on coordinates.
//!
//! A pose maps the object frame to the instrument frame: first the rotation,
//! then the offset. The instrument z axis is the projection direction, so
//! the z component of an offset never changes a simulated image.

pub mod euler;
pub mod quat;

use nalgebra::{Rotation3, Vector2, Vector3};
use ndarray::Array2;
use thiserror::Error;

use crate::c64;
use euler::EulerPose;
use quat::QuatPose;

/// A rigid orientation in one of the supported parameterisations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pose {
    Euler(EulerPose),
    Quat(QuatPose),
}

impl Pose {
    /// The identity orientation, with no offset.
    pub fn identity() -> Pose {
        Pose::Euler(EulerPose::from_radians(0.0, 0.0, 0.0))
    }

    /// The object-to-instrument rotation.
    pub fn rotation(&self) -> Rotation3<f64> {
        match self {
            Pose::Euler(e) => e.rotation(),
            Pose::Quat(q) => q.rotation.to_rotation_matrix(),
        }
    }

    /// The offset applied after the rotation \[Å\]
    pub fn offset(&self) -> Vector3<f64> {
        match self {
            Pose::Euler(e) => e.offset,
            Pose::Quat(q) => q.offset,
        }
    }

    /// Apply the pose to object-frame points: `R p + t`.
    pub fn transform_points(&self, points: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let rotation = self.rotation();
        let offset = self.offset();
        points.iter().map(|p| rotation * p + offset).collect()
    }

    /// The Fourier-space phase ramp carrying the in-plane part of the
    /// offset, `exp(-2 pi i (f_x t_x + f_y t_y))`, over an image frequency
    /// grid.
    pub fn translation_phase(&self, freqs: &Array2<Vector2<f64>>) -> Array2<c64> {
        let offset = self.offset();
        freqs.mapv(|f| c64::cis(-std::f64::consts::TAU * (f.x * offset.x + f.y * offset.y)))
    }

    /// Compose with another pose applied before this one. The result
    /// rotates by `self * inner` and offsets by `t_self + R_self t_inner`.
    pub fn compose(&self, inner: &Pose) -> Pose {
        let outer_q = self.to_quat();
        let inner_q = inner.to_quat();
        Pose::Quat(QuatPose {
            rotation: outer_q.rotation * inner_q.rotation,
            offset: outer_q.offset + outer_q.rotation * inner_q.offset,
        })
    }

    /// Re-parameterise as a quaternion pose.
    pub fn to_quat(&self) -> QuatPose {
        match self {
            Pose::Euler(e) => e.to_quat(),
            Pose::Quat(q) => *q,
        }
    }

    /// Re-parameterise as Euler angles. At gimbal lock (beta of 0 or pi)
    /// the decomposition is not unique; gamma is reported as 0.
    pub fn to_euler(&self) -> EulerPose {
        match self {
            Pose::Euler(e) => *e,
            Pose::Quat(q) => q.to_euler(),
        }
    }
}

impl Default for Pose {
    fn default() -> Pose {
        Pose::identity()
    }
}

impl From<EulerPose> for Pose {
    fn from(e: EulerPose) -> Pose {
        Pose::Euler(e)
    }
}

impl From<QuatPose> for Pose {
    fn from(q: QuatPose) -> Pose {
        Pose::Quat(q)
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when constructing orientations.
pub enum PoseError {
    #[error("quaternion norm {0} is too small to describe a rotation")]
    DegenerateRotation(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn assert_rotations_eq(a: &Rotation3<f64>, b: &Rotation3<f64>, epsilon: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(a.matrix()[(i, j)], b.matrix()[(i, j)], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn identity_leaves_points_alone() {
        let points = vec![Vector3::new(1.0, -2.0, 3.0)];
        let moved = Pose::identity().transform_points(&points);
        assert_abs_diff_eq!(moved[0], points[0], epsilon = 1e-15);
    }

    #[test]
    fn translation_phase_ignores_z_offset() {
        let mut pose = EulerPose::from_radians(0.0, 0.0, 0.0);
        pose.offset = Vector3::new(0.0, 0.0, 250.0);
        let freqs = array![[Vector2::new(0.25, -0.1)]];
        let phase = Pose::from(pose).translation_phase(&freqs);
        assert_abs_diff_eq!(phase[[0, 0]].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[[0, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn translation_phase_of_half_period_shift_negates() {
        let mut pose = EulerPose::from_radians(0.0, 0.0, 0.0);
        pose.offset = Vector3::new(2.0, 0.0, 0.0);
        let freqs = array![[Vector2::new(0.25, 0.0)]];
        let phase = Pose::from(pose).translation_phase(&freqs);
        assert_abs_diff_eq!(phase[[0, 0]].re, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[[0, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn composition_matches_matrix_product() {
        let mut outer = EulerPose::from_degrees(40.0, 25.0, -60.0);
        outer.offset = Vector3::new(1.0, 2.0, 3.0);
        let mut inner = EulerPose::from_degrees(-15.0, 70.0, 10.0);
        inner.offset = Vector3::new(-4.0, 0.5, 2.0);
        let (outer, inner) = (Pose::from(outer), Pose::from(inner));

        let composed = outer.compose(&inner);
        assert_rotations_eq(
            &composed.rotation(),
            &(outer.rotation() * inner.rotation()),
            1e-12,
        );
        assert_abs_diff_eq!(
            composed.offset(),
            outer.offset() + outer.rotation() * inner.offset(),
            epsilon = 1e-12
        );

        // Applying the composed pose to a point matches applying the two
        // poses in sequence.
        let p = vec![Vector3::new(0.3, -1.2, 2.5)];
        let sequential = outer.transform_points(&inner.transform_points(&p));
        let direct = composed.transform_points(&p);
        assert_abs_diff_eq!(sequential[0], direct[0], epsilon = 1e-12);
    }

    #[test]
    fn two_axial_spins_add_their_angles() {
        let a = Pose::from(EulerPose::from_degrees(30.0, 0.0, 0.0));
        let b = Pose::from(EulerPose::from_degrees(45.0, 0.0, 0.0));
        let composed = a.compose(&b);
        let expected = Pose::from(EulerPose::from_degrees(75.0, 0.0, 0.0));
        assert_rotations_eq(&composed.rotation(), &expected.rotation(), 1e-12);
    }

    #[test]
    fn euler_round_trips_through_quaternion() {
        let pose = EulerPose::from_degrees(123.0, 67.0, -31.0);
        let back = Pose::from(pose).to_quat().to_euler();
        assert_abs_diff_eq!(back.alpha, pose.alpha, epsilon = 1e-12);
        assert_abs_diff_eq!(back.beta, pose.beta, epsilon = 1e-12);
        assert_abs_diff_eq!(back.gamma, pose.gamma, epsilon = 1e-12);
    }

    #[test]
    fn gimbal_lock_collapses_onto_alpha() {
        let pose = EulerPose::from_degrees(20.0, 0.0, 30.0);
        let back = Pose::from(pose).to_quat().to_euler();
        assert_abs_diff_eq!(back.gamma, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back.alpha, 50.0_f64.to_radians(), epsilon = 1e-9);
        assert_rotations_eq(
            &back.rotation(),
            &Pose::from(pose).rotation(),
            1e-12,
        );
    }
}
