// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orientations parameterised by unit quaternions.

use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

use super::{euler::EulerPose, PoseError};

/// Quaternion norms below this cannot be normalised meaningfully.
const MIN_QUATERNION_NORM: f64 = 1e-8;

/// An orientation as a unit quaternion. Unlike Euler angles this
/// parameterisation is free of gimbal lock, at the cost of a double cover:
/// `q` and `-q` describe the same rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuatPose {
    /// The object-to-instrument rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Offset applied after the rotation \[Å\]
    pub offset: Vector3<f64>,
}

impl QuatPose {
    /// Make a new [`QuatPose`] from quaternion components in scalar-first
    /// order, normalising to unit length. Components with a norm below
    /// `1e-8` are rejected rather than blown up.
    pub fn from_wxyz(w: f64, x: f64, y: f64, z: f64) -> Result<QuatPose, PoseError> {
        let q = Quaternion::new(w, x, y, z);
        let norm = q.norm();
        if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
            return Err(PoseError::DegenerateRotation(norm));
        }
        Ok(QuatPose {
            rotation: UnitQuaternion::from_quaternion(q),
            offset: Vector3::zeros(),
        })
    }

    /// Make a new [`QuatPose`] spinning by `angle` \[radians\] about `axis`,
    /// with no offset.
    pub fn from_axis_angle(axis: &Unit<Vector3<f64>>, angle: f64) -> QuatPose {
        QuatPose {
            rotation: UnitQuaternion::from_axis_angle(axis, angle),
            offset: Vector3::zeros(),
        }
    }

    /// Re-parameterise as intrinsic ZYZ Euler angles. At gimbal lock (beta
    /// of 0 or pi) the split between the two z spins is not unique; gamma
    /// is reported as 0.
    pub fn to_euler(&self) -> EulerPose {
        let r = self.rotation.to_rotation_matrix();
        let m = r.matrix();
        let sin_beta = (m[(0, 2)].powi(2) + m[(1, 2)].powi(2)).sqrt();
        let beta = sin_beta.atan2(m[(2, 2)]);
        let (alpha, gamma) = if sin_beta > 1e-9 {
            (
                m[(1, 2)].atan2(m[(0, 2)]),
                m[(2, 1)].atan2(-m[(2, 0)]),
            )
        } else if m[(2, 2)] > 0.0 {
            (m[(1, 0)].atan2(m[(0, 0)]), 0.0)
        } else {
            ((-m[(1, 0)]).atan2(m[(1, 1)]), 0.0)
        };
        EulerPose {
            alpha,
            beta,
            gamma,
            offset: self.offset,
        }
    }
}

impl Default for QuatPose {
    fn default() -> QuatPose {
        QuatPose {
            rotation: UnitQuaternion::identity(),
            offset: Vector3::zeros(),
        }
    }
}

// Compares the rotations themselves, so the two covers of a rotation are
// equal.
#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for QuatPose {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        let a = self.rotation.to_rotation_matrix();
        let b = other.rotation.to_rotation_matrix();
        a.matrix().abs_diff_eq(b.matrix(), epsilon) && self.offset.abs_diff_eq(&other.offset, epsilon)
    }
}
