// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orientations parameterised by intrinsic ZYZ Euler angles.

use nalgebra::{Rotation3, Vector3};

use super::quat::QuatPose;

/// An orientation as intrinsic ZYZ Euler angles: a spin `alpha` about z,
/// a tilt `beta` about the intermediate y, then a spin `gamma` about the
/// new z. All angles are in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EulerPose {
    /// First spin about z \[radians\]
    pub alpha: f64,
    /// Tilt about the intermediate y \[radians\]
    pub beta: f64,
    /// Final spin about the new z \[radians\]
    pub gamma: f64,
    /// Offset applied after the rotation \[Å\]
    pub offset: Vector3<f64>,
}

impl EulerPose {
    /// Make a new [`EulerPose`] from angles in radians, with no offset.
    pub fn from_radians(alpha: f64, beta: f64, gamma: f64) -> EulerPose {
        EulerPose {
            alpha,
            beta,
            gamma,
            offset: Vector3::zeros(),
        }
    }

    /// Make a new [`EulerPose`] from angles in degrees, with no offset.
    pub fn from_degrees(alpha: f64, beta: f64, gamma: f64) -> EulerPose {
        EulerPose::from_radians(alpha.to_radians(), beta.to_radians(), gamma.to_radians())
    }

    /// The rotation matrix `Rz(alpha) Ry(beta) Rz(gamma)`.
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::z_axis(), self.alpha)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.beta)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.gamma)
    }

    /// Re-parameterise as a quaternion pose.
    pub fn to_quat(&self) -> QuatPose {
        QuatPose {
            rotation: nalgebra::UnitQuaternion::from_rotation_matrix(&self.rotation()),
            offset: self.offset,
        }
    }
}

impl Default for EulerPose {
    fn default() -> EulerPose {
        EulerPose::from_radians(0.0, 0.0, 0.0)
    }
}

#[cfg(any(test, feature = "approx"))]
impl approx::AbsDiffEq for EulerPose {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.alpha, &other.alpha, epsilon)
            && f64::abs_diff_eq(&self.beta, &other.beta, epsilon)
            && f64::abs_diff_eq(&self.gamma, &other.gamma, epsilon)
            && self.offset.abs_diff_eq(&other.offset, epsilon)
    }
}
