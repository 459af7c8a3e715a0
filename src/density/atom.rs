// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering potentials as mixtures of isotropic Gaussians.

use nalgebra::Vector3;

use super::DensityError;
use crate::constants::FORM_FACTORS;

/// A point-cloud scattering potential. Component `i` contributes
/// `weights[i] * exp(-|r - positions[i]|^2 / (2 variances[i]))` to the
/// density, with positions in the object frame \[Å\] and variances \[Å^2\].
/// Each component also carries an identity tag, conventionally the atomic
/// number, which groups components that share a physical species.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomCloud {
    positions: Vec<Vector3<f64>>,
    weights: Vec<f64>,
    variances: Vec<f64>,
    identities: Vec<u32>,
}

impl AtomCloud {
    /// Validate and construct with every identity tag set to 0. The three
    /// arrays must have equal lengths, the weights must be finite and the
    /// variances positive and finite.
    pub fn new(
        positions: Vec<Vector3<f64>>,
        weights: Vec<f64>,
        variances: Vec<f64>,
    ) -> Result<AtomCloud, DensityError> {
        let identities = vec![0; positions.len()];
        AtomCloud::with_identities(positions, weights, variances, identities)
    }

    /// Validate and construct with explicit identity tags.
    pub fn with_identities(
        positions: Vec<Vector3<f64>>,
        weights: Vec<f64>,
        variances: Vec<f64>,
        identities: Vec<u32>,
    ) -> Result<AtomCloud, DensityError> {
        if positions.len() != weights.len()
            || positions.len() != variances.len()
            || positions.len() != identities.len()
        {
            return Err(DensityError::MismatchedAtomArrays {
                positions: positions.len(),
                weights: weights.len(),
                variances: variances.len(),
                identities: identities.len(),
            });
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() {
                return Err(DensityError::BadWeight { index, value });
            }
        }
        for (index, &value) in variances.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(DensityError::BadVariance { index, value });
            }
        }
        Ok(AtomCloud {
            positions,
            weights,
            variances,
            identities,
        })
    }

    /// Build a cloud from atomic positions and element symbols, expanding
    /// each atom into the five Gaussian components of its tabulated
    /// scattering factor. Components are tagged with the element's atomic
    /// number.
    ///
    /// A factor term `a exp(-b s^2)` with `s = |f| / 2` matches a real-space
    /// Gaussian of variance `b / (8 pi^2)` and peak weight
    /// `a / (2 pi v)^(3/2)`.
    pub fn from_elements(
        positions: &[Vector3<f64>],
        elements: &[&str],
    ) -> Result<AtomCloud, DensityError> {
        if positions.len() != elements.len() {
            return Err(DensityError::MismatchedAtomArrays {
                positions: positions.len(),
                weights: elements.len(),
                variances: elements.len(),
                identities: elements.len(),
            });
        }
        let mut expanded_positions = Vec::with_capacity(5 * positions.len());
        let mut weights = Vec::with_capacity(5 * positions.len());
        let mut variances = Vec::with_capacity(5 * positions.len());
        let mut identities = Vec::with_capacity(5 * positions.len());
        for (&position, &element) in positions.iter().zip(elements.iter()) {
            let factor = FORM_FACTORS
                .get(element)
                .ok_or_else(|| DensityError::UnknownElement(element.to_string()))?;
            for (&a, &b) in factor.a.iter().zip(factor.b.iter()) {
                let variance = b / (8.0 * std::f64::consts::PI.powi(2));
                let weight = a / (std::f64::consts::TAU * variance).powf(1.5);
                expanded_positions.push(position);
                weights.push(weight);
                variances.push(variance);
                identities.push(factor.z);
            }
        }
        AtomCloud::with_identities(expanded_positions, weights, variances, identities)
    }

    /// The number of Gaussian components.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Component centres in the object frame \[Å\]
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    /// Component amplitudes.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Component variances \[Å^2\]
    pub fn variances(&self) -> &[f64] {
        &self.variances
    }

    /// Component identity tags.
    pub fn identities(&self) -> &[u32] {
        &self.identities
    }
}
