// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Representations of a specimen's scattering potential.

pub mod atom;
pub mod voxel;

use ndarray::Array2;
use thiserror::Error;

use crate::{c64, config::ImageConfig, pose::Pose, scatter::ScatteringEngine};
use atom::AtomCloud;
use voxel::FourierVolume;

/// A scattering potential in one of the supported representations. All
/// validation happens when a representation is constructed, so projecting
/// cannot fail.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Density {
    Voxels(FourierVolume),
    Atoms(AtomCloud),
}

impl Density {
    /// Project the posed potential along the instrument z axis, returning
    /// the Fourier transform of the projection on the padded image grid.
    /// The engine supplies the strategy matching each representation.
    pub fn project(
        &self,
        pose: &Pose,
        engine: &ScatteringEngine,
        config: &ImageConfig,
    ) -> Array2<c64> {
        match self {
            Density::Voxels(volume) => engine.fourier_slice.extract(volume, pose, config),
            Density::Atoms(atoms) => engine.gaussian_mixture.project(atoms, pose, config),
        }
    }
}

impl From<FourierVolume> for Density {
    fn from(volume: FourierVolume) -> Density {
        Density::Voxels(volume)
    }
}

impl From<AtomCloud> for Density {
    fn from(atoms: AtomCloud) -> Density {
        Density::Atoms(atoms)
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when constructing scattering potentials.
pub enum DensityError {
    #[error("volume dimensions must all be non-zero; got ({nz}, {ny}, {nx})")]
    EmptyVolume { nz: usize, ny: usize, nx: usize },

    #[error("voxel size must be positive and finite; got {0}")]
    BadVoxelSize(f64),

    #[error("pad scale must be finite and at least 1; got {0}")]
    BadPadScale(f64),

    #[error(
        "atom arrays must have equal lengths; got {positions} positions, {weights} weights, {variances} variances, {identities} identities"
    )]
    MismatchedAtomArrays {
        positions: usize,
        weights: usize,
        variances: usize,
        identities: usize,
    },

    #[error("atom weight {index} must be finite; got {value}")]
    BadWeight { index: usize, value: f64 },

    #[error("atom variance {index} must be positive and finite; got {value}")]
    BadVariance { index: usize, value: f64 },

    #[error("no scattering factor is tabulated for element {0:?}")]
    UnknownElement(String),
}
