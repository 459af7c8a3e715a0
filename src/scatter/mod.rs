// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projection strategies, one per potential representation.

pub mod gaussian;
pub mod slice;

pub use gaussian::GaussianMixtureMethod;
pub use slice::{Boundary, FourierSliceMethod, Interp};

/// The projection strategies a pipeline renders with. [`crate::Density`]
/// picks the member matching its representation, so callers never branch
/// on it themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScatteringEngine {
    pub fourier_slice: FourierSliceMethod,
    pub gaussian_mixture: GaussianMixtureMethod,
}
