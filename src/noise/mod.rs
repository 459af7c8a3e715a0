// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seeded stochastic models: solvent scattering and detector noise.
//!
//! Every draw is parameterised by an explicit `u64` seed, so a given seed
//! always reproduces the same field bit for bit, serial or parallel.

pub mod detector;
pub mod ice;
pub mod spectrum;

use ndarray::Array2;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use thiserror::Error;

use crate::{c64, fft, grid};
use spectrum::RadialSpectrum;

/// Derive an independent seed for a numbered stream of a parent seed,
/// using the splitmix64 finaliser.
pub fn split_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream
        .wrapping_add(1)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw a Fourier-space Gaussian field shaped by a radial profile.
///
/// A real white standard-normal image is drawn from the seed, transformed,
/// and each bin scaled by the square root of the profile. The result is
/// Hermitian-symmetric, so adding it to a signal spectrum perturbs only
/// the real part of the final image.
pub(crate) fn shaped_noise(
    spectrum: &RadialSpectrum,
    seed: u64,
    shape: (usize, usize),
    pixel_size: f64,
) -> Array2<c64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let white = Array2::from_shape_fn(shape, |_| {
        let draw: f64 = StandardNormal.sample(&mut rng);
        c64::new(draw, 0.0)
    });
    let mut field = fft::fft_2d(&white);
    let freqs = grid::frequency_grid(shape, pixel_size);
    ndarray::Zip::from(&mut field).and(&freqs).for_each(|v, f| {
        *v *= spectrum.variance_at(f.norm()).sqrt();
    });
    field
}

#[derive(Error, Debug)]
/// All the errors that can occur when describing noise models.
pub enum NoiseError {
    #[error("noise variance must be non-negative and finite; got {0}")]
    BadVariance(f64),

    #[error("spectrum amplitude must be non-negative and finite; got {0}")]
    BadAmplitude(f64),

    #[error("spectrum decay must be positive and finite; got {0} cycles/Å")]
    BadDecay(f64),
}
