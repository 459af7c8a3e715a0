// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Core code to simulate cryo-EM images: scattering potentials, poses,
//! contrast transfer optics, noise models and likelihood evaluation.

#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

pub mod assembly;
pub mod config;
pub mod constants;
pub mod density;
pub mod exposure;
pub mod fft;
pub mod grid;
pub mod noise;
pub mod operators;
pub mod optics;
pub mod pipeline;
pub mod pose;
pub mod scatter;

// Re-exports.
pub use assembly::{AssemblyPipeline, Helix};
pub use config::ImageConfig;
pub use density::{
    atom::AtomCloud,
    voxel::FourierVolume,
    Density,
};
pub use exposure::Exposure;
pub use noise::{
    detector::DetectorNoise,
    ice::SolventNoise,
    spectrum::RadialSpectrum,
};
pub use operators::{
    filter::{CustomFilter, FrequencyFilter, LowpassFilter, WhiteningFilter},
    mask::{CircularMask, CustomMask, Mask},
};
pub use optics::Ctf;
pub use pipeline::{Instrument, RenderPipeline, Specimen, TunableParameters};
pub use pose::{euler::EulerPose, quat::QuatPose, Pose};
pub use scatter::{Boundary, FourierSliceMethod, GaussianMixtureMethod, Interp, ScatteringEngine};

pub use nalgebra;
pub use ndarray;
pub use num_complex;
pub use num_complex::Complex;
pub use num_traits;
pub use rayon;

#[cfg(test)]
#[test]
fn rustfft_works_as_expected() {
    use rustfft::FftPlanner;

    // A pure tone lands in a single output bin, and rustfft leaves the
    // forward transform unnormalised.
    let n = 8;
    let mut signal: Vec<c64> = (0..n)
        .map(|i| c64::new((std::f64::consts::TAU * i as f64 / n as f64).cos(), 0.0))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut signal);
    approx::assert_abs_diff_eq!(signal[1].re, n as f64 / 2.0, epsilon = 1e-10);
    approx::assert_abs_diff_eq!(signal[2].norm(), 0.0, epsilon = 1e-10);
}
