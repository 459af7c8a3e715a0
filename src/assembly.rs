// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helical assemblies of identical subunits.

use nalgebra::Vector3;
use ndarray::Array2;

use crate::{
    c64,
    pipeline::{RenderError, RenderPipeline},
    pose::{euler::EulerPose, Pose},
};

/// The lattice parameters of a helical assembly. Subunit `k` of start `s`
/// sits at azimuth `2 pi s / n_start + k * twist` about the z axis,
/// raised by `k * rise`, with `initial_displacement` carried around the
/// axis by the azimuth.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Helix {
    /// Axial shift between consecutive subunits in a start \[Å\]
    pub rise: f64,
    /// Azimuthal step between consecutive subunits in a start \[radians\]
    pub twist: f64,
    /// Number of interleaved strands
    pub n_start: usize,
    /// Number of subunits in each strand
    pub n_subunits_per_start: usize,
    /// Seat of the first subunit relative to the helical axis \[Å\]
    pub initial_displacement: Vector3<f64>,
}

impl Helix {
    pub fn from_radians(
        rise: f64,
        twist: f64,
        n_start: usize,
        n_subunits_per_start: usize,
    ) -> Helix {
        Helix {
            rise,
            twist,
            n_start,
            n_subunits_per_start,
            initial_displacement: Vector3::zeros(),
        }
    }

    pub fn from_degrees(
        rise: f64,
        twist: f64,
        n_start: usize,
        n_subunits_per_start: usize,
    ) -> Helix {
        Helix::from_radians(rise, twist.to_radians(), n_start, n_subunits_per_start)
    }

    /// The pose of every subunit, composed with the pose of the assembly
    /// as a whole. Starts are enumerated in the outer position, so the
    /// list holds exactly `n_start * n_subunits_per_start` entries.
    pub fn subunit_poses(&self, base: &Pose) -> Vec<Pose> {
        let mut seat = EulerPose::from_radians(0.0, 0.0, 0.0);
        seat.offset = self.initial_displacement;
        let seat = Pose::Euler(seat);

        let mut poses = Vec::with_capacity(self.n_start * self.n_subunits_per_start);
        for start in 0..self.n_start {
            let start_azimuth = start as f64 * std::f64::consts::TAU / self.n_start as f64;
            for subunit in 0..self.n_subunits_per_start {
                let mut step =
                    EulerPose::from_radians(start_azimuth + subunit as f64 * self.twist, 0.0, 0.0);
                step.offset = Vector3::new(0.0, 0.0, subunit as f64 * self.rise);
                let local = Pose::Euler(step).compose(&seat);
                poses.push(base.compose(&local));
            }
        }
        poses
    }
}

/// Renders a helical assembly by superposing every subunit's signal.
///
/// The superposition is additive in Fourier space, valid for a thin and
/// weakly scattering specimen. Noise, filters and the mask apply once to
/// the summed signal; noise belongs to the micrograph, not to each
/// subunit.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssemblyPipeline {
    pub pipeline: RenderPipeline,
    pub lattice: Helix,
}

impl AssemblyPipeline {
    /// The pose of every subunit under the specimen's current pose.
    pub fn subunit_poses(&self) -> Vec<Pose> {
        self.lattice.subunit_poses(&self.pipeline.specimen.pose)
    }

    /// Render the whole assembly into one image.
    pub fn render(&self, seed: Option<u64>) -> Result<Array2<f64>, RenderError> {
        let mut total: Array2<c64> = Array2::zeros(self.pipeline.config.padded_shape());
        for pose in self.subunit_poses() {
            total += &self.pipeline.fourier_signal(&pose);
        }
        self.pipeline.finish(total, seed)
    }
}
