// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projection of voxel-grid potentials by central-slice extraction.
//!
//! The Fourier transform of a projection along z is the plane through the
//! origin of the volume's Fourier transform perpendicular to z. Projecting
//! a rotated volume therefore amounts to sampling the stored spectrum on a
//! rotated plane.

use nalgebra::Vector3;
use ndarray::{Array2, Array3};

use crate::{c64, config::ImageConfig, density::voxel::FourierVolume, grid, pose::Pose};

/// How to interpolate the spectrum between voxel-grid samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interp {
    /// Take the nearest sample.
    Nearest,
    /// Blend the eight surrounding samples.
    #[default]
    Linear,
}

/// What to do with plane points that fall outside the stored spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Boundary {
    /// Use a constant value.
    Fill(c64),
    /// Index the spectrum periodically.
    Wrap,
}

impl Default for Boundary {
    fn default() -> Boundary {
        Boundary::Fill(c64::new(0.0, 0.0))
    }
}

/// Central-slice projection with a choice of interpolation and boundary
/// handling.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FourierSliceMethod {
    pub interpolation: Interp,
    pub boundary: Boundary,
}

impl FourierSliceMethod {
    /// Sample the central slice perpendicular to the instrument z axis,
    /// returning the Fourier transform of the posed projection on the
    /// padded image grid, in standard frequency order.
    pub fn extract(
        &self,
        volume: &FourierVolume,
        pose: &Pose,
        config: &ImageConfig,
    ) -> Array2<c64> {
        let freqs = grid::frequency_grid(config.padded_shape(), config.pixel_size());
        // Image frequencies map into the volume frame through the inverse
        // rotation.
        let inverse = pose.rotation().inverse();
        let step = volume.frequency_step();
        let centre = (volume.side() / 2) as f64;
        let data = volume.data();

        let mut slice = freqs.mapv(|f| {
            let q = inverse * Vector3::new(f.x, f.y, 0.0);
            let (u, v, w) = (
                q.x / step + centre,
                q.y / step + centre,
                q.z / step + centre,
            );
            match self.interpolation {
                Interp::Nearest => {
                    self.sample(data, w.round() as isize, v.round() as isize, u.round() as isize)
                }
                Interp::Linear => self.trilinear(data, w, v, u),
            }
        });

        let phase = pose.translation_phase(&freqs);
        slice.zip_mut_with(&phase, |s, &p| *s *= p);
        slice
    }

    /// Fetch one sample, `[z, y, x]` indexed, honouring the boundary
    /// policy.
    fn sample(&self, data: &Array3<c64>, k: isize, i: isize, j: isize) -> c64 {
        let n = data.dim().0 as isize;
        match self.boundary {
            Boundary::Fill(value) => {
                if k < 0 || i < 0 || j < 0 || k >= n || i >= n || j >= n {
                    value
                } else {
                    data[[k as usize, i as usize, j as usize]]
                }
            }
            Boundary::Wrap => data[[
                k.rem_euclid(n) as usize,
                i.rem_euclid(n) as usize,
                j.rem_euclid(n) as usize,
            ]],
        }
    }

    fn trilinear(&self, data: &Array3<c64>, w: f64, v: f64, u: f64) -> c64 {
        let (k0, i0, j0) = (w.floor() as isize, v.floor() as isize, u.floor() as isize);
        let (tk, ti, tj) = (w - k0 as f64, v - i0 as f64, u - j0 as f64);
        let mut out = c64::new(0.0, 0.0);
        for dk in 0..2 {
            for di in 0..2 {
                for dj in 0..2 {
                    let weight = (if dk == 0 { 1.0 - tk } else { tk })
                        * (if di == 0 { 1.0 - ti } else { ti })
                        * (if dj == 0 { 1.0 - tj } else { tj });
                    if weight != 0.0 {
                        out += self.sample(data, k0 + dk, i0 + di, j0 + dj) * weight;
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::euler::EulerPose;
    use approx::assert_abs_diff_eq;

    fn test_volume() -> FourierVolume {
        let density = Array3::from_shape_fn((4, 4, 4), |(k, i, j)| {
            (k as f64 - 1.3) * 0.7 + (i * i) as f64 * 0.11 - j as f64 * 0.45
        });
        FourierVolume::from_real_volume(&density, 1.0, 1.0).unwrap()
    }

    fn matched_config() -> ImageConfig {
        ImageConfig::new((4, 4), 1.0, 1.0).unwrap()
    }

    #[test]
    fn identity_slice_reads_the_central_plane() {
        let volume = test_volume();
        let config = matched_config();
        let method = FourierSliceMethod::default();
        let slice = method.extract(&volume, &Pose::identity(), &config);

        // Image index k carries signed frequency k or k - n, which lands on
        // volume index n/2 + signed(k).
        let signed = |k: usize| -> usize {
            if k < 2 {
                2 + k
            } else {
                2 + k - 4
            }
        };
        for i in 0..4 {
            for j in 0..4 {
                let want = volume.data()[[2, signed(i), signed(j)]];
                assert_abs_diff_eq!(slice[[i, j]].re, want.re, epsilon = 1e-9);
                assert_abs_diff_eq!(slice[[i, j]].im, want.im, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn nearest_and_linear_agree_on_grid_points() {
        let volume = test_volume();
        let config = matched_config();
        let linear = FourierSliceMethod::default();
        let nearest = FourierSliceMethod {
            interpolation: Interp::Nearest,
            ..Default::default()
        };
        let a = linear.extract(&volume, &Pose::identity(), &config);
        let b = nearest.extract(&volume, &Pose::identity(), &config);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x.re, y.re, epsilon = 1e-9);
            assert_abs_diff_eq!(x.im, y.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn any_rotation_preserves_the_dc_sample() {
        let volume = test_volume();
        let config = matched_config();
        let method = FourierSliceMethod::default();
        let mass = volume.data()[[2, 2, 2]];
        for pose in [
            Pose::from(EulerPose::from_degrees(33.0, 61.0, -140.0)),
            Pose::from(EulerPose::from_degrees(0.0, 90.0, 0.0)),
            Pose::from(EulerPose::from_degrees(10.0, 170.0, 10.0)),
        ] {
            let slice = method.extract(&volume, &pose, &config);
            assert_abs_diff_eq!(slice[[0, 0]].re, mass.re, epsilon = 1e-9);
            assert_abs_diff_eq!(slice[[0, 0]].im, mass.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn in_plane_offset_applies_a_pure_phase() {
        let volume = test_volume();
        let config = matched_config();
        let method = FourierSliceMethod::default();
        let base = method.extract(&volume, &Pose::identity(), &config);

        let mut posed = EulerPose::from_radians(0.0, 0.0, 0.0);
        posed.offset = nalgebra::Vector3::new(1.0, 2.0, 0.0);
        let shifted = method.extract(&volume, &Pose::from(posed), &config);

        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(shifted[[i, j]].norm(), base[[i, j]].norm(), epsilon = 1e-9);
            }
        }
        // f = (1/4, 0), t_x = 1: the ramp is exp(-i pi / 2) = -i.
        let want = base[[0, 1]] * c64::new(0.0, -1.0);
        assert_abs_diff_eq!(shifted[[0, 1]].re, want.re, epsilon = 1e-9);
        assert_abs_diff_eq!(shifted[[0, 1]].im, want.im, epsilon = 1e-9);
    }

    #[test]
    fn fill_and_wrap_differ_past_the_volume_nyquist() {
        // Voxels twice the pixel size: the volume spectrum only reaches a
        // quarter of the image band.
        let density = Array3::from_shape_fn((4, 4, 4), |(k, i, j)| (k + 2 * i + 3 * j) as f64);
        let volume = FourierVolume::from_real_volume(&density, 2.0, 1.0).unwrap();
        let config = matched_config();
        let fill_value = c64::new(7.0, 0.0);
        let fill = FourierSliceMethod {
            interpolation: Interp::Linear,
            boundary: Boundary::Fill(fill_value),
        };
        let wrap = FourierSliceMethod {
            interpolation: Interp::Linear,
            boundary: Boundary::Wrap,
        };
        let a = fill.extract(&volume, &Pose::identity(), &config);
        let b = wrap.extract(&volume, &Pose::identity(), &config);

        // f_x = -1/2 maps to volume index -2; filling sees the constant,
        // wrapping comes back around to the DC sample.
        assert_abs_diff_eq!(a[[0, 2]].re, fill_value.re, epsilon = 1e-9);
        let mass = volume.data()[[2, 2, 2]];
        assert_abs_diff_eq!(b[[0, 2]].re, mass.re, epsilon = 1e-9);
    }
}
