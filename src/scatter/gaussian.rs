// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Projection of Gaussian-mixture potentials, evaluated in closed form.
//!
//! Projecting an isotropic Gaussian along z leaves a 2-D Gaussian with the
//! same variance, and the transform of the projection is
//! `w (2 pi v)^(3/2) exp(-2 pi^2 v |f|^2) exp(-2 pi i f . p)`. Summing
//! those terms per component gives the projection without ever touching a
//! grid.

use ndarray::Array2;

use crate::{c64, config::ImageConfig, density::atom::AtomCloud, grid, pose::Pose};

/// Closed-form projection of Gaussian mixtures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianMixtureMethod {
    /// Evaluate the shared radial envelope once per group of components
    /// with the same identity tag and variance, instead of once per
    /// component. Changes only the summation order, so results agree to
    /// rounding.
    pub group_identical: bool,
}

impl Default for GaussianMixtureMethod {
    fn default() -> GaussianMixtureMethod {
        GaussianMixtureMethod {
            group_identical: true,
        }
    }
}

impl GaussianMixtureMethod {
    /// Project the posed mixture along the instrument z axis, returning
    /// the Fourier transform of the projection on the padded image grid,
    /// in standard frequency order.
    pub fn project(
        &self,
        atoms: &AtomCloud,
        pose: &Pose,
        config: &ImageConfig,
    ) -> Array2<c64> {
        let (py, px) = config.padded_shape();
        let freqs = grid::frequency_grid((py, px), config.pixel_size());
        // The object-frame origin renders at the centre pixel, like the
        // centred embedding of a voxel grid does.
        let centre_x = (px / 2) as f64 * config.pixel_size();
        let centre_y = (py / 2) as f64 * config.pixel_size();
        let mut placed = pose.transform_points(atoms.positions());
        for p in &mut placed {
            p.x += centre_x;
            p.y += centre_y;
        }

        // Indices of the components, grouped by identity tag and exact
        // variance when grouping is on, singletons otherwise.
        let groups: Vec<(f64, Vec<usize>)> = if self.group_identical {
            let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
            let mut by_key = std::collections::HashMap::new();
            for (index, (&variance, &identity)) in atoms
                .variances()
                .iter()
                .zip(atoms.identities().iter())
                .enumerate()
            {
                let slot = *by_key
                    .entry((identity, variance.to_bits()))
                    .or_insert_with(|| {
                        groups.push((variance, Vec::new()));
                        groups.len() - 1
                    });
                groups[slot].1.push(index);
            }
            groups
        } else {
            atoms
                .variances()
                .iter()
                .enumerate()
                .map(|(index, &variance)| (variance, vec![index]))
                .collect()
        };

        let weights = atoms.weights();
        let mut out = Array2::from_elem(freqs.dim(), c64::new(0.0, 0.0));
        for (variance, members) in &groups {
            let envelope_scale = (std::f64::consts::TAU * variance).powf(1.5);
            ndarray::Zip::from(&mut out).and(&freqs).for_each(|o, f| {
                let envelope = envelope_scale
                    * (-2.0 * std::f64::consts::PI.powi(2) * variance * f.norm_squared()).exp();
                let mut phased = c64::new(0.0, 0.0);
                for &index in members {
                    let p = &placed[index];
                    phased += c64::cis(-std::f64::consts::TAU * (f.x * p.x + f.y * p.y))
                        * weights[index];
                }
                *o += phased * envelope;
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::euler::EulerPose;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn two_atoms() -> AtomCloud {
        AtomCloud::new(
            vec![Vector3::new(2.0, 1.0, 0.5), Vector3::new(-3.0, -2.0, 1.0)],
            vec![1.0, 2.5],
            vec![1.44, 2.25],
        )
        .unwrap()
    }

    #[test]
    fn dc_is_the_integrated_mixture() {
        let config = ImageConfig::new((16, 16), 1.0, 1.0).unwrap();
        let projection =
            GaussianMixtureMethod::default().project(&two_atoms(), &Pose::identity(), &config);
        let want = 1.0 * (std::f64::consts::TAU * 1.44).powf(1.5)
            + 2.5 * (std::f64::consts::TAU * 2.25).powf(1.5);
        assert_abs_diff_eq!(projection[[0, 0]].re, want, epsilon = 1e-12);
        assert_abs_diff_eq!(projection[[0, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn grouping_changes_nothing_but_the_arithmetic_order() {
        // Two components share a variance but not an identity, so grouping
        // splits on the tag.
        let atoms = AtomCloud::with_identities(
            vec![
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, 2.0, -1.0),
                Vector3::new(-2.0, 1.0, 3.0),
            ],
            vec![0.5, 1.5, 1.0],
            vec![2.0, 2.0, 1.0],
            vec![6, 7, 6],
        )
        .unwrap();
        let config = ImageConfig::new((12, 12), 1.5, 1.0).unwrap();
        let pose = Pose::from(EulerPose::from_degrees(25.0, 70.0, -10.0));
        let grouped = GaussianMixtureMethod {
            group_identical: true,
        }
        .project(&atoms, &pose, &config);
        let singles = GaussianMixtureMethod {
            group_identical: false,
        }
        .project(&atoms, &pose, &config);
        for (a, b) in grouped.iter().zip(singles.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn projected_peak_sits_at_the_offset_atom() {
        let atoms = AtomCloud::new(vec![Vector3::zeros()], vec![1.0], vec![1.0]).unwrap();
        let mut posed = EulerPose::from_radians(0.0, 0.0, 0.0);
        posed.offset = Vector3::new(3.0, -2.0, 7.0);
        let config = ImageConfig::new((16, 16), 1.0, 1.0).unwrap();
        let projection =
            GaussianMixtureMethod::default().project(&atoms, &Pose::from(posed), &config);
        let image = crate::fft::ifft_2d(&projection);

        let mut best = (0, 0);
        let mut best_value = f64::MIN;
        for ((i, j), value) in image.indexed_iter() {
            if value.re > best_value {
                best_value = value.re;
                best = (i, j);
            }
        }
        // Centre pixel is [8, 8]; the atom sits 3 to the right and 2 up
        // the negative y axis.
        assert_eq!(best, (6, 11));
    }

    #[test]
    fn rotation_carries_atoms_with_it() {
        // A 90 degree spin about z moves an atom on the x axis onto y.
        let atoms = AtomCloud::new(vec![Vector3::new(4.0, 0.0, 0.0)], vec![1.0], vec![1.0]).unwrap();
        let pose = Pose::from(EulerPose::from_degrees(90.0, 0.0, 0.0));
        let config = ImageConfig::new((16, 16), 1.0, 1.0).unwrap();
        let projection = GaussianMixtureMethod::default().project(&atoms, &pose, &config);
        let image = crate::fft::ifft_2d(&projection);

        let mut best = (0, 0);
        let mut best_value = f64::MIN;
        for ((i, j), value) in image.indexed_iter() {
            if value.re > best_value {
                best_value = value.re;
                best = (i, j);
            }
        }
        assert_eq!(best, (12, 8));
    }

    #[test]
    fn empty_cloud_projects_to_nothing() {
        let atoms = AtomCloud::new(vec![], vec![], vec![]).unwrap();
        let config = ImageConfig::new((8, 8), 1.0, 1.0).unwrap();
        let projection =
            GaussianMixtureMethod::default().project(&atoms, &Pose::identity(), &config);
        for v in projection.iter() {
            assert_abs_diff_eq!(v.norm(), 0.0);
        }
    }
}
