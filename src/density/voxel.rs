// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scattering potentials as voxel grids, held in Fourier space ready for
//! slice extraction.

use itertools::izip;
use log::trace;
use ndarray::{s, Array3};

use super::{atom::AtomCloud, DensityError};
use crate::{c64, config::padded_dim, fft};

/// A cubic voxel-grid potential, stored as the zero-centred 3-D DFT of the
/// real-space density. "Zero-centred" means the array has been rolled so
/// the zero-frequency element sits at index `side / 2` on every axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FourierVolume {
    data: Array3<c64>,
    voxel_size: f64,
}

impl FourierVolume {
    /// Transform a real-space density grid. The grid is embedded in the
    /// centre of a zeroed cube whose side is the largest input dimension
    /// scaled by `pad_scale`, so projections of point-like densities are
    /// sampled finely enough in Fourier space.
    pub fn from_real_volume(
        density: &Array3<f64>,
        voxel_size: f64,
        pad_scale: f64,
    ) -> Result<FourierVolume, DensityError> {
        let (nz, ny, nx) = density.dim();
        if nz == 0 || ny == 0 || nx == 0 {
            return Err(DensityError::EmptyVolume { nz, ny, nx });
        }
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(DensityError::BadVoxelSize(voxel_size));
        }
        if !(pad_scale.is_finite() && pad_scale >= 1.0) {
            return Err(DensityError::BadPadScale(pad_scale));
        }
        let side = padded_dim(nz.max(ny).max(nx), pad_scale);
        trace!("transforming a {}^3 voxel cube to Fourier space", side);
        let mut cube = Array3::from_elem((side, side, side), c64::new(0.0, 0.0));
        let (z0, y0, x0) = ((side - nz) / 2, (side - ny) / 2, (side - nx) / 2);
        cube.slice_mut(s![z0..z0 + nz, y0..y0 + ny, x0..x0 + nx])
            .assign(&density.mapv(|v| c64::new(v, 0.0)));
        Ok(FourierVolume {
            data: fft::fftshift_3d(&fft::fft_3d(&cube)),
            voxel_size,
        })
    }

    /// Rasterise an atom cloud onto a `side`-cubed grid and transform it.
    pub fn from_atoms(
        atoms: &AtomCloud,
        side: usize,
        voxel_size: f64,
        pad_scale: f64,
    ) -> Result<FourierVolume, DensityError> {
        if side == 0 {
            return Err(DensityError::EmptyVolume {
                nz: side,
                ny: side,
                nx: side,
            });
        }
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(DensityError::BadVoxelSize(voxel_size));
        }
        let density = rasterize_atoms(atoms, side, voxel_size);
        FourierVolume::from_real_volume(&density, voxel_size, pad_scale)
    }

    /// The zero-centred spectrum, indexed `[z, y, x]`.
    pub fn data(&self) -> &Array3<c64> {
        &self.data
    }

    /// Cube edge length \[voxels\]
    pub fn side(&self) -> usize {
        self.data.dim().0
    }

    /// Voxel edge length \[Å\]
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    /// Spacing between adjacent Fourier samples \[cycles/Å\]
    pub fn frequency_step(&self) -> f64 {
        1.0 / (self.side() as f64 * self.voxel_size)
    }
}

/// Sample an atom cloud onto a centred cubic grid: each component adds
/// `w exp(-|r - p|^2 / (2 v))`, evaluated separably per axis and truncated
/// past six standard deviations.
pub fn rasterize_atoms(atoms: &AtomCloud, side: usize, voxel_size: f64) -> Array3<f64> {
    let mut density = Array3::zeros((side, side, side));
    let centre = (side / 2) as f64;

    let axis_window = |index_centre: f64, half_width: f64| -> std::ops::Range<usize> {
        let lo = ((index_centre - half_width).ceil() as isize).max(0);
        let hi = ((index_centre + half_width).floor() as isize).min(side as isize - 1);
        if lo > hi {
            0..0
        } else {
            lo as usize..hi as usize + 1
        }
    };

    for (position, &weight, &variance) in
        izip!(atoms.positions(), atoms.weights(), atoms.variances())
    {
        let half_width = 6.0 * variance.sqrt() / voxel_size;
        let (cx, cy, cz) = (
            position.x / voxel_size + centre,
            position.y / voxel_size + centre,
            position.z / voxel_size + centre,
        );
        let profile = |range: &std::ops::Range<usize>, p: f64| -> Vec<f64> {
            range
                .clone()
                .map(|k| {
                    let d = (k as f64 - centre) * voxel_size - p;
                    (-d * d / (2.0 * variance)).exp()
                })
                .collect()
        };
        let (xs, ys, zs) = (
            axis_window(cx, half_width),
            axis_window(cy, half_width),
            axis_window(cz, half_width),
        );
        let (gx, gy, gz) = (
            profile(&xs, position.x),
            profile(&ys, position.y),
            profile(&zs, position.z),
        );
        for (k, &ez) in zs.clone().zip(gz.iter()) {
            for (i, &ey) in ys.clone().zip(gy.iter()) {
                let wz_wy = weight * ez * ey;
                for (j, &ex) in xs.clone().zip(gx.iter()) {
                    density[[k, i, j]] += wz_wy * ex;
                }
            }
        }
    }
    density
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    #[test]
    fn dc_element_carries_the_total_mass() {
        let density = Array3::from_elem((4, 4, 4), 1.0);
        let volume = FourierVolume::from_real_volume(&density, 1.0, 1.0).unwrap();
        assert_eq!(volume.side(), 4);
        assert_abs_diff_eq!(volume.data()[[2, 2, 2]].re, 64.0, epsilon = 1e-9);
        assert_abs_diff_eq!(volume.data()[[2, 2, 2]].im, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn padding_changes_the_grid_but_not_the_mass() {
        let density = Array3::from_elem((4, 4, 4), 1.0);
        let volume = FourierVolume::from_real_volume(&density, 2.0, 2.0).unwrap();
        assert_eq!(volume.side(), 8);
        assert_abs_diff_eq!(volume.frequency_step(), 1.0 / 16.0);
        assert_abs_diff_eq!(volume.data()[[4, 4, 4]].re, 64.0, epsilon = 1e-9);
    }

    #[test]
    fn non_cubic_input_is_embedded_in_a_cube() {
        let density = Array3::from_elem((2, 6, 4), 1.0);
        let volume = FourierVolume::from_real_volume(&density, 1.0, 1.0).unwrap();
        assert_eq!(volume.side(), 6);
        assert_abs_diff_eq!(volume.data()[[3, 3, 3]].re, 48.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_degenerate_input() {
        let density = Array3::from_elem((0, 4, 4), 1.0);
        assert!(matches!(
            FourierVolume::from_real_volume(&density, 1.0, 1.0),
            Err(DensityError::EmptyVolume { .. })
        ));
        let density = Array3::from_elem((4, 4, 4), 1.0);
        assert!(matches!(
            FourierVolume::from_real_volume(&density, 0.0, 1.0),
            Err(DensityError::BadVoxelSize(_))
        ));
        assert!(matches!(
            FourierVolume::from_real_volume(&density, 1.0, 0.9),
            Err(DensityError::BadPadScale(_))
        ));
    }

    #[test]
    fn rasterised_peak_lands_on_the_atom() {
        let atoms = AtomCloud::new(
            vec![Vector3::new(2.0, -3.0, 1.0)],
            vec![1.5],
            vec![1.0],
        )
        .unwrap();
        let density = rasterize_atoms(&atoms, 32, 1.0);
        let mut best = (0, 0, 0);
        let mut best_value = f64::MIN;
        for ((k, i, j), &v) in density.indexed_iter() {
            if v > best_value {
                best_value = v;
                best = (k, i, j);
            }
        }
        // [z, y, x] indexing around the centre at index 16.
        assert_eq!(best, (17, 13, 18));
        assert_abs_diff_eq!(best_value, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn rasterised_mass_matches_the_gaussian_integral() {
        let atoms = AtomCloud::new(
            vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(3.0, 1.0, -2.0)],
            vec![2.0, 0.7],
            vec![4.0, 2.25],
        )
        .unwrap();
        let voxel_size = 1.0;
        let density = rasterize_atoms(&atoms, 48, voxel_size);
        let total: f64 = density.sum() * voxel_size.powi(3);
        let expected: f64 = atoms
            .weights()
            .iter()
            .zip(atoms.variances())
            .map(|(&w, &v)| w * (std::f64::consts::TAU * v).powf(1.5))
            .sum();
        assert_abs_diff_eq!(total, expected, epsilon = expected * 1e-6);
    }

    #[test]
    fn atom_transform_matches_the_rasterised_mass() {
        let atoms =
            AtomCloud::new(vec![Vector3::new(0.5, 0.0, -0.5)], vec![1.0], vec![2.25]).unwrap();
        let volume = FourierVolume::from_atoms(&atoms, 32, 1.0, 1.0).unwrap();
        let expected = (std::f64::consts::TAU * 2.25).powf(1.5);
        assert_abs_diff_eq!(
            volume.data()[[16, 16, 16]].re,
            expected,
            epsilon = expected * 1e-6
        );
    }
}
