// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The contrast transfer function of the objective lens.

use nalgebra::Vector2;
use ndarray::Array2;
use thiserror::Error;

use crate::constants::{
    ELECTRON_RELATIVISTIC_COEFF, ELECTRON_WAVELENGTH_COEFF, KV_TO_VOLT, MM_TO_ANGSTROM,
};
use crate::grid::cartesian_to_polar;

/// The relativistic electron wavelength \[Å\] at an accelerating voltage
/// \[kV\].
pub fn electron_wavelength(voltage_kv: f64) -> f64 {
    let volts = voltage_kv * KV_TO_VOLT;
    ELECTRON_WAVELENGTH_COEFF / (volts * (1.0 + volts * ELECTRON_RELATIVISTIC_COEFF)).sqrt()
}

/// A weak-phase contrast transfer function with astigmatic defocus.
///
/// The aberration phase at spatial frequency `f` \[cycles/Å\] is
///
/// `chi(f) = pi/2 Cs lambda^3 |f|^4 - pi lambda dz(theta) |f|^2`,
///
/// where `dz(theta)` interpolates the two defocus values with the azimuth,
/// and the transfer value is
///
/// `sqrt(1 - ac^2) sin(chi + shift) - ac cos(chi + shift)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ctf {
    /// Defocus along the major astigmatism axis \[Å\], positive for
    /// underfocus.
    defocus_u: f64,
    /// Defocus along the minor astigmatism axis \[Å\]
    defocus_v: f64,
    /// Azimuth of the major axis, from the x axis \[radians\]
    astigmatism_angle: f64,
    /// Accelerating voltage \[kV\]
    voltage_kv: f64,
    /// Spherical aberration \[mm\]
    spherical_aberration_mm: f64,
    /// Fraction of amplitude contrast, in `[0, 1]`
    amplitude_contrast: f64,
    /// Constant phase shift, e.g. from a phase plate \[radians\]
    phase_shift: f64,
}

impl Ctf {
    /// Validate and construct.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        defocus_u: f64,
        defocus_v: f64,
        astigmatism_angle: f64,
        voltage_kv: f64,
        spherical_aberration_mm: f64,
        amplitude_contrast: f64,
        phase_shift: f64,
    ) -> Result<Ctf, OpticsError> {
        if !defocus_u.is_finite() {
            return Err(OpticsError::BadDefocus(defocus_u));
        }
        if !defocus_v.is_finite() {
            return Err(OpticsError::BadDefocus(defocus_v));
        }
        if !(voltage_kv.is_finite() && voltage_kv > 0.0) {
            return Err(OpticsError::BadVoltage(voltage_kv));
        }
        if !(spherical_aberration_mm.is_finite() && spherical_aberration_mm >= 0.0) {
            return Err(OpticsError::BadSphericalAberration(spherical_aberration_mm));
        }
        if !(0.0..=1.0).contains(&amplitude_contrast) {
            return Err(OpticsError::BadAmplitudeContrast(amplitude_contrast));
        }
        Ok(Ctf {
            defocus_u,
            defocus_v,
            astigmatism_angle,
            voltage_kv,
            spherical_aberration_mm,
            amplitude_contrast,
            phase_shift,
        })
    }

    /// Replace both defocus values, keeping the astigmatism azimuth.
    pub fn with_defocus(&self, defocus_u: f64, defocus_v: f64) -> Result<Ctf, OpticsError> {
        Ctf::new(
            defocus_u,
            defocus_v,
            self.astigmatism_angle,
            self.voltage_kv,
            self.spherical_aberration_mm,
            self.amplitude_contrast,
            self.phase_shift,
        )
    }

    pub fn defocus_u(&self) -> f64 {
        self.defocus_u
    }

    pub fn defocus_v(&self) -> f64 {
        self.defocus_v
    }

    /// The electron wavelength at this voltage \[Å\]
    pub fn wavelength_angstroms(&self) -> f64 {
        electron_wavelength(self.voltage_kv)
    }

    /// The defocus seen at an azimuth \[Å\]
    pub fn defocus_at(&self, azimuth: f64) -> f64 {
        0.5 * (self.defocus_u
            + self.defocus_v
            + (self.defocus_u - self.defocus_v)
                * (2.0 * (azimuth - self.astigmatism_angle)).cos())
    }

    /// The transfer value at one spatial frequency \[cycles/Å\].
    pub fn transfer_at(&self, frequency: Vector2<f64>) -> f64 {
        let (radius, azimuth) = cartesian_to_polar(frequency);
        let lambda = self.wavelength_angstroms();
        let cs = self.spherical_aberration_mm * MM_TO_ANGSTROM;
        let chi = std::f64::consts::FRAC_PI_2 * cs * lambda.powi(3) * radius.powi(4)
            - std::f64::consts::PI * lambda * self.defocus_at(azimuth) * radius.powi(2)
            + self.phase_shift;
        let ac = self.amplitude_contrast;
        (1.0 - ac * ac).sqrt() * chi.sin() - ac * chi.cos()
    }

    /// Evaluate over an image frequency grid. With no phase shift, the
    /// zero-frequency value is `-amplitude_contrast`.
    pub fn evaluate(&self, freqs: &Array2<Vector2<f64>>) -> Array2<f64> {
        freqs.mapv(|f| self.transfer_at(f))
    }
}

impl Default for Ctf {
    /// A plain 300 kV instrument at 1 um underfocus.
    fn default() -> Ctf {
        Ctf {
            defocus_u: 10000.0,
            defocus_v: 10000.0,
            astigmatism_angle: 0.0,
            voltage_kv: 300.0,
            spherical_aberration_mm: 2.7,
            amplitude_contrast: 0.07,
            phase_shift: 0.0,
        }
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when describing the optics.
pub enum OpticsError {
    #[error("defocus must be finite; got {0} Å")]
    BadDefocus(f64),

    #[error("accelerating voltage must be positive and finite; got {0} kV")]
    BadVoltage(f64),

    #[error("spherical aberration must be non-negative and finite; got {0} mm")]
    BadSphericalAberration(f64),

    #[error("amplitude contrast must lie in [0, 1]; got {0}")]
    BadAmplitudeContrast(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wavelengths_match_published_values() {
        assert_abs_diff_eq!(electron_wavelength(300.0), 0.019687, epsilon = 1e-6);
        assert_abs_diff_eq!(electron_wavelength(200.0), 0.025079, epsilon = 1e-6);
        assert_abs_diff_eq!(electron_wavelength(120.0), 0.033492, epsilon = 1e-5);
    }

    #[test]
    fn dc_value_is_minus_amplitude_contrast() {
        let ctf = Ctf::new(12000.0, 9000.0, 0.4, 300.0, 2.7, 0.1, 0.0).unwrap();
        assert_abs_diff_eq!(ctf.transfer_at(Vector2::zeros()), -0.1, epsilon = 1e-12);
    }

    #[test]
    fn defocus_interpolates_between_the_axes() {
        let ctf = Ctf::new(12000.0, 10000.0, 0.0, 300.0, 2.7, 0.07, 0.0).unwrap();
        assert_abs_diff_eq!(ctf.defocus_at(0.0), 12000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            ctf.defocus_at(std::f64::consts::FRAC_PI_2),
            10000.0,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            ctf.defocus_at(std::f64::consts::FRAC_PI_4),
            11000.0,
            epsilon = 1e-9
        );
        // Rotating the astigmatism azimuth rotates the pattern with it.
        let rotated = Ctf::new(12000.0, 10000.0, 0.3, 300.0, 2.7, 0.07, 0.0).unwrap();
        assert_abs_diff_eq!(rotated.defocus_at(0.3), 12000.0, epsilon = 1e-9);
    }

    #[test]
    fn no_aberration_and_no_amplitude_contrast_transfers_nothing() {
        let ctf = Ctf::new(0.0, 0.0, 0.0, 300.0, 0.0, 0.0, 0.0).unwrap();
        for f in [
            Vector2::new(0.0, 0.0),
            Vector2::new(0.21, -0.11),
            Vector2::new(-0.5, 0.5),
        ] {
            assert_abs_diff_eq!(ctf.transfer_at(f), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn quarter_wave_phase_shift_turns_sine_into_one() {
        let ctf = Ctf::new(0.0, 0.0, 0.0, 300.0, 0.0, 0.0, std::f64::consts::FRAC_PI_2).unwrap();
        assert_abs_diff_eq!(ctf.transfer_at(Vector2::new(0.13, 0.2)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn pure_defocus_value_at_a_known_frequency() {
        // chi = -pi lambda dz r^2 with lambda(300 kV), dz = 15000 Å,
        // r = 0.1 cycles/Å.
        let ctf = Ctf::new(15000.0, 15000.0, 0.0, 300.0, 0.0, 0.0, 0.0).unwrap();
        assert_abs_diff_eq!(
            ctf.transfer_at(Vector2::new(0.1, 0.0)),
            -0.146722,
            epsilon = 1e-3
        );
    }

    #[test]
    fn evaluate_is_even_in_frequency() {
        let ctf = Ctf::new(14000.0, 9000.0, 1.1, 200.0, 2.0, 0.07, 0.2).unwrap();
        let f = Vector2::new(0.17, -0.06);
        assert_abs_diff_eq!(ctf.transfer_at(f), ctf.transfer_at(-f), epsilon = 1e-12);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(matches!(
            Ctf::new(f64::INFINITY, 0.0, 0.0, 300.0, 2.7, 0.07, 0.0),
            Err(OpticsError::BadDefocus(_))
        ));
        assert!(matches!(
            Ctf::new(0.0, 0.0, 0.0, 0.0, 2.7, 0.07, 0.0),
            Err(OpticsError::BadVoltage(_))
        ));
        assert!(matches!(
            Ctf::new(0.0, 0.0, 0.0, 300.0, -1.0, 0.07, 0.0),
            Err(OpticsError::BadSphericalAberration(_))
        ));
        assert!(matches!(
            Ctf::new(0.0, 0.0, 0.0, 300.0, 2.7, 1.2, 0.0),
            Err(OpticsError::BadAmplitudeContrast(_))
        ));
    }
}
