// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// h / sqrt(2 m0 e), the de Broglie wavelength coefficient for electrons
/// \[Å sqrt(volts)\]
pub const ELECTRON_WAVELENGTH_COEFF: f64 = 12.2643247;
/// e / (2 m0 c^2), the relativistic correction to the electron wavelength
/// \[1/volts\]
pub const ELECTRON_RELATIVISTIC_COEFF: f64 = 0.978466e-6;

/// Spherical aberration is conventionally quoted in mm; everything else here
/// is in Å.
pub const MM_TO_ANGSTROM: f64 = 1e7;
/// Accelerating voltage is conventionally quoted in kV.
pub const KV_TO_VOLT: f64 = 1e3;

/// A five-Gaussian fit to an elastic electron scattering factor,
///
/// f(s) = sum_i a\[i\] * exp(-b\[i\] * s^2),
///
/// where s = |f| / 2 is the scattering vector magnitude \[1/Å\] for a spatial
/// frequency f \[cycles/Å\]. Fits from Peng et al. 1996.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormFactor {
    /// Atomic number
    pub z: u32,
    /// Amplitudes \[Å\]
    pub a: [f64; 5],
    /// Widths \[Å^2\]
    pub b: [f64; 5],
}

lazy_static! {
    /// Elastic scattering factors for the elements common in biological
    /// specimens, keyed by element symbol.
    pub static ref FORM_FACTORS: HashMap<&'static str, FormFactor> = {
        let mut m = HashMap::new();
        m.insert(
            "H",
            FormFactor {
                z: 1,
                a: [0.0349, 0.1201, 0.1970, 0.0573, 0.1195],
                b: [0.5347, 3.5867, 12.3471, 18.9525, 38.6269],
            },
        );
        m.insert(
            "C",
            FormFactor {
                z: 6,
                a: [0.0893, 0.2563, 0.7570, 1.0487, 0.3575],
                b: [0.2465, 1.7100, 6.4094, 18.6113, 50.2523],
            },
        );
        m.insert(
            "N",
            FormFactor {
                z: 7,
                a: [0.1022, 0.3219, 0.7982, 0.8197, 0.1715],
                b: [0.2451, 1.7481, 6.1925, 17.3894, 48.1431],
            },
        );
        m.insert(
            "O",
            FormFactor {
                z: 8,
                a: [0.0974, 0.2921, 0.6910, 0.6990, 0.2039],
                b: [0.2067, 1.3815, 4.6943, 12.7105, 32.4726],
            },
        );
        m.insert(
            "P",
            FormFactor {
                z: 15,
                a: [0.2548, 0.6106, 1.4541, 2.3204, 0.8477],
                b: [0.2908, 1.8740, 8.5176, 24.3434, 63.2996],
            },
        );
        m.insert(
            "S",
            FormFactor {
                z: 16,
                a: [0.2497, 0.5628, 1.3899, 2.1865, 0.7715],
                b: [0.2681, 1.6711, 7.0267, 19.5377, 50.3888],
            },
        );
        m
    };
}
