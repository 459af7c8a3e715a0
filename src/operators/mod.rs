// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multiplicative image operators: Fourier-space filters and real-space
//! masks.

pub mod filter;
pub mod mask;

pub use filter::{CustomFilter, FrequencyFilter, LowpassFilter, WhiteningFilter};
pub use mask::{CircularMask, CustomMask, Mask};

use thiserror::Error;

#[derive(Error, Debug)]
/// All the errors that can occur when building or applying operators.
pub enum OperatorError {
    #[error("cutoff frequency must be positive and finite; got {0} cycles/Å")]
    BadCutoff(f64),

    #[error("rolloff width must be non-negative and finite; got {0}")]
    BadRolloff(f64),

    #[error("mask radius must be positive and finite; got {0} Å")]
    BadRadius(f64),

    #[error("reference micrograph must be non-empty")]
    EmptyReference,

    #[error("reference micrograph carries no power to whiten against")]
    BlankReference,

    #[error("pixel size must be positive and finite; got {0}")]
    BadPixelSize(f64),

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    BadArrayShape {
        argument: String,
        function: String,
        expected: String,
        received: String,
    },
}
