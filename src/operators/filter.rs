// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fourier-space filters, applied to an image spectrum by pointwise
//! multiplication. Because every filter is a real multiplier, filters
//! commute with each other.

use log::warn;
use ndarray::Array2;

use super::OperatorError;
use crate::{c64, fft, grid};
use nalgebra::Vector2;

/// Keep frequencies below a cutoff, with a cosine ramp down to zero.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LowpassFilter {
    /// Frequencies above this are removed \[cycles/Å\]
    cutoff: f64,
    /// Width of the cosine ramp ending at the cutoff \[cycles/Å\]
    rolloff_width: f64,
}

impl LowpassFilter {
    /// Validate and construct. A zero `rolloff_width` gives a hard edge.
    pub fn new(cutoff: f64, rolloff_width: f64) -> Result<LowpassFilter, OperatorError> {
        if !(cutoff.is_finite() && cutoff > 0.0) {
            return Err(OperatorError::BadCutoff(cutoff));
        }
        if !(rolloff_width.is_finite() && rolloff_width >= 0.0) {
            return Err(OperatorError::BadRolloff(rolloff_width));
        }
        Ok(LowpassFilter {
            cutoff,
            rolloff_width,
        })
    }

    /// The multiplier at a frequency radius.
    pub fn weight_at(&self, radius: f64) -> f64 {
        if radius > self.cutoff {
            0.0
        } else if radius <= self.cutoff - self.rolloff_width {
            1.0
        } else {
            let phase =
                (radius - self.cutoff - self.rolloff_width) / self.rolloff_width * std::f64::consts::PI;
            0.5 * (1.0 + phase.cos())
        }
    }
}

/// Flatten an image's power spectrum against a reference micrograph.
///
/// The reference's power is averaged into radial frequency bins; the
/// filter weight is the inverse square root of the binned estimate,
/// interpolated between bin centres. Bins are floored at a small fraction
/// of the peak estimate so near-empty bins cannot blow the weights up.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WhiteningFilter {
    bins: Vec<f64>,
    bin_step: f64,
}

/// Binned power below this fraction of the peak is clipped before
/// inversion.
const PSD_CLIP_FRACTION: f64 = 1e-10;

impl WhiteningFilter {
    /// Estimate the whitening weights from a reference micrograph sampled
    /// every `pixel_size` Å.
    pub fn from_micrograph(
        reference: &Array2<f64>,
        pixel_size: f64,
    ) -> Result<WhiteningFilter, OperatorError> {
        let (ny, nx) = reference.dim();
        if ny == 0 || nx == 0 {
            return Err(OperatorError::EmptyReference);
        }
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(OperatorError::BadPixelSize(pixel_size));
        }

        let spectrum = fft::fft_2d(&reference.mapv(|v| c64::new(v, 0.0)));
        let freqs = grid::frequency_grid((ny, nx), pixel_size);
        let bin_step = 1.0 / (ny.max(nx) as f64 * pixel_size);

        let max_radius = freqs.iter().map(|f| f.norm()).fold(0.0, f64::max);
        let n_bins = (max_radius / bin_step).round() as usize + 1;
        let mut power_sums = vec![0.0; n_bins];
        let mut counts = vec![0usize; n_bins];
        ndarray::Zip::from(&spectrum).and(&freqs).for_each(|v, f| {
            let bin = ((f.norm() / bin_step).round() as usize).min(n_bins - 1);
            power_sums[bin] += v.norm_sqr();
            counts[bin] += 1;
        });

        let psd: Vec<f64> = power_sums
            .iter()
            .zip(counts.iter())
            .map(|(&sum, &count)| if count == 0 { 0.0 } else { sum / count as f64 })
            .collect();
        let peak = psd.iter().cloned().fold(0.0, f64::max);
        if peak <= 0.0 {
            return Err(OperatorError::BlankReference);
        }
        let floor = PSD_CLIP_FRACTION * peak;
        let clipped = psd.iter().filter(|&&p| p < floor).count();
        if clipped > 0 {
            warn!(
                "{} of {} power bins in the whitening reference are near empty; clipping before inversion",
                clipped, n_bins
            );
        }
        let bins = psd
            .iter()
            .map(|&p| 1.0 / p.max(floor).sqrt())
            .collect();
        Ok(WhiteningFilter { bins, bin_step })
    }

    /// The multiplier at a frequency radius, interpolated between bin
    /// centres and held constant past the last bin.
    pub fn weight_at(&self, radius: f64) -> f64 {
        let position = radius / self.bin_step;
        let low = position.floor() as usize;
        match self.bins.get(low + 1) {
            Some(&next) => {
                let t = position - low as f64;
                (1.0 - t) * self.bins[low] + t * next
            }
            // Past the last bin the weight holds; with no bins at all the
            // filter is the identity.
            None => self.bins.last().copied().unwrap_or(1.0),
        }
    }
}

/// An arbitrary multiplier grid, matching the padded image shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomFilter {
    pub weights: Array2<f64>,
}

/// A Fourier-space filter in one of the supported forms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrequencyFilter {
    Lowpass(LowpassFilter),
    Whitening(WhiteningFilter),
    Custom(CustomFilter),
}

impl FrequencyFilter {
    /// The multiplier grid for an image frequency grid.
    pub fn weights_for(
        &self,
        freqs: &Array2<Vector2<f64>>,
    ) -> Result<Array2<f64>, OperatorError> {
        match self {
            FrequencyFilter::Lowpass(lowpass) => {
                Ok(freqs.mapv(|f| lowpass.weight_at(f.norm())))
            }
            FrequencyFilter::Whitening(whitening) => {
                Ok(freqs.mapv(|f| whitening.weight_at(f.norm())))
            }
            FrequencyFilter::Custom(custom) => {
                if custom.weights.dim() != freqs.dim() {
                    return Err(OperatorError::BadArrayShape {
                        argument: "freqs".into(),
                        function: "FrequencyFilter::weights_for".into(),
                        expected: format!("{:?}", custom.weights.dim()),
                        received: format!("{:?}", freqs.dim()),
                    });
                }
                Ok(custom.weights.clone())
            }
        }
    }

    /// Multiply a spectrum by the filter in place.
    pub fn apply(
        &self,
        image: &mut Array2<c64>,
        freqs: &Array2<Vector2<f64>>,
    ) -> Result<(), OperatorError> {
        let weights = self.weights_for(freqs)?;
        image.zip_mut_with(&weights, |v, &w| *v *= w);
        Ok(())
    }
}

impl From<LowpassFilter> for FrequencyFilter {
    fn from(f: LowpassFilter) -> FrequencyFilter {
        FrequencyFilter::Lowpass(f)
    }
}

impl From<WhiteningFilter> for FrequencyFilter {
    fn from(f: WhiteningFilter) -> FrequencyFilter {
        FrequencyFilter::Whitening(f)
    }
}

impl From<CustomFilter> for FrequencyFilter {
    fn from(f: CustomFilter) -> FrequencyFilter {
        FrequencyFilter::Custom(f)
    }
}
