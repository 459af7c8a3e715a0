// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The image-formation chain from a posed specimen to a simulated
//! micrograph, and its comparison against observed data.
//!
//! The stages run in a fixed order: projection, contrast transfer,
//! dose scaling, solvent and detector noise, Fourier-space filters, the
//! inverse transform, a centred crop to the output shape, and a
//! real-space mask.

use log::warn;
use ndarray::{Array2, Array3};
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    c64,
    config::{ConfigError, ImageConfig},
    density::Density,
    exposure::Exposure,
    fft, grid,
    noise::{detector::DetectorNoise, ice::SolventNoise, split_seed},
    operators::{FrequencyFilter, Mask, OperatorError},
    optics::{Ctf, OpticsError},
    pose::Pose,
    scatter::ScatteringEngine,
};

/// A scattering potential held at a pose. The instrument state lives
/// elsewhere, so one specimen can be imaged under many configurations.
///
/// A specimen holds one or more conformations of the same structure, with
/// an index selecting the one that is projected. Most specimens hold a
/// single conformation; [`Specimen::ensemble`] builds a discrete ensemble
/// whose conformation can be swept per image through
/// [`TunableParameters`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Specimen {
    conformations: Vec<Density>,
    active: usize,
    pub pose: Pose,
}

impl Specimen {
    /// A single-conformation specimen.
    pub fn new(density: Density, pose: Pose) -> Specimen {
        Specimen {
            conformations: vec![density],
            active: 0,
            pose,
        }
    }

    /// A discrete ensemble of conformations, with conformation 0 active.
    /// The list must not be empty.
    pub fn ensemble(
        conformations: Vec<Density>,
        pose: Pose,
    ) -> Result<Specimen, RenderError> {
        if conformations.is_empty() {
            return Err(RenderError::EmptyEnsemble);
        }
        Ok(Specimen {
            conformations,
            active: 0,
            pose,
        })
    }

    /// The density of the active conformation.
    pub fn density(&self) -> &Density {
        &self.conformations[self.active]
    }

    pub fn n_conformations(&self) -> usize {
        self.conformations.len()
    }

    /// The index of the active conformation.
    pub fn conformation(&self) -> usize {
        self.active
    }

    /// Select the active conformation by index.
    pub fn set_conformation(&mut self, index: usize) -> Result<(), RenderError> {
        if index >= self.conformations.len() {
            return Err(RenderError::BadConformation {
                index,
                available: self.conformations.len(),
            });
        }
        self.active = index;
        Ok(())
    }
}

/// The microscope state: lens, dose and camera.
///
/// `optics` of `None` images the projection with no transfer function;
/// `detector` of `None` models an ideal noiseless camera.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instrument {
    pub optics: Option<Ctf>,
    pub exposure: Exposure,
    pub detector: Option<DetectorNoise>,
}

/// The fields a fitting loop moves per image, kept separate from the
/// fixed configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TunableParameters {
    pub pose: Pose,
    /// Defocus along the major astigmatism axis \[Å\]
    pub defocus_u: f64,
    /// Defocus along the minor astigmatism axis \[Å\]
    pub defocus_v: f64,
    /// Conformation index to select; `None` keeps the specimen's current
    /// one.
    pub conformation: Option<usize>,
}

/// Renders simulated micrographs from a specimen, an instrument and an
/// image geometry.
///
/// Rendering is deterministic unless a seed is supplied; with a seed,
/// each noise model draws from its own stream derived from that seed, so
/// identical seeds reproduce identical images.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPipeline {
    pub config: ImageConfig,
    pub specimen: Specimen,
    pub engine: ScatteringEngine,
    pub instrument: Instrument,
    /// Structured solvent noise, added to the instrument-filtered signal.
    pub ice: Option<SolventNoise>,
    /// Fourier-space filters, applied in order after the noise stages.
    pub filters: Vec<FrequencyFilter>,
    /// Real-space mask, applied to the cropped image.
    pub mask: Option<Mask>,
    observed: Option<Array2<f64>>,
}

impl RenderPipeline {
    /// A pipeline with no solvent noise, filters, mask or observation.
    pub fn new(
        config: ImageConfig,
        specimen: Specimen,
        engine: ScatteringEngine,
        instrument: Instrument,
    ) -> RenderPipeline {
        RenderPipeline {
            config,
            specimen,
            engine,
            instrument,
            ice: None,
            filters: vec![],
            mask: None,
            observed: None,
        }
    }

    /// The noiseless instrument-filtered signal at a pose, in Fourier
    /// space on the padded grid: projection, then contrast transfer, then
    /// dose scaling.
    pub fn fourier_signal(&self, pose: &Pose) -> Array2<c64> {
        let mut spectrum = self.specimen.density().project(pose, &self.engine, &self.config);
        if let Some(ctf) = &self.instrument.optics {
            let freqs =
                grid::frequency_grid(self.config.padded_shape(), self.config.pixel_size());
            spectrum.zip_mut_with(&ctf.evaluate(&freqs), |value, &transfer| *value *= transfer);
        }
        self.instrument
            .exposure
            .apply(&mut spectrum, self.config.pixel_size());
        spectrum
    }

    /// Turn a Fourier-space signal on the padded grid into the final
    /// real-space image: noise, filters, inverse transform, centred crop
    /// and mask. Noise models draw only when a seed is supplied.
    pub fn finish(
        &self,
        spectrum: Array2<c64>,
        seed: Option<u64>,
    ) -> Result<Array2<f64>, RenderError> {
        let mut spectrum = spectrum;
        let padded_shape = self.config.padded_shape();
        let pixel_size = self.config.pixel_size();

        if let Some(seed) = seed {
            if let Some(ice) = &self.ice {
                spectrum += &ice.sample(split_seed(seed, 0), padded_shape, pixel_size);
            }
            if let Some(detector) = &self.instrument.detector {
                spectrum += &detector.sample(split_seed(seed, 1), padded_shape, pixel_size);
            }
        }

        if !self.filters.is_empty() {
            let freqs = grid::frequency_grid(padded_shape, pixel_size);
            for filter in &self.filters {
                filter.apply(&mut spectrum, &freqs)?;
            }
        }

        let real = fft::ifft_2d(&spectrum).mapv(|v| v.re);
        let mut image = self.config.crop_to_shape(&real)?;
        if let Some(mask) = &self.mask {
            let coords = grid::coordinate_grid(self.config.shape(), pixel_size);
            mask.apply(&mut image, &coords)?;
        }
        Ok(image)
    }

    /// Render one image at the specimen's own pose.
    pub fn render(&self, seed: Option<u64>) -> Result<Array2<f64>, RenderError> {
        self.finish(self.fourier_signal(&self.specimen.pose), seed)
    }

    /// Render one image per pose into a stack, first axis indexing the
    /// pose. Each element derives its own seed, so elements draw
    /// independent noise.
    pub fn render_stack(
        &self,
        poses: &[Pose],
        seed: Option<u64>,
    ) -> Result<Array3<f64>, RenderError> {
        self.collect_stack(poses, seed, |pose, element_seed| {
            self.finish(self.fourier_signal(pose), element_seed)
        })
    }

    /// [`RenderPipeline::render_stack`] over a thread pool. The per-element
    /// seeds depend only on the element index, so this agrees with the
    /// serial variant bit for bit.
    pub fn render_stack_parallel(
        &self,
        poses: &[Pose],
        seed: Option<u64>,
    ) -> Result<Array3<f64>, RenderError> {
        self.collect_stack_parallel(poses, seed, |pose, element_seed| {
            self.finish(self.fourier_signal(pose), element_seed)
        })
    }

    /// A copy of this pipeline with the tunable fields replaced. The
    /// defocus values are ignored, with a warning, when no optics model
    /// is attached.
    pub fn with_parameters(
        &self,
        parameters: &TunableParameters,
    ) -> Result<RenderPipeline, RenderError> {
        let mut rebuilt = self.clone();
        rebuilt.specimen.pose = parameters.pose.clone();
        if let Some(index) = parameters.conformation {
            rebuilt.specimen.set_conformation(index)?;
        }
        if let Some(ctf) = &self.instrument.optics {
            rebuilt.instrument.optics =
                Some(ctf.with_defocus(parameters.defocus_u, parameters.defocus_v)?);
        } else {
            warn!(
                "no optics model is attached; ignoring defocus ({}, {}) Å",
                parameters.defocus_u, parameters.defocus_v
            );
        }
        Ok(rebuilt)
    }

    /// Render one image per parameter set into a stack, first axis
    /// indexing the parameter set.
    pub fn render_batch(
        &self,
        batch: &[TunableParameters],
        seed: Option<u64>,
    ) -> Result<Array3<f64>, RenderError> {
        self.collect_stack(batch, seed, |parameters, element_seed| {
            self.with_parameters(parameters)?.render(element_seed)
        })
    }

    /// [`RenderPipeline::render_batch`] over a thread pool, agreeing with
    /// the serial variant bit for bit.
    pub fn render_batch_parallel(
        &self,
        batch: &[TunableParameters],
        seed: Option<u64>,
    ) -> Result<Array3<f64>, RenderError> {
        self.collect_stack_parallel(batch, seed, |parameters, element_seed| {
            self.with_parameters(parameters)?.render(element_seed)
        })
    }

    fn collect_stack<T, F>(
        &self,
        items: &[T],
        seed: Option<u64>,
        render_one: F,
    ) -> Result<Array3<f64>, RenderError>
    where
        F: Fn(&T, Option<u64>) -> Result<Array2<f64>, RenderError>,
    {
        let (ny, nx) = self.config.shape();
        let mut stack = Array3::zeros((items.len(), ny, nx));
        for (index, (mut slot, item)) in stack.outer_iter_mut().zip(items.iter()).enumerate() {
            slot.assign(&render_one(
                item,
                seed.map(|s| split_seed(s, index as u64)),
            )?);
        }
        Ok(stack)
    }

    fn collect_stack_parallel<T, F>(
        &self,
        items: &[T],
        seed: Option<u64>,
        render_one: F,
    ) -> Result<Array3<f64>, RenderError>
    where
        T: Sync,
        F: Fn(&T, Option<u64>) -> Result<Array2<f64>, RenderError> + Sync,
    {
        let (ny, nx) = self.config.shape();
        let mut stack = Array3::zeros((items.len(), ny, nx));
        stack
            .outer_iter_mut()
            .into_par_iter()
            .zip(items.par_iter())
            .enumerate()
            .try_for_each(|(index, (mut slot, item))| -> Result<(), RenderError> {
                slot.assign(&render_one(
                    item,
                    seed.map(|s| split_seed(s, index as u64)),
                )?);
                Ok(())
            })?;
        Ok(stack)
    }

    /// Attach an observed image to compare renders against. Its shape
    /// must match the configured output shape.
    pub fn attach_observation(&mut self, observed: Array2<f64>) -> Result<(), RenderError> {
        if observed.dim() != self.config.shape() {
            return Err(RenderError::BadArrayShape {
                argument: "observed".into(),
                function: "RenderPipeline::attach_observation".into(),
                expected: format!("{:?}", self.config.shape()),
                received: format!("{:?}", observed.dim()),
            });
        }
        self.observed = Some(observed);
        Ok(())
    }

    pub fn observed(&self) -> Option<&Array2<f64>> {
        self.observed.as_ref()
    }

    /// The masked observation minus the masked deterministic render.
    pub fn residuals(&self) -> Result<Array2<f64>, RenderError> {
        let observed = self.observed.as_ref().ok_or(RenderError::NoObservation)?;
        let simulated = self.render(None)?;
        let mut observed = observed.clone();
        if let Some(mask) = &self.mask {
            let coords = grid::coordinate_grid(self.config.shape(), self.config.pixel_size());
            mask.apply(&mut observed, &coords)?;
        }
        Ok(observed - simulated)
    }

    /// The log-likelihood of the observation under independent Gaussian
    /// pixel noise of the given variance around the deterministic render.
    pub fn log_likelihood(&self, noise_variance: f64) -> Result<f64, RenderError> {
        if !(noise_variance.is_finite() && noise_variance > 0.0) {
            return Err(RenderError::BadVariance(noise_variance));
        }
        let residuals = self.residuals()?;
        let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
        let ln_norm = (std::f64::consts::TAU * noise_variance).ln();
        Ok(-0.5 * (sum_sq / noise_variance + residuals.len() as f64 * ln_norm))
    }
}

#[derive(Error, Debug)]
/// All the errors that can occur when rendering images.
pub enum RenderError {
    /// An error from the image geometry.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error from a filter or mask.
    #[error(transparent)]
    Operator(#[from] OperatorError),

    /// An error from rebuilding the optics.
    #[error(transparent)]
    Optics(#[from] OpticsError),

    #[error("no observed image has been attached")]
    NoObservation,

    #[error("an ensemble needs at least one conformation")]
    EmptyEnsemble,

    #[error("conformation index {index} is out of range for an ensemble of {available}")]
    BadConformation { index: usize, available: usize },

    #[error("noise variance must be positive and finite; got {0}")]
    BadVariance(f64),

    #[error("bad array shape supplied to argument {argument} of function {function}. expected {expected}, received {received}")]
    BadArrayShape {
        argument: String,
        function: String,
        expected: String,
        received: String,
    },
}
