//! A stateful vocal tract: configuration, block processing and articulation.

use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::articulation::{reshape, reshape_uniform};
use crate::error::{TractError, TractResult};
use crate::geometry::{TractGeometry, chain_reflections};
use crate::math::floorf;
use crate::parms::{TractParms, VelumCoefficients, check_coefficient, check_velum};
use crate::waveguide::{ScatteringCoefficients, WaveState};

/// A stateful vocal tract filter.
///
/// Implements a 1-dimensional digital waveguide of the pharyngeal/buccal cavity with a
/// nasal cavity branching off at the velum. Each output sample takes two half-sample
/// steps, so the propagation delay of one segment is half a sample period.
///
/// Every method that advances or reconfigures the tract takes `&mut self`: one instance
/// is stepped strictly in order by one caller at a time. Independent voices use
/// independent instances.
#[derive(Debug, Clone)]
pub struct Tract {
    parms: TractParms,
    /// current diameters, what the coefficients are derived from
    geometry: TractGeometry,
    /// diameters that [`Tract::articulate`] moves towards
    target: TractGeometry,
    coefficients: ScatteringCoefficients,
    state: WaveState,
    /// instance-owned output of [`Tract::process`]
    output: Vec<f32>,
}

impl Tract {
    /// Creates a silent tract with the given shape.
    ///
    /// # Errors
    /// [`TractError::InvalidGeometry`] or [`TractError::UnstableConfiguration`] if the shape
    /// or the parameters would not give a decaying recurrence.
    pub fn new(geometry: TractGeometry, parms: TractParms) -> TractResult<Self> {
        let coefficients = derive_coefficients(&geometry, &parms)
            .inspect_err(|err| warn!(error = %err, "rejected tract configuration"))?;
        let state = WaveState::new(geometry.buccal.len(), geometry.nasal.len());
        debug!(
            buccal = geometry.buccal.len(),
            nasal = geometry.nasal.len(),
            velum_index = parms.velum_index,
            "created tract"
        );
        Ok(Tract {
            target: geometry.clone(),
            geometry,
            parms,
            coefficients,
            state,
            output: Vec::new(),
        })
    }

    /// Replaces the shape and parameters and silences the tract.
    ///
    /// # Errors
    /// As [`Tract::new`]. On error the tract is left unchanged.
    pub fn configure(&mut self, geometry: TractGeometry, parms: TractParms) -> TractResult<()> {
        let coefficients = derive_coefficients(&geometry, &parms)
            .inspect_err(|err| warn!(error = %err, "rejected tract configuration"))?;
        if geometry.buccal.len() == self.geometry.buccal.len()
            && geometry.nasal.len() == self.geometry.nasal.len()
        {
            self.state.reset();
        } else {
            self.state = WaveState::new(geometry.buccal.len(), geometry.nasal.len());
        }
        self.coefficients = coefficients;
        self.target = geometry.clone();
        self.geometry = geometry;
        self.parms = parms;
        debug!("reconfigured tract");
        Ok(())
    }

    /// Zeroes the wave state, keeping the shape.
    pub fn reset(&mut self) {
        self.state.reset();
        debug!("reset tract");
    }

    /// Changes the velopharyngeal coefficients without touching the wave state.
    ///
    /// # Errors
    /// [`TractError::UnstableConfiguration`] for a coefficient with magnitude of 1 or more.
    pub fn set_velum(&mut self, velum: VelumCoefficients) -> TractResult<()> {
        check_velum(&velum).inspect_err(|err| warn!(error = %err, "rejected velum"))?;
        self.parms.velum = velum;
        self.coefficients.velum = velum;
        debug!(?velum, "changed velum");
        Ok(())
    }

    /// Opens (engages the nasal chain) or closes the velum.
    ///
    /// # Errors
    /// [`TractError::UnstableConfiguration`] when opening with unstable velum coefficients.
    pub fn set_nasal_enabled(&mut self, enabled: bool) -> TractResult<()> {
        if enabled {
            check_velum(&self.parms.velum)
                .inspect_err(|err| warn!(error = %err, "rejected velum"))?;
        }
        self.parms.nasal_enabled = enabled;
        self.coefficients.nasal_enabled = enabled;
        debug!(enabled, "switched nasal branch");
        Ok(())
    }

    /// Sets the shape that [`Tract::articulate`] moves towards.
    ///
    /// # Errors
    /// [`TractError::InvalidGeometry`] if the target has other chain lengths or a
    /// non-positive diameter.
    pub fn set_target(&mut self, target: TractGeometry) -> TractResult<()> {
        let checked = target.validate().and_then(|()| {
            if target.buccal.len() != self.geometry.buccal.len() {
                return Err(TractError::geometry(
                    "target buccal length",
                    target.buccal.len() as f32,
                ));
            }
            if target.nasal.len() != self.geometry.nasal.len() {
                return Err(TractError::geometry(
                    "target nasal length",
                    target.nasal.len() as f32,
                ));
            }
            Ok(())
        });
        checked.inspect_err(|err| warn!(error = %err, "rejected target shape"))?;
        self.target = target;
        Ok(())
    }

    /// Moves the shape towards the target for `delta_time` seconds and recomputes the
    /// coefficients. Meant to be called between blocks; the wave state is kept.
    ///
    /// Returns true while the shape is still moving.
    ///
    /// # Errors
    /// [`TractError::InvalidGeometry`] for a negative or non-finite `delta_time`.
    pub fn articulate(&mut self, delta_time: f32) -> TractResult<bool> {
        if !(delta_time >= 0.0) || delta_time.is_infinite() {
            let err = TractError::geometry("delta_time", delta_time);
            warn!(error = %err, "rejected articulation step");
            return Err(err);
        }
        let amount = delta_time * self.parms.movement_speed;
        let mut geometry = self.geometry.clone();
        let moving = reshape(
            &mut geometry.buccal,
            &self.target.buccal,
            amount,
            self.parms.velum_index,
        ) | reshape_uniform(&mut geometry.nasal, &self.target.nasal, amount);

        self.coefficients = derive_coefficients(&geometry, &self.parms)
            .inspect_err(|err| warn!(error = %err, "articulation left a degenerate shape"))?;
        self.geometry = geometry;
        debug!(moving, "articulated tract");
        Ok(moving)
    }

    /// Runs one output sample: two half-sample steps, then the output mix.
    pub fn tick(&mut self, excitation: f32, noise: f32) -> f32 {
        // run step twice per sample
        self.state.step(&self.coefficients, excitation, noise);
        self.state.step(&self.coefficients, excitation, noise);
        self.mix()
    }

    /// Advances the tract by `block_size` samples.
    ///
    /// The returned slice is owned by the tract and borrows it, so it stays valid until the
    /// tract is used again; copy it out to keep it longer.
    ///
    /// # Errors
    /// [`TractError::BufferLengthMismatch`] unless both inputs hold exactly `block_size`
    /// samples. Nothing is processed on error.
    pub fn process(
        &mut self,
        excitation: &[f32],
        noise: &[f32],
        block_size: usize,
    ) -> TractResult<&[f32]> {
        check_lengths(excitation, noise, block_size)?;
        let mut output = core::mem::take(&mut self.output);
        output.clear();
        output.extend(
            excitation
                .iter()
                .zip(noise)
                .map(|(&e, &n)| self.tick(e, n)),
        );
        self.output = output;
        Ok(&self.output)
    }

    /// Advances the tract by `output.len()` samples into caller-provided storage.
    ///
    /// # Errors
    /// [`TractError::BufferLengthMismatch`] unless all three buffers have the same length.
    /// Nothing is processed on error.
    pub fn process_into(
        &mut self,
        excitation: &[f32],
        noise: &[f32],
        output: &mut [f32],
    ) -> TractResult<()> {
        check_lengths(excitation, noise, output.len())?;
        for ((out, &e), &n) in output.iter_mut().zip(excitation).zip(noise) {
            *out = self.tick(e, n);
        }
        Ok(())
    }

    /// The placeholder output mix: a weighted sum of the lip and nostril outputs.
    fn mix(&self) -> f32 {
        let mix = &self.parms.mix;
        let labial = mix.labial_gain * self.state.buccal.output();
        if self.coefficients.nasal_enabled {
            labial + mix.nasal_gain * self.state.nasal.output()
        } else {
            labial
        }
    }

    /// The current parameters.
    #[must_use]
    pub fn parms(&self) -> &TractParms {
        &self.parms
    }

    /// The current shape.
    #[must_use]
    pub fn geometry(&self) -> &TractGeometry {
        &self.geometry
    }

    /// The shape [`Tract::articulate`] is moving towards.
    #[must_use]
    pub fn target(&self) -> &TractGeometry {
        &self.target
    }

    /// The scattering coefficients derived from the current shape and parameters.
    #[must_use]
    pub fn coefficients(&self) -> &ScatteringCoefficients {
        &self.coefficients
    }

    /// The traveling waves of both chains.
    #[must_use]
    pub fn state(&self) -> &WaveState {
        &self.state
    }
}

fn check_lengths(excitation: &[f32], noise: &[f32], expected: usize) -> TractResult<()> {
    if excitation.len() != expected || noise.len() != expected {
        let err = TractError::BufferLengthMismatch {
            excitation: excitation.len(),
            noise: noise.len(),
            expected,
        };
        warn!(error = %err, "rejected block");
        return Err(err);
    }
    Ok(())
}

/// Validates a shape and its parameters and derives every coefficient the step reads.
fn derive_coefficients(
    geometry: &TractGeometry,
    parms: &TractParms,
) -> TractResult<ScatteringCoefficients> {
    geometry.validate()?;
    parms.validate()?;

    let n = geometry.buccal.len();
    let v = parms.velum_index;
    if v == 0 || v >= n {
        return Err(TractError::geometry("velum_index", v as f32));
    }
    if let Some(frication) = parms.frication {
        let position = frication.position;
        if !(position >= 0.0) || floorf(position) + 2.0 >= n as f32 {
            return Err(TractError::geometry("frication position", position));
        }
        if !frication.diameter.is_finite() {
            return Err(TractError::geometry("frication diameter", frication.diameter));
        }
    }

    let buccal = chain_reflections(&geometry.buccal_areas())?;
    let nasal = chain_reflections(&geometry.nasal_areas())?;
    // rounding can push a reflection between very unequal areas onto +-1
    for &k in &buccal {
        check_coefficient("buccal reflection", k)?;
    }
    for &k in &nasal {
        check_coefficient("nasal reflection", k)?;
    }

    Ok(ScatteringCoefficients {
        buccal,
        nasal,
        glottal: parms.glottal_k,
        labial: parms.labial_k,
        nares: parms.nasal_k,
        velum: parms.velum,
        attenuation: parms.attenuation,
        velum_index: v,
        nasal_enabled: parms.nasal_enabled,
        frication: parms.frication,
    })
}
