//! Tract parameters.

use crate::error::{TractError, TractResult};

/// Coefficient of reflection at the glottis.
pub const GLOTTAL_K: f32 = 0.7;
/// Coefficient of reflection at the labia.
pub const LABIAL_K: f32 = -0.85;
/// Coefficient of reflection at the nares.
pub const NASAL_K: f32 = -0.9;
/// The index of the buccal junction that connects the pharyngeal and nasal cavities.
pub const VELUM_INDEX: usize = 17;
/// The coefficient of sonic attenuation per half-sample.
pub const ATTENUATION: f32 = 0.9999;
/// How fast the tract reshapes, in diameter units per second.
pub const MOVEMENT_SPEED: f32 = 15.0;

/// Coefficients of the three-port velopharyngeal junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelumCoefficients {
    /// left-moving coefficient (`velumKL`), recirculation back into the pharynx
    pub left: f32,
    /// right-moving coefficient (`velumKR`), transmission on into the mouth
    pub right: f32,
    /// coefficient of the nasal port
    pub nose: f32,
}

impl VelumCoefficients {
    /// Derives the coefficients from the areas meeting at the junction.
    ///
    /// `left` is the area of the segment behind the velum, `right` the segment in front of it
    /// and `nose` the first nasal segment. Each coefficient is `(2 * a - sum) / sum`.
    #[must_use]
    pub fn from_areas(left: f32, right: f32, nose: f32) -> Self {
        let sum = left + right + nose;
        VelumCoefficients {
            left: (2.0 * left - sum) / sum,
            right: (2.0 * right - sum) / sum,
            nose: (2.0 * nose - sum) / sum,
        }
    }
}

impl Default for VelumCoefficients {
    /// Fully transmissive: the nasal branch is always engaged.
    fn default() -> Self {
        VelumCoefficients {
            left: 0.0,
            right: 0.0,
            nose: NASAL_K,
        }
    }
}

/// Where turbulence noise enters the buccal chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frication {
    /// fractional segment index of the constriction
    pub position: f32,
    /// diameter of the constriction; noise peaks between 0.3 and 0.7
    pub diameter: f32,
}

/// How the two radiated outputs are combined into one sample.
///
/// Both gains default to 1, a plain sum of the lip and nostril outputs. This rule is a
/// placeholder and has not been calibrated against recordings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMix {
    /// gain on the right-moving wave leaving the last buccal segment
    pub labial_gain: f32,
    /// gain on the right-moving wave leaving the last nasal segment
    pub nasal_gain: f32,
}

impl Default for OutputMix {
    fn default() -> Self {
        OutputMix {
            labial_gain: 1.0,
            nasal_gain: 1.0,
        }
    }
}

/// Parameters for a tract instance.
#[derive(Debug, Clone, PartialEq)]
pub struct TractParms {
    /// reflection at the glottis, 0 .. 1, typically 0.7
    pub glottal_k: f32,
    /// reflection at the lips, -1 .. 0, typically -0.85
    pub labial_k: f32,
    /// reflection at the nares, -1 .. 0, typically -0.9
    pub nasal_k: f32,
    /// velopharyngeal junction coefficients
    pub velum: VelumCoefficients,
    /// per-half-sample loss, below 1, typically 0.9999
    pub attenuation: f32,
    /// buccal junction where the nasal cavity branches off, typically 17
    pub velum_index: usize,
    /// false = velum closed, the nasal chain is cut off from the tract and drains
    pub nasal_enabled: bool,
    /// turbulence injection point, or `None` to ignore the noise input
    pub frication: Option<Frication>,
    /// output mixing rule
    pub mix: OutputMix,
    /// articulation speed in diameter units per second
    pub movement_speed: f32,
}

impl Default for TractParms {
    fn default() -> Self {
        TractParms {
            glottal_k: GLOTTAL_K,
            labial_k: LABIAL_K,
            nasal_k: NASAL_K,
            velum: VelumCoefficients::default(),
            attenuation: ATTENUATION,
            velum_index: VELUM_INDEX,
            nasal_enabled: true,
            frication: None,
            mix: OutputMix::default(),
            movement_speed: MOVEMENT_SPEED,
        }
    }
}

impl TractParms {
    /// Checks everything that does not depend on the geometry.
    ///
    /// # Errors
    /// [`TractError::UnstableConfiguration`] for a coefficient with magnitude of 1 or more,
    /// or an attenuation outside `0 .. 1`.
    pub fn validate(&self) -> TractResult<()> {
        check_coefficient("glottal_k", self.glottal_k)?;
        check_coefficient("labial_k", self.labial_k)?;
        check_coefficient("nasal_k", self.nasal_k)?;
        if self.nasal_enabled {
            check_velum(&self.velum)?;
        }
        if !(0.0..1.0).contains(&self.attenuation) {
            return Err(TractError::unstable("attenuation", self.attenuation));
        }
        if !(self.movement_speed >= 0.0) || self.movement_speed.is_infinite() {
            return Err(TractError::geometry("movement_speed", self.movement_speed));
        }
        Ok(())
    }
}

pub(crate) fn check_velum(velum: &VelumCoefficients) -> TractResult<()> {
    check_coefficient("velum.left", velum.left)?;
    check_coefficient("velum.right", velum.right)?;
    check_coefficient("velum.nose", velum.nose)
}

/// Rejects NaN and any magnitude of 1 or more.
pub(crate) fn check_coefficient(what: &'static str, k: f32) -> TractResult<()> {
    if !(k > -1.0 && k < 1.0) {
        return Err(TractError::unstable(what, k));
    }
    Ok(())
}
