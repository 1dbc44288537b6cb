//! Tube geometry and the Kelly-Lochbaum coefficient utilities.

use alloc::{vec, vec::Vec};
use core::f32::consts::PI;

use crate::error::{TractError, TractResult};
use crate::math::powf;

/// Number of segments in the reference buccal/pharyngeal chain.
pub const BUCCAL_LENGTH: usize = 44;
/// Number of segments in the reference nasal chain.
pub const NASAL_LENGTH: usize = 28;

/// Widest diameter of the resting oral cavity.
const ORAL_DIAMETER: f32 = 3.0;
/// The glottal diameter relative to the maximum oral diameter.
const RATIO_GLOTTAL_DIAMETER: f32 = 0.166_67;
/// The pharyngeal diameter relative to the maximum oral diameter.
const RATIO_PHARYNGEAL_DIAMETER: f32 = 0.666_67;
/// Widest section of the nasal cavity before scaling.
const NASAL_MAX_DIAMETER: f32 = 1.2;

/// Returns the circular cross-sectional area for a given diameter.
///
/// `area(0) == 0` and the function is monotonically increasing for `d >= 0`.
#[must_use]
pub fn area(diameter: f32) -> f32 {
    diameter * diameter / 4.0 * PI
}

/// Returns the Kelly-Lochbaum coefficient of reflection between two cross-sectional areas.
///
/// The result lies in `(-1, 1)` for positive areas and is undefined when `a + b == 0`;
/// use [`try_reflection`] where the areas are not known to be positive.
#[must_use]
pub fn reflection(a: f32, b: f32) -> f32 {
    (a - b) / (a + b)
}

/// Checked form of [`reflection`].
///
/// # Errors
/// [`TractError::InvalidGeometry`] if either area is non-positive or not finite.
pub fn try_reflection(a: f32, b: f32) -> TractResult<f32> {
    check_positive("area", a)?;
    check_positive("area", b)?;
    Ok(reflection(a, b))
}

/// Returns an eased value in range `[0, 1]`: `0` at `x == 0`, otherwise `2^(10x - 10)`.
#[must_use]
pub fn ease(x: f32) -> f32 {
    if x == 0.0 { 0.0 } else { powf(2.0, 10.0 * x - 10.0) }
}

fn check_positive(what: &'static str, value: f32) -> TractResult<()> {
    // `!(value > 0.0)` also catches NaN
    if !(value > 0.0) || value.is_infinite() {
        return Err(TractError::geometry(what, value));
    }
    Ok(())
}

/// Segment diameters of both cavities.
#[derive(Debug, Clone, PartialEq)]
pub struct TractGeometry {
    /// Diameters of the glottal, pharyngeal and buccal segments, glottis first.
    pub buccal: Vec<f32>,
    /// Diameters of the nasal segments, velum first.
    pub nasal: Vec<f32>,
}

impl TractGeometry {
    /// A uniform tube: every segment of each chain has the same diameter.
    #[must_use]
    pub fn uniform(
        buccal_length: usize,
        buccal_diameter: f32,
        nasal_length: usize,
        nasal_diameter: f32,
    ) -> Self {
        TractGeometry {
            buccal: vec![buccal_diameter; buccal_length],
            nasal: vec![nasal_diameter; nasal_length],
        }
    }

    /// The resting shape: an eased glottal flare into a narrow pharynx and an open mouth,
    /// with a nasal cavity that widens towards its middle and tapers at the nares.
    #[must_use]
    pub fn neutral(buccal_length: usize, nasal_length: usize) -> Self {
        let glottal_end = buccal_length as f32 / 6.0;
        let pharyngeal_end = buccal_length as f32 / 3.0;
        let glottal_diameter = ORAL_DIAMETER * RATIO_GLOTTAL_DIAMETER;
        let pharyngeal_diameter = ORAL_DIAMETER * RATIO_PHARYNGEAL_DIAMETER;
        let glottal_difference = pharyngeal_diameter - glottal_diameter;

        let buccal = (0..buccal_length)
            .map(|m| {
                let m = m as f32;
                if m < glottal_end {
                    glottal_diameter + ease(m / glottal_end) * glottal_difference
                } else if m < pharyngeal_end {
                    pharyngeal_diameter
                } else {
                    ORAL_DIAMETER
                }
            })
            .collect();

        let scale = nasal_length as f32 / NASAL_LENGTH as f32;
        let nasal = (0..nasal_length)
            .map(|i| {
                let d = 2.0 * (i as f32 / nasal_length as f32);
                let diameter = if d < 1.0 {
                    0.4 + 1.6 * d
                } else {
                    0.2 + 1.2 * (2.0 - d)
                };
                diameter.min(NASAL_MAX_DIAMETER) * scale
            })
            .collect();

        TractGeometry { buccal, nasal }
    }

    /// Checks that both chains are long enough and every diameter is positive.
    ///
    /// # Errors
    /// [`TractError::InvalidGeometry`] naming the first offending chain.
    pub fn validate(&self) -> TractResult<()> {
        if self.buccal.len() < 2 {
            return Err(TractError::geometry("buccal length", self.buccal.len() as f32));
        }
        if self.nasal.len() < 2 {
            return Err(TractError::geometry("nasal length", self.nasal.len() as f32));
        }
        for &d in &self.buccal {
            check_positive("buccal diameter", d)?;
        }
        for &d in &self.nasal {
            check_positive("nasal diameter", d)?;
        }
        Ok(())
    }

    /// Cross-sectional areas of the buccal chain.
    #[must_use]
    pub fn buccal_areas(&self) -> Vec<f32> {
        self.buccal.iter().copied().map(area).collect()
    }

    /// Cross-sectional areas of the nasal chain.
    #[must_use]
    pub fn nasal_areas(&self) -> Vec<f32> {
        self.nasal.iter().copied().map(area).collect()
    }
}

impl Default for TractGeometry {
    fn default() -> Self {
        TractGeometry::neutral(BUCCAL_LENGTH, NASAL_LENGTH)
    }
}

/// Internal reflection coefficients of a chain of areas.
///
/// Slot `m` holds the coefficient of the junction between segments `m - 1` and `m`;
/// slot 0 belongs to a boundary and stays 0.
pub(crate) fn chain_reflections(areas: &[f32]) -> TractResult<Vec<f32>> {
    let mut k = vec![0.0; areas.len()];
    for m in 1..areas.len() {
        k[m] = try_reflection(areas[m - 1], areas[m])?;
    }
    Ok(k)
}
