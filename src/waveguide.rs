//! Traveling-wave state and the Kelly-Lochbaum junction step.
//!
//! # Formulas:
//! ## Variables:
//! ```text
//!    R[m], L[m] = right- and left-moving waves in segment m
//!    K[m]       = reflection at the junction between segments m-1 and m
//!    jR, jL     = junction outputs, recomputed every half-sample
//!    a          = attenuation per half-sample
//! ```
//! ## Two-port junction:
//! ```text
//!    w     = K[m] * (R[m-1] + L[m])
//!    jR[m] = R[m-1] - w
//!    jL[m] = L[m] + w
//! ```
//! ## Propagation:
//! ```text
//!    R[m] = jR[m] * a
//!    L[m] = jL[m+1] * a
//! ```
//! One half-sample moves every wave by exactly one segment, so a round trip through a
//! chain of `N` segments takes `2N` half-samples.

use alloc::{vec, vec::Vec};

use crate::math::floorf;
use crate::parms::{Frication, VelumCoefficients};

/// Everything the junction step reads but never writes.
///
/// Fields are public so the raw kernel can be driven with any values; the validated path
/// is [`Tract`](crate::Tract), which builds these from a geometry and checks stability.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringCoefficients {
    /// internal buccal reflections, slot `m` joins segments `m-1` and `m`, slot 0 unused
    pub buccal: Vec<f32>,
    /// internal nasal reflections, same layout as `buccal`
    pub nasal: Vec<f32>,
    /// reflection at the glottis
    pub glottal: f32,
    /// reflection at the lips
    pub labial: f32,
    /// reflection at the nares
    pub nares: f32,
    /// velopharyngeal junction
    pub velum: VelumCoefficients,
    /// loss per half-sample
    pub attenuation: f32,
    /// buccal junction where the nasal chain branches off
    pub velum_index: usize,
    /// false = velum closed, the velum index acts as a plain two-port junction and the
    /// nasal chain drains through an absorbing velum end
    pub nasal_enabled: bool,
    /// turbulence injection point
    pub frication: Option<Frication>,
}

/// A line of segments through which sound propagates.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Left-moving components at each segment.
    pub left: Vec<f32>,
    /// Right-moving components at each segment.
    pub right: Vec<f32>,
    /// Left-moving junction outputs, one more than segments.
    j_left: Vec<f32>,
    /// Right-moving junction outputs, one more than segments.
    j_right: Vec<f32>,
}

impl Chain {
    fn new(size: usize) -> Self {
        Chain {
            left: vec![0.0; size],
            right: vec![0.0; size],
            j_left: vec![0.0; size + 1],
            j_right: vec![0.0; size + 1],
        }
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.right.len()
    }

    /// True for a chain without segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }

    /// The right-moving wave leaving the far end of the chain.
    #[must_use]
    pub fn output(&self) -> f32 {
        self.right.last().copied().unwrap_or(0.0)
    }

    fn clear(&mut self) {
        self.left.fill(0.0);
        self.right.fill(0.0);
        self.j_left.fill(0.0);
        self.j_right.fill(0.0);
    }

    /// Two-port scattering at every internal junction except `skip`.
    fn scatter(&mut self, k: &[f32], skip: Option<usize>) {
        for m in 1..self.len() {
            if Some(m) == skip {
                continue;
            }
            // reflection
            let w = k[m] * (self.right[m - 1] + self.left[m]);
            self.j_right[m] = self.right[m - 1] - w;
            self.j_left[m] = self.left[m] + w;
        }
    }

    /// Moves every wave one segment along, losing `attenuation` on the way.
    /// Subnormal results are flushed to zero so a decaying tail ends in silence.
    fn shift(&mut self, attenuation: f32) {
        for m in 0..self.len() {
            self.right[m] = flush(self.j_right[m] * attenuation);
            self.left[m] = flush(self.j_left[m + 1] * attenuation);
        }
    }

    /// Sum of squared samples in both directions.
    #[must_use]
    pub fn energy(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|x| x * x)
            .sum()
    }
}

fn flush(x: f32) -> f32 {
    if x.is_subnormal() { 0.0 } else { x }
}

/// The persistent state of one tract: both cavities' traveling waves.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveState {
    /// Glottal, pharyngeal and buccal segments.
    pub buccal: Chain,
    /// Nasal segments, velum first.
    pub nasal: Chain,
}

impl WaveState {
    /// A silent state for chains of the given lengths.
    #[must_use]
    pub fn new(buccal_length: usize, nasal_length: usize) -> Self {
        WaveState {
            buccal: Chain::new(buccal_length),
            nasal: Chain::new(nasal_length),
        }
    }

    /// Zeroes every wave.
    pub fn reset(&mut self) {
        self.buccal.clear();
        self.nasal.clear();
    }

    /// Sum of squared samples across both directions of both chains.
    #[must_use]
    pub fn energy(&self) -> f32 {
        self.buccal.energy() + self.nasal.energy()
    }

    /// True when every wave sample is exactly zero.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        [&self.buccal, &self.nasal]
            .iter()
            .all(|c| c.left.iter().chain(c.right.iter()).all(|&x| x == 0.0))
    }

    /// Simulates the propagation of sound through the tract for one half-sample.
    ///
    /// The chain lengths of `k` must match this state and `0 < k.velum_index < N`; the
    /// recurrence applies no clamping, so `|k| < 1` and `attenuation < 1` are up to the caller.
    pub fn step(&mut self, k: &ScatteringCoefficients, excitation: f32, noise: f32) {
        if let Some(frication) = k.frication {
            self.add_frication(frication, noise);
        }

        let oral = &mut self.buccal;
        let nasal = &mut self.nasal;
        let n = oral.len();
        let v = k.velum_index;

        // Glottal excitation enters left and labial reflection enters right
        oral.j_right[0] = oral.left[0] * k.glottal + excitation;
        oral.j_left[n] = oral.right[n - 1] * k.labial;

        oral.scatter(&k.buccal, k.nasal_enabled.then_some(v));

        if k.nasal_enabled {
            let VelumCoefficients { left, right, nose } = k.velum;
            oral.j_left[v] =
                left * oral.right[v - 1] + (1.0 + left) * (nasal.left[0] + oral.left[v]);
            oral.j_right[v] =
                right * oral.left[v] + (1.0 + right) * (oral.right[v - 1] + nasal.left[0]);
            nasal.j_right[0] =
                nose * nasal.left[0] + (1.0 + nose) * (oral.left[v] + oral.right[v - 1]);
        } else {
            // closed velum end absorbs
            nasal.j_right[0] = 0.0;
        }

        oral.shift(k.attenuation);

        let m = nasal.len();
        nasal.j_left[m] = nasal.right[m - 1] * k.nares;
        nasal.scatter(&k.nasal, None);
        nasal.shift(k.attenuation);
    }

    /// Adds turbulence at a constriction, split between the two segments after it.
    fn add_frication(&mut self, frication: Frication, noise: f32) {
        let Frication { position, diameter } = frication;
        let i = floorf(position);
        let delta = position - i;
        let i = i as usize;
        if position < 0.0 || i + 2 >= self.buccal.len() {
            return;
        }
        let thinness = (8.0 * (0.7 - diameter)).clamp(0.0, 1.0);
        let openness = (30.0 * (diameter - 0.3)).clamp(0.0, 1.0);
        // halved for the left/right split
        let noise = noise * 0.5 * thinness * openness / 2.0;
        let noise0 = noise * (1.0 - delta);
        let noise1 = noise * delta;
        self.buccal.right[i + 1] += noise0;
        self.buccal.left[i + 1] += noise0;
        self.buccal.right[i + 2] += noise1;
        self.buccal.left[i + 2] += noise1;
    }
}
