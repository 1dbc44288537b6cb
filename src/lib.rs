//! Kelly-Lochbaum digital waveguide vocal tract in Rust.
//!
//! *NOTE*: This is _not_ a text-to-speech engine, nor a glottal source.
//! It filters a glottal excitation (plus optional turbulence noise) through a simulated
//! pharyngeal/buccal tube with a nasal branch at the velum, one output sample per input
//! sample. See the `render_vowel` demo on how to use this.
//!
//! ```
//! use vocal_tract::{Tract, TractGeometry, TractParms};
//!
//! let mut tract = Tract::new(TractGeometry::default(), TractParms::default()).unwrap();
//! let excitation = [1.0, 0.0, 0.0, 0.0];
//! let noise = [0.0; 4];
//! let out = tract.process(&excitation, &noise, 4).unwrap();
//! assert_eq!(out.len(), 4);
//! ```
//!
//! ## `no_std`
//!
//! This library is `no_std` compatible with the `libm` feature.
//! `alloc` is required for the segment buffers.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(clippy::all, clippy::pedantic, unsafe_code)]
// fine for us since loss of precision/sign is not that important, as long as it's the same every time.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
// articulation lands exactly on its targets and silence is exactly zero
#![allow(clippy::float_cmp)]

#[cfg(all(feature = "std", feature = "libm"))]
compile_error!("Features \"std\" and \"libm\" are mutually exclusive.");

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Must specify a math feature: either \"std\" or \"libm\".");

extern crate alloc;

mod articulation;
pub use articulation::move_towards;
mod error;
pub use error::{TractError, TractResult};
mod geometry;
pub use geometry::{
    BUCCAL_LENGTH, NASAL_LENGTH, TractGeometry, area, ease, reflection, try_reflection,
};
mod math;
mod noise;
pub use noise::{NoiseField, noise2d};
mod parms;
pub use parms::{
    ATTENUATION, Frication, GLOTTAL_K, LABIAL_K, MOVEMENT_SPEED, NASAL_K, OutputMix, TractParms,
    VELUM_INDEX, VelumCoefficients,
};
mod tract;
pub use tract::Tract;
mod waveguide;
pub use waveguide::{Chain, ScatteringCoefficients, WaveState};
