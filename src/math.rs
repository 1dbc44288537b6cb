//! Core math functions for the waveguide.
//! If the `libm` feature is enabled, this just exports the required functions.
//! If the `std` feature is enabled, this converts the syntax from the std variety: `f.powf(e)` into
//! the `libm` equiv. `powf(f, e)`.

#[cfg(feature = "libm")]
pub(crate) use libm::{floor, floorf, powf, roundf};

#[cfg(feature = "std")]
pub(crate) fn powf(f: f32, e: f32) -> f32 {
    f.powf(e)
}
#[cfg(feature = "std")]
pub(crate) fn floorf(f: f32) -> f32 {
    f.floor()
}
#[cfg(feature = "std")]
pub(crate) fn roundf(f: f32) -> f32 {
    f.round()
}
#[cfg(feature = "std")]
pub(crate) fn floor(f: f64) -> f64 {
    f.floor()
}
