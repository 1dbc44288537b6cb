//! Smooth movement of the tract towards a target shape.

use crate::math::roundf;

/// Where the tongue tip starts, relative to the buccal length.
const TIP_START_RATIO: f32 = 0.727;
/// How slowly the segments behind the velum return to rest.
const SLOW_RETURN_PHARYNX: f32 = 0.6;

/// Moves `current` towards `target` by at most `up` when rising or `down` when falling.
#[must_use]
pub fn move_towards(current: f32, target: f32, up: f32, down: f32) -> f32 {
    if current < target {
        (current + up).min(target)
    } else {
        (current - down).max(target)
    }
}

/// First segment of the tongue tip for a chain of `len` segments.
pub(crate) fn tip_start(len: usize) -> usize {
    roundf(len as f32 * TIP_START_RATIO) as usize
}

/// Opening speed of segment `m`: slow in the pharynx, full speed from the tongue tip on.
pub(crate) fn slow_return(m: usize, velum_index: usize, tip_start: usize) -> f32 {
    if m < velum_index {
        SLOW_RETURN_PHARYNX
    } else if m >= tip_start {
        1.0
    } else {
        SLOW_RETURN_PHARYNX
            + (1.0 - SLOW_RETURN_PHARYNX) * (m - velum_index) as f32
                / (tip_start - velum_index) as f32
    }
}

/// Moves every buccal diameter towards its target by `amount`, scaled per segment.
/// Closing always happens at twice the rate.
///
/// Returns true while any segment has not reached its target.
pub(crate) fn reshape(
    current: &mut [f32],
    target: &[f32],
    amount: f32,
    velum_index: usize,
) -> bool {
    let tip = tip_start(current.len());
    let mut moving = false;
    for (m, (d, &t)) in current.iter_mut().zip(target).enumerate() {
        *d = move_towards(*d, t, slow_return(m, velum_index, tip) * amount, 2.0 * amount);
        moving |= *d != t;
    }
    moving
}

/// Moves the nasal diameters towards their targets at the plain rate.
pub(crate) fn reshape_uniform(current: &mut [f32], target: &[f32], amount: f32) -> bool {
    let mut moving = false;
    for (d, &t) in current.iter_mut().zip(target) {
        *d = move_towards(*d, t, amount, amount);
        moving |= *d != t;
    }
    moving
}
