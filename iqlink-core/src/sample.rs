//! Complex IQ sample type and flat-array conversion helpers.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// One in-phase/quadrature measurement.
///
/// `#[repr(C)]` keeps the layout identical to the engine's interleaved
/// `{ float re; float im; }` pair.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexSample {
    pub re: f32,
    pub im: f32,
}

impl ComplexSample {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Squared magnitude, `re² + im²`.
    pub fn norm_sqr(self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

impl From<(f32, f32)> for ComplexSample {
    fn from((re, im): (f32, f32)) -> Self {
        Self { re, im }
    }
}

/// Split `samples` into real and imaginary components, in lock-step.
///
/// Both output slices must hold at least `samples.len()` values; extra
/// capacity is left untouched. Returns the number of samples written.
///
/// Allocation-free, so it is safe to call from inside a stream callback.
///
/// # Errors
/// `BridgeError::BufferTooSmall` if either output is shorter than the
/// input. Nothing is written in that case.
pub fn complex_to_float_arrays(
    samples: &[ComplexSample],
    real_out: &mut [f32],
    imag_out: &mut [f32],
) -> Result<usize> {
    let count = samples.len();
    let available = real_out.len().min(imag_out.len());
    if available < count {
        return Err(BridgeError::BufferTooSmall {
            needed: count,
            available,
        });
    }

    for ((sample, re), im) in samples
        .iter()
        .zip(real_out.iter_mut())
        .zip(imag_out.iter_mut())
    {
        *re = sample.re;
        *im = sample.im;
    }
    Ok(count)
}

/// Allocating variant of [`complex_to_float_arrays`] for host-side code.
pub fn split_components(samples: &[ComplexSample]) -> (Vec<f32>, Vec<f32>) {
    samples.iter().map(|s| (s.re, s.im)).unzip()
}
