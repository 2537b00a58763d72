//! No-op kernel backend.
//!
//! Same names and signatures as the real backend. No computation, no
//! state, no side effects: outputs are left exactly as the caller passed
//! them.

use crate::sample::ComplexSample;

pub const BACKEND: &str = "stub";

pub const fn is_accelerated() -> bool {
    false
}

/// `c[i] = a[i] * scalar` (complex × complex scalar).
#[inline]
pub fn volk_32fc_s32fc_multiply_32fc(
    _c_out: &mut [ComplexSample],
    _a: &[ComplexSample],
    _scalar: ComplexSample,
    _num_points: usize,
) {
}

/// `c[i] = a[i] * b[i]` (complex × real).
#[inline]
pub fn volk_32fc_32f_multiply_32fc(
    _c_out: &mut [ComplexSample],
    _a: &[ComplexSample],
    _b: &[f32],
    _num_points: usize,
) {
}

/// `i[k] = complex[k].re`
#[inline]
pub fn volk_32fc_deinterleave_real_32f(
    _i_out: &mut [f32],
    _complex_in: &[ComplexSample],
    _num_points: usize,
) {
}

/// `q[k] = complex[k].im`
#[inline]
pub fn volk_32fc_deinterleave_imag_32f(
    _q_out: &mut [f32],
    _complex_in: &[ComplexSample],
    _num_points: usize,
) {
}
