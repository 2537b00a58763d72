//! `libvolk` backend.
//!
//! VOLK exports each kernel as a global function pointer that its runtime
//! dispatcher fills with the best implementation for the host CPU. We read
//! the pointer and call through it. `ComplexSample` is `#[repr(C)]` and
//! matches `lv_32fc_t` (`float _Complex`) in size, alignment and
//! by-value passing on the supported targets.

#![allow(unsafe_code)]

use std::os::raw::c_uint;

use crate::sample::ComplexSample;

pub const BACKEND: &str = "volk";

pub const fn is_accelerated() -> bool {
    true
}

mod sys {
    use std::os::raw::c_uint;

    use crate::sample::ComplexSample;

    pub type P32fcS32fcMultiply32fc =
        unsafe extern "C" fn(*mut ComplexSample, *const ComplexSample, ComplexSample, c_uint);
    pub type P32fc32fMultiply32fc =
        unsafe extern "C" fn(*mut ComplexSample, *const ComplexSample, *const f32, c_uint);
    pub type P32fcDeinterleave32f = unsafe extern "C" fn(*mut f32, *const ComplexSample, c_uint);

    #[allow(non_upper_case_globals)]
    #[link(name = "volk")]
    extern "C" {
        pub static volk_32fc_s32fc_multiply_32fc: P32fcS32fcMultiply32fc;
        pub static volk_32fc_32f_multiply_32fc: P32fc32fMultiply32fc;
        pub static volk_32fc_deinterleave_real_32f: P32fcDeinterleave32f;
        pub static volk_32fc_deinterleave_imag_32f: P32fcDeinterleave32f;
    }
}

fn points(num_points: usize, lens: &[usize]) -> c_uint {
    let n = lens.iter().fold(num_points, |n, &len| n.min(len));
    c_uint::try_from(n).unwrap_or(c_uint::MAX)
}

/// `c[i] = a[i] * scalar` (complex × complex scalar).
#[inline]
pub fn volk_32fc_s32fc_multiply_32fc(
    c_out: &mut [ComplexSample],
    a: &[ComplexSample],
    scalar: ComplexSample,
    num_points: usize,
) {
    let n = points(num_points, &[c_out.len(), a.len()]);
    // SAFETY: both buffers hold at least `n` elements; VOLK initialises the
    // pointer before any Rust code can run.
    unsafe { (sys::volk_32fc_s32fc_multiply_32fc)(c_out.as_mut_ptr(), a.as_ptr(), scalar, n) }
}

/// `c[i] = a[i] * b[i]` (complex × real).
#[inline]
pub fn volk_32fc_32f_multiply_32fc(
    c_out: &mut [ComplexSample],
    a: &[ComplexSample],
    b: &[f32],
    num_points: usize,
) {
    let n = points(num_points, &[c_out.len(), a.len(), b.len()]);
    // SAFETY: all three buffers hold at least `n` elements.
    unsafe { (sys::volk_32fc_32f_multiply_32fc)(c_out.as_mut_ptr(), a.as_ptr(), b.as_ptr(), n) }
}

/// `i[k] = complex[k].re`
#[inline]
pub fn volk_32fc_deinterleave_real_32f(
    i_out: &mut [f32],
    complex_in: &[ComplexSample],
    num_points: usize,
) {
    let n = points(num_points, &[i_out.len(), complex_in.len()]);
    // SAFETY: both buffers hold at least `n` elements.
    unsafe { (sys::volk_32fc_deinterleave_real_32f)(i_out.as_mut_ptr(), complex_in.as_ptr(), n) }
}

/// `q[k] = complex[k].im`
#[inline]
pub fn volk_32fc_deinterleave_imag_32f(
    q_out: &mut [f32],
    complex_in: &[ComplexSample],
    num_points: usize,
) {
    let n = points(num_points, &[q_out.len(), complex_in.len()]);
    // SAFETY: both buffers hold at least `n` elements.
    unsafe { (sys::volk_32fc_deinterleave_imag_32f)(q_out.as_mut_ptr(), complex_in.as_ptr(), n) }
}
