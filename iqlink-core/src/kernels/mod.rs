//! Accelerated-math kernel surface.
//!
//! Dependent code calls the `volk_*` functions re-exported here and never
//! names a backend module. The backend is picked at compile time:
//!
//! | Feature | Backend | Behaviour |
//! |---------|---------|-----------|
//! | *(none)* | [`stub`] | no-op bodies, links without the kernel library |
//! | `volk` | `volk` | forwards to the system `libvolk` dispatchers |
//!
//! Both backends export exactly the same items with exactly the same
//! signatures, so swapping is invisible to callers. Argument order follows
//! the C kernels: output first, then inputs, then `num_points`. Slices
//! replace raw pointers; `num_points` is clamped to the shortest slice by
//! the real backend.
//!
//! The stub backend exists for interface-generation and CI builds. Never
//! ship it in a build that is expected to process signals.

#[cfg(not(feature = "volk"))]
pub mod stub;

#[cfg(not(feature = "volk"))]
pub use stub::*;

#[cfg(feature = "volk")]
mod volk;

#[cfg(feature = "volk")]
pub use volk::*;
