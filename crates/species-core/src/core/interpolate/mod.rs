//! Numerical interpolation, integration and resampling.
//!
//! Every routine here is deterministic: results depend only on the inputs and the
//! order of floating-point operations is fixed.

pub mod linear;
pub mod regular;
pub mod resample;

pub use linear::{Bracket, interp1d, linspace, locate, trapezoid};
pub use regular::{Bilinear, bilinear};
pub use resample::{log_wavelengths, resample_flux};
