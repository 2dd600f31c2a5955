//! # Core Module
//!
//! Fundamental building blocks for working with evolutionary model grids and model
//! spectra.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Isochrone grids, model spectrum grids, filter
//!   profiles and the result boxes returned by queries
//! - **File I/O** ([`io`]) - Isochrone text files, CSV tables and plain column files
//! - **Numerics** ([`interpolate`]) - Bracketing, linear/bilinear interpolation and
//!   flux-conserving resampling
//! - **Photometry** ([`photometry`]) - Filter-averaged fluxes and Vega magnitudes
//! - **Constants** ([`constants`]) - Physical constants in SI units

pub mod constants;
pub mod interpolate;
pub mod io;
pub mod models;
pub mod photometry;
