//! Data models for evolutionary grids, model spectra, filter profiles and query
//! results.

pub mod boxes;
pub mod filter;
pub mod isochrone;
pub mod spectrum;
