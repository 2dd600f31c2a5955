//! # Workflows Module
//!
//! The public query API. Readers are bound to datasets in a store at construction,
//! borrow it immutably, and perform no I/O while answering queries.
//!
//! ## Architecture
//!
//! - **Isochrones** ([`isochrone`]) - Isochrones at a given age, and color-magnitude
//!   and color-color relations synthesized from model spectra
//! - **Model Spectra** ([`model`]) - Interpolated model spectra scaled to a distance,
//!   with synthetic fluxes and magnitudes
//!
//! Results that cannot be computed for one requested mass degrade to NaN at that
//! index and are logged as warnings; they never abort the query.

pub mod isochrone;
pub mod model;
