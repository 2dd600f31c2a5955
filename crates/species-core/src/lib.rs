//! # species Core Library
//!
//! Reading of stellar and sub-stellar evolutionary model grids ("isochrones"),
//! with interpolated isochrone, color-magnitude and color-color relations computed
//! either from tabulated magnitudes or from synthetic photometry of model spectra.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`IsochroneGrid`, `ModelGrid`,
//!   `FilterProfile`), file formats, interpolation and resampling routines, and
//!   synthetic photometry.
//!
//! - **[`engine`]: The Data Layer.** The `Database` holding named grids, filter
//!   profiles and calibration spectra, the collaborator traits through which readers
//!   access it, ingestion options and progress reporting.
//!
//! - **[`workflows`]: The Public API.** `IsochroneReader` and `ModelReader`, immutable
//!   query objects bound to datasets in a `Database`.

pub mod core;
pub mod engine;
pub mod workflows;
