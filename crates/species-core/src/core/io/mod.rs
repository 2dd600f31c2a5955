//! Provides input/output for the file formats used by the library.
//!
//! Evolutionary grids are ingested from Baraffe-style text tables, filter profiles
//! and calibration spectra from plain column files, and the database stores grids as
//! CSV tables. All formats share the [`traits::DataFile`] interface.

pub mod ascii;
pub mod baraffe;
pub(crate) mod columns;
pub mod tables;
pub mod traits;
