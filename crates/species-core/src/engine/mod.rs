//! # Engine Module
//!
//! The stateful data layer behind the query API.
//!
//! ## Overview
//!
//! A [`database::Database`] owns every named dataset: isochrone grids, model
//! spectrum grids, filter profiles and calibration spectra. It ingests them from
//! local files and, when opened on a directory, persists each addition so that a
//! later session sees the same data.
//!
//! Readers in [`crate::workflows`] never depend on the concrete database. They are
//! generic over the collaborator traits in [`catalog`], which any store can
//! implement.
//!
//! ## Architecture
//!
//! - **Collaborators** ([`catalog`]) - `GridStore` and `PhotometricFilterCatalog`
//! - **Storage** ([`database`]) - In-memory store with write-through persistence
//! - **Configuration** ([`config`]) - Options for ingesting model grids
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Errors raised by dataset lookups and queries

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod progress;
