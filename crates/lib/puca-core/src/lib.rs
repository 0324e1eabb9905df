//! Core pipeline for puca-mcp.
//!
//! This crate turns a location and a feature category into a bounded spatial
//! query, runs it against the upstream feature store, and aggregates the
//! result into a report. It also owns the HTTP clients for the geocoding,
//! routing, and spatial-store collaborators.

pub mod aggregate;
pub mod category;
pub mod clients;
pub mod control;
pub mod enrich;
pub mod geo;
pub mod query;
pub mod retry;
pub mod services;
