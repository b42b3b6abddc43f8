//! # Config Crate
//!
//! Centralized configuration constants for the collision import pipeline.
//! Every default the importer applies (tiling factor, spatial offset,
//! converter timeout, worker bounds, hull tolerances) is defined here so the
//! geometry and import crates never scatter literals.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{is_hull_kind, DEFAULT_OFFSET, DEFAULT_TILING_FACTOR};
//!
//! assert_eq!(DEFAULT_TILING_FACTOR, 250.0);
//! assert_eq!(DEFAULT_OFFSET, [-5000.0, 0.0, -4000.0]);
//! assert!(is_hull_kind("hkpBoxShape"));
//! assert!(!is_hull_kind("hkpBvCompressedMeshShape"));
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **No Platform Probing**: Platform names are data; selection happens in
//!   the settings layer
//! - **Validated Snapshots**: [`constants::ImportConfig`] rejects values the
//!   pipeline cannot honour

pub mod constants;
