//! # nbget
//!
//! Download and unpack a release of the STAK notebook collection.
//!
//! ## Overview
//!
//! `nbget` fetches `<repo>/<project>/archive/<revision>.tar.gz` from the
//! hosting service, unpacks it into the output directory and removes the
//! downloaded archive afterwards. By default the revision matches the
//! installed version of `nbget`, so the notebooks always line up with the
//! release they were written for.
//!
//! ## Usage
//!
//! ```bash
//! # Notebooks for this release, into the current directory
//! nbget
//!
//! # Development head, into ./notebooks, replacing a previous download
//! nbget --latest -o notebooks --force
//! ```
//!
//! ## Configuration
//!
//! The host, project and archive extension can be changed in
//! `~/.config/nbget.toml` (or the file named by `--config` / `NBGET_CONFIG`).

/// Archive format detection and extraction
pub mod archive;

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration file handling and run configuration
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// HTTP download of release archives
pub mod fetch;

/// Download, verify and unpack pipeline
pub mod retriever;

/// Self-removing temporary directory
pub mod scratch;
