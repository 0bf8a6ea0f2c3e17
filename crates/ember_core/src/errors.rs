//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EmberError`] covers all failure modes including:
//! - Asset resolution and decoding errors
//! - Animation playback requests with unusable markers
//! - Scene graph consistency violations
//! - Background GPU compile failures
//!
//! Querying or disabling an animation group that is not active is *not* an
//! error; those APIs return `None` / `false` instead.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, EmberError>`.
//!
//! ```rust,ignore
//! use ember_core::errors::{EmberError, Result};
//!
//! fn load_asset() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Ember engine.
#[derive(Error, Debug)]
pub enum EmberError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The virtual filesystem could not resolve the requested asset.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The asset bytes were found but could not be turned into a scene graph.
    #[error("Invalid asset '{name}': {reason}")]
    AssetFormat {
        /// Normalised asset name
        name: String,
        /// What the loader rejected
        reason: String,
    },

    // ========================================================================
    // Animation Errors
    // ========================================================================
    /// `play` was requested with a missing or zero-length marker window.
    #[error("Invalid marker range for group '{group}': '{start}' .. '{stop}'")]
    InvalidMarkerRange {
        /// Animation group name
        group: String,
        /// Requested start marker
        start: String,
        /// Requested stop marker
        stop: String,
    },

    // ========================================================================
    // Scene Graph Errors
    // ========================================================================
    /// An instance no longer matches the layout of its template.
    ///
    /// This is never repaired in place; recreate the instance.
    #[error("Topology mismatch: expected {expected}, found {found}")]
    TopologyMismatch {
        /// Description of the template layout
        expected: String,
        /// Description of the instance layout
        found: String,
    },

    /// The instance already has a parent and cannot be attached again.
    #[error("Instance is already attached to a parent node")]
    AlreadyAttached,

    /// A node handle does not refer to a live node.
    #[error("Invalid node handle")]
    InvalidNode,

    // ========================================================================
    // GPU Lifecycle Errors
    // ========================================================================
    /// Background compilation failed or the compile queue is gone.
    #[error("GPU compile error: {0}")]
    Compile(String),

    // ========================================================================
    // I/O & Format Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmberError {
    /// Shorthand for [`EmberError::AssetFormat`].
    pub fn format(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether a later retry of the same load may succeed.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AssetNotFound(_))
    }
}

/// Alias for `Result<T, EmberError>`.
pub type Result<T> = std::result::Result<T, EmberError>;
