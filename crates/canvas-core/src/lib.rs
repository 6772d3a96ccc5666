//! Layout core for the fixed-canvas site.
//!
//! The types here avoid platform-specific APIs so that the same math runs in
//! the browser and in host tests. The web front-end measures the DOM, feeds
//! the measurements in, and writes the results back as inline styles.

pub mod anchors;
pub mod config;
pub mod diagnostics;
pub mod frames;
pub mod geometry;
pub mod layout;
pub mod settle;
pub mod tier;
pub mod transform;

pub use anchors::*;
pub use config::*;
pub use diagnostics::*;
pub use frames::*;
pub use geometry::*;
pub use layout::*;
pub use settle::*;
pub use tier::*;
pub use transform::*;
