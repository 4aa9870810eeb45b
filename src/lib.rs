//! # docstrata
//!
//! Reconstructs the logical structure of a paginated document from a flat
//! stream of positioned text lines: text fragments carrying page number,
//! `(x, y)` origin, width, font size, and style flags, but no semantic tags.
//!
//! Given only geometry and text, the pipeline infers:
//! - whether a page uses multiple columns and which lines belong to which;
//! - where paragraph boundaries fall within a column;
//! - what heading level (H1..H6) each pre-identified heading should get.
//!
//! None of these answers are present in the input; they are inferred
//! statistically from noisy, font- and vendor-dependent spacing, and every
//! stage degrades to documented defaults instead of failing.
//!
//! ## Pipeline
//!
//! 1. [`layout::DocumentMetrics`] measures base font size and dominant
//!    spacing from a leading-page sample.
//! 2. [`layout::detect_columns`] reconciles two independent column-finding
//!    strategies (left-edge clustering and vertical strip analysis).
//! 3. Per column, a fresh [`layout::GapProfile`] classifies the spacing
//!    distribution and [`layout::build_blocks`] groups lines into blocks.
//! 4. [`layout::assign_heading_levels`] levels externally classified
//!    headings via font clustering, outline corroboration, and numbering.
//!
//! ## Quick Start
//!
//! ```
//! use docstrata::layout::{DocumentAnalyzer, PositionedLine, Viewport};
//!
//! let lines = vec![
//!     PositionedLine::new(0, 72.0, 40.0, 410.0, "Introduction", 18.0),
//!     PositionedLine::new(0, 72.0, 80.0, 410.0, "Body text of the opening.", 11.0),
//!     PositionedLine::new(0, 72.0, 96.0, 410.0, "More body text below it.", 11.0),
//! ];
//!
//! let analyzer = DocumentAnalyzer::new();
//! let elements = analyzer.analyze(&lines, &[Viewport::new(612.0, 792.0)]);
//! assert!(!elements.is_empty());
//! ```
//!
//! Out of scope: extracting positioned lines from a renderer, classifying
//! blocks as heading vs paragraph vs list (that classifier consumes this
//! crate's output), and any output format; those belong to the surrounding
//! application.
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration (named tuning constants)
pub mod config;

// Layout analysis
pub mod geometry;
pub mod layout;

// Document structure inputs
pub mod outline;

// Re-exports
pub use config::LayoutConfig;
pub use error::{Error, Result};
pub use layout::{
    DocumentAnalyzer, ElementKind, PositionedLine, StructuralElement, Viewport,
};
pub use outline::OutlineItem;

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all
    /// other values. This ensures that sorting operations never panic due
    /// to NaN comparisons.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => {
                // Both are normal numbers, safe to unwrap
                a.partial_cmp(&b).unwrap()
            },
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_safe_float_cmp_normal() {
            assert_eq!(safe_float_cmp(1.0, 2.0), Ordering::Less);
            assert_eq!(safe_float_cmp(2.0, 1.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(1.5, 1.5), Ordering::Equal);
        }

        #[test]
        fn test_safe_float_cmp_nan() {
            assert_eq!(safe_float_cmp(f32::NAN, f32::NAN), Ordering::Equal);
            assert_eq!(safe_float_cmp(f32::NAN, 0.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(0.0, f32::NAN), Ordering::Less);
        }

        #[test]
        fn test_safe_float_cmp_infinity() {
            assert_eq!(safe_float_cmp(f32::INFINITY, f32::INFINITY), Ordering::Equal);
            assert_eq!(safe_float_cmp(f32::INFINITY, 1.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(f32::NEG_INFINITY, f32::INFINITY), Ordering::Less);
        }
    }
}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
