//! Layout analysis algorithms for paginated documents.
//!
//! This module reconstructs logical structure from positioned text lines:
//! - Document metrics estimation (base font size, dominant spacing)
//! - Gap distribution profiling and paragraph boundary detection
//! - Column detection (x-clustering reconciled with strip analysis)
//! - Block segmentation within columns
//! - Heading hierarchy assignment (H1..H6)

pub mod block_builder;
pub mod boundary;
pub mod column_detector;
pub mod gap_profile;
pub mod heading_hierarchy;
pub mod metrics;
pub mod page_analyzer;
pub mod strips;
pub mod text_line;

// Re-export main types
pub use block_builder::{build_blocks, Block};
pub use boundary::{is_paragraph_boundary, BlockState, BoundaryContext};
pub use column_detector::{detect_columns, Column};
pub use gap_profile::{DocumentType, GapProfile};
pub use heading_hierarchy::{
    assign_heading_levels, FontSizeHierarchy, HeadingCandidate, LeveledHeading,
};
pub use metrics::DocumentMetrics;
pub use page_analyzer::{analyze_page, DocumentAnalyzer};
pub use strips::{Strip, StripProfile};
pub use text_line::{
    parse_lines, ElementKind, LineSpan, PositionedLine, StructuralElement, Viewport,
};
