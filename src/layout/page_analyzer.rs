//! Page and document orchestration.
//!
//! Runs the full pipeline: column detection per page, then an independent
//! gap profile and block segmentation per column, concatenated in
//! column-major reading order (columns left to right, lines top to bottom
//! within each). Each column gets its own fresh [`GapProfile`]; reusing a
//! page-wide profile across columns is forbidden because the column gap
//! would masquerade as paragraph spacing.
//!
//! The computation is pure and single-threaded over one bounded batch; a
//! host may freely dispatch pages (or columns) to parallel workers and
//! reassemble by `(page, column_index, line order)`.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::layout::block_builder::{build_blocks, Block};
use crate::layout::column_detector::detect_columns;
use crate::layout::gap_profile::GapProfile;
use crate::layout::heading_hierarchy::{
    assign_heading_levels, HeadingCandidate, LeveledHeading,
};
use crate::layout::metrics::{sample_lines, DocumentMetrics};
use crate::layout::text_line::{ElementKind, PositionedLine, StructuralElement, Viewport};
use crate::outline::OutlineItem;
use indexmap::IndexMap;

/// Analyze one page's lines into structural elements.
///
/// `lines` is the page's slice; `line_offset` is the index of its first
/// line in the document-wide collection so `line_refs` stay global.
pub fn analyze_page(
    lines: &[PositionedLine],
    line_offset: usize,
    viewport: Viewport,
    metrics: &DocumentMetrics,
    config: &LayoutConfig,
) -> Vec<StructuralElement> {
    if lines.is_empty() {
        return Vec::new();
    }

    let columns = detect_columns(lines, viewport, metrics, &config.columns, &config.strips);

    if columns.is_empty() {
        // Unsegmented page: one flow over all lines
        let order: Vec<usize> = (0..lines.len()).collect();
        let profile = profile_for(lines, &order, metrics, config);
        let blocks = build_blocks(lines, &order, &profile, &config.blocks, &config.boundary);
        return elements_from_blocks(blocks, 0, line_offset);
    }

    log::debug!("page split into {} columns", columns.len());

    let mut elements = Vec::new();
    for (column_index, column) in columns.iter().enumerate() {
        // Fresh profile from this column's lines only
        let profile = profile_for(lines, &column.lines, metrics, config);
        let blocks = build_blocks(
            lines,
            &column.lines,
            &profile,
            &config.blocks,
            &config.boundary,
        );
        elements.extend(elements_from_blocks(blocks, column_index, line_offset));
    }
    elements
}

fn profile_for(
    lines: &[PositionedLine],
    order: &[usize],
    metrics: &DocumentMetrics,
    config: &LayoutConfig,
) -> GapProfile {
    let refs: Vec<&PositionedLine> = order.iter().map(|&i| &lines[i]).collect();
    GapProfile::from_lines(&refs, metrics, &config.gaps)
}

fn elements_from_blocks(
    blocks: Vec<Block>,
    column_index: usize,
    line_offset: usize,
) -> Vec<StructuralElement> {
    blocks
        .into_iter()
        .map(|block| StructuralElement {
            kind: ElementKind::Block,
            level: None,
            column_index,
            line_refs: block.lines.iter().map(|&i| i + line_offset).collect(),
            y_start: block.start_y,
            y_end: block.end_y,
        })
        .collect()
}

/// Document-level driver owning the configuration.
///
/// Groups lines by page, estimates document metrics from a leading-page
/// sample, and runs the page orchestrator over each page in order.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalyzer {
    config: LayoutConfig,
}

impl DocumentAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with a custom configuration.
    ///
    /// The configuration is validated once here; the analysis itself is
    /// total and never fails.
    pub fn with_config(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Access the active configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Analyze a document's lines into ordered structural elements.
    ///
    /// `viewports` pairs with pages by index; missing entries fall back to
    /// US Letter. Output is ordered by `(page, column_index, y)`. Empty
    /// input is a valid, cheap no-op.
    pub fn analyze(
        &self,
        lines: &[PositionedLine],
        viewports: &[Viewport],
    ) -> Vec<StructuralElement> {
        if lines.is_empty() {
            return Vec::new();
        }

        // Group line indices by page, preserving input order within a page
        let mut pages: IndexMap<u32, Vec<usize>> = IndexMap::new();
        for (i, line) in lines.iter().enumerate() {
            pages.entry(line.page).or_default().push(i);
        }
        pages.sort_keys();

        let metrics = self.metrics_for(lines, pages.len());

        let mut elements = Vec::new();
        for (page_rank, (_, indices)) in pages.iter().enumerate() {
            let viewport = viewports.get(page_rank).copied().unwrap_or_default();

            // The page analyzer works on a contiguous slice; rebuild one
            // and map refs back through the page's index list
            let page_lines: Vec<PositionedLine> =
                indices.iter().map(|&i| lines[i].clone()).collect();
            let page_elements =
                analyze_page(&page_lines, 0, viewport, &metrics, &self.config);

            for mut element in page_elements {
                for r in &mut element.line_refs {
                    *r = indices[*r];
                }
                elements.push(element);
            }
        }
        elements
    }

    /// Estimate document metrics from the leading-page sample.
    pub fn metrics_for(&self, lines: &[PositionedLine], page_count: usize) -> DocumentMetrics {
        let sample = sample_lines(lines, page_count, &self.config.metrics);
        let owned: Vec<PositionedLine> = sample.into_iter().cloned().collect();
        DocumentMetrics::from_sample(&owned, &self.config.metrics)
    }

    /// Assign heading levels to externally classified heading candidates.
    pub fn level_headings(
        &self,
        candidates: &[HeadingCandidate],
        base_font_size: f32,
        outline: Option<&[OutlineItem]>,
    ) -> Vec<LeveledHeading> {
        assign_heading_levels(candidates, base_font_size, outline, &self.config.headings)
    }
}
