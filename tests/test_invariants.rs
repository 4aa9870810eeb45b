//! Property tests for the structural invariants.
//!
//! Random (but finite) line geometry must never panic the pipeline, blocks
//! must partition their input, validated columns must stay disjoint, and
//! heading levels must never skip.

use docstrata::config::{GapConfig, LayoutConfig, MetricsConfig};
use docstrata::layout::{
    assign_heading_levels, build_blocks, detect_columns, DocumentAnalyzer, DocumentMetrics,
    GapProfile, HeadingCandidate, PositionedLine, Viewport,
};
use proptest::prelude::*;

prop_compose! {
    fn line_strategy()(page in 0u32..3, x in 0.0f32..600.0, y in 0.0f32..800.0,
                       width in 1.0f32..500.0, size in 4.0f32..48.0)
                      -> PositionedLine {
        PositionedLine::new(page, x, y, width, "generated body text", size)
    }
}

proptest! {
    #[test]
    fn analyzer_is_total_on_finite_input(lines in prop::collection::vec(line_strategy(), 0..60)) {
        let analyzer = DocumentAnalyzer::new();
        let elements = analyzer.analyze(&lines, &[Viewport::default()]);

        // No line lands in more than one element (column assignment may
        // drop outliers, so exactly-once holds only per column)
        let mut counts = vec![0usize; lines.len()];
        for element in &elements {
            for &r in &element.line_refs {
                counts[r] += 1;
            }
        }
        prop_assert!(counts.iter().all(|&c| c <= 1));
        if !lines.is_empty() {
            prop_assert!(!elements.is_empty());
        }
    }

    #[test]
    fn blocks_partition_lines_in_order(ys in prop::collection::vec(0.0f32..2000.0, 1..50)) {
        let lines: Vec<PositionedLine> = ys
            .iter()
            .map(|&y| PositionedLine::new(0, 72.0, y, 400.0, "body text line", 12.0))
            .collect();
        let order: Vec<usize> = (0..lines.len()).collect();

        let metrics = DocumentMetrics::fallback(&MetricsConfig::default());
        let refs: Vec<&PositionedLine> = lines.iter().collect();
        let profile = GapProfile::from_lines(&refs, &metrics, &GapConfig::default());
        let config = LayoutConfig::default();

        let blocks = build_blocks(&lines, &order, &profile, &config.blocks, &config.boundary);

        // Partition: every index exactly once
        let mut seen = vec![false; lines.len()];
        for block in &blocks {
            prop_assert!(!block.lines.is_empty());
            for &i in &block.lines {
                prop_assert!(!seen[i]);
                seen[i] = true;
            }
        }
        prop_assert!(seen.iter().all(|&s| s));

        // Blocks come out in ascending Y order
        let mut last_y = f32::NEG_INFINITY;
        for block in &blocks {
            prop_assert!(block.start_y >= last_y);
            last_y = block.start_y;
        }
    }

    #[test]
    fn validated_columns_are_disjoint(lines in prop::collection::vec(line_strategy(), 0..80)) {
        let config = LayoutConfig::default();
        let metrics = DocumentMetrics::fallback(&MetricsConfig::default());
        let columns = detect_columns(
            &lines,
            Viewport::default(),
            &metrics,
            &config.columns,
            &config.strips,
        );

        for pair in columns.windows(2) {
            prop_assert!(pair[0].max_x <= pair[1].x);
        }

        // Single-column pages collapse to no segmentation
        prop_assert!(columns.len() != 1);

        // Each line appears in at most one column
        let mut counts = vec![0usize; lines.len()];
        for column in &columns {
            for &i in &column.lines {
                counts[i] += 1;
            }
        }
        prop_assert!(counts.iter().all(|&c| c <= 1));
    }

    #[test]
    fn heading_levels_never_skip(sizes in prop::collection::vec(4.0f32..60.0, 1..25)) {
        let candidates: Vec<HeadingCandidate> = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| HeadingCandidate::new(format!("Heading {}", i), s))
            .collect();

        let leveled = assign_heading_levels(
            &candidates,
            12.0,
            None,
            &LayoutConfig::default().headings,
        );

        prop_assert_eq!(leveled.len(), candidates.len());
        let mut max_seen: Option<u8> = None;
        for heading in &leveled {
            prop_assert!((1..=6).contains(&heading.level));
            if let Some(max) = max_seen {
                prop_assert!(heading.level <= max + 1);
            }
            max_seen = Some(max_seen.map_or(heading.level, |m| m.max(heading.level)));
        }
    }
}
