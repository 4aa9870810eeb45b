//! Block segmentation within one column.
//!
//! Walks a column's lines in reading order and groups them into text blocks.
//! The paragraph boundary decision from [`crate::layout::boundary`] does the
//! statistical work; on top of it sits a table of named contextual rules for
//! the cases statistics alone cannot see: blank lines, font shifts, and the
//! handful of heading shapes (short bold line, trailing free space, long
//! capitalized follow-up).
//!
//! The profile handed in must come from this column's lines only. A page
//! profile mixed across columns folds column gaps into the paragraph-gap
//! signal and makes every threshold wrong.

use crate::config::{BlockConfig, BoundaryConfig};
use crate::geometry::Rect;
use crate::layout::boundary::{font_size_change, is_paragraph_boundary, BlockState, BoundaryContext};
use crate::layout::gap_profile::GapProfile;
use crate::layout::text_line::PositionedLine;
use crate::utils::safe_float_cmp;

/// A maximal run of lines between two detected boundaries.
///
/// Accumulates lines while open; frozen once the closing boundary is found.
#[derive(Debug, Clone)]
pub struct Block {
    /// Indices of member lines in the analyzed slice, in reading order
    pub lines: Vec<usize>,
    /// Y origin of the first line
    pub start_y: f32,
    /// Y origin of the last line
    pub end_y: f32,
    /// Mean gap between the block's consecutive lines (0.0 for one line)
    pub average_gap: f32,
    /// The gap that closed this block, when a boundary did
    pub boundary_gap: Option<f32>,
}

impl Block {
    /// Bounding box of the block: the union of its member line boxes.
    ///
    /// Returns `None` for a block whose indices no longer resolve into
    /// `lines` (the slice must be the one the block was built from).
    pub fn bounding_box(&self, lines: &[PositionedLine]) -> Option<Rect> {
        let mut boxes = self.lines.iter().filter_map(|&i| lines.get(i)).map(|l| l.bbox());
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }
}

/// Everything a block rule can see for one line pair.
#[derive(Debug)]
pub struct BlockBoundaryContext<'a> {
    /// Last line of the open block
    pub current: &'a PositionedLine,
    /// Candidate continuation line
    pub next: &'a PositionedLine,
    /// Vertical gap between the two
    pub gap: f32,
    /// The column's gap profile
    pub profile: &'a GapProfile,
    /// State of the open block
    pub block: &'a BlockState,
    /// Left edge of the column
    pub column_x: f32,
    /// Right edge of the column
    pub column_max_x: f32,
    /// Block tuning constants
    pub config: &'a BlockConfig,
}

impl BlockBoundaryContext<'_> {
    fn column_width(&self) -> f32 {
        (self.column_max_x - self.column_x).max(f32::EPSILON)
    }

    fn current_len(&self) -> usize {
        self.current.text.trim().chars().count()
    }

    fn next_len(&self) -> usize {
        self.next.text.trim().chars().count()
    }
}

/// A named contextual block rule; any firing rule closes the block.
pub struct BlockRule {
    /// Rule name, for logs and tests
    pub name: &'static str,
    /// The predicate
    pub check: fn(&BlockBoundaryContext) -> bool,
}

/// Contextual rules, checked after the statistical boundary decision.
pub const BLOCK_RULES: &[BlockRule] = &[
    BlockRule {
        name: "gap-outlier",
        check: gap_outlier,
    },
    BlockRule {
        name: "blank-line",
        check: blank_line,
    },
    BlockRule {
        name: "font-shift",
        check: font_shift,
    },
    BlockRule {
        name: "short-block-font-shift",
        check: short_block_font_shift,
    },
    BlockRule {
        name: "paragraph-to-heading",
        check: paragraph_to_heading,
    },
    BlockRule {
        name: "bold-heading",
        check: bold_heading,
    },
    BlockRule {
        name: "plain-heading",
        check: plain_heading,
    },
];

/// The gap dwarfs the block's own average spacing.
///
/// The average must exceed the zero-gap substitute: a block whose only
/// recorded gap is a same-baseline continuation has no spacing to compare
/// against.
fn gap_outlier(ctx: &BlockBoundaryContext) -> bool {
    ctx.block.average_gap > ctx.config.zero_gap_substitute
        && ctx.gap >= ctx.block.average_gap * ctx.config.intra_gap_outlier_factor
}

/// A gap the height of several lines reads as a blank line.
fn blank_line(ctx: &BlockBoundaryContext) -> bool {
    ctx.gap >= ctx.block.average_font_size * ctx.config.blank_line_font_factor
}

/// A font-size jump against the next line closes the block.
fn font_shift(ctx: &BlockBoundaryContext) -> bool {
    font_size_change(ctx.current, ctx.next) > ctx.config.font_change_ratio
}

/// Short blocks close on even a modest size change.
fn short_block_font_shift(ctx: &BlockBoundaryContext) -> bool {
    ctx.block.char_count < ctx.config.short_block_chars
        && font_size_change(ctx.current, ctx.next) > ctx.config.short_block_font_change
}

/// A long paragraph followed by a short capitalized line after a widened
/// gap: the next line is likely a heading.
fn paragraph_to_heading(ctx: &BlockBoundaryContext) -> bool {
    ctx.block.char_count > ctx.config.long_block_chars
        && ctx.next_len() < ctx.config.short_line_chars
        && ctx.next.starts_capitalized()
        && ctx.gap >= ctx.config.heading_gap_factor * ctx.profile.mean
}

/// A short bold line with free trailing space, no terminal period, and a
/// long capitalized follow-up: the current line is a heading. The gap
/// requirement is lenient because headings often sit tight on their body.
fn bold_heading(ctx: &BlockBoundaryContext) -> bool {
    ctx.current.is_bold
        && ctx.current_len() < ctx.config.short_line_chars
        && !ctx.current.text.trim_end().ends_with('.')
        && ctx.column_max_x - ctx.current.right()
            >= ctx.config.trailing_space_factor * ctx.block.average_font_size
        && ctx.next_len() > ctx.config.long_line_chars
        && ctx.next.starts_capitalized()
        && ctx.gap >= ctx.config.bold_heading_gap_factor * ctx.profile.mean
}

/// The bold-heading shape without the bold requirement: shorter line,
/// more trailing space, and a gap floor that scales with how short the
/// candidate is (a five-word line needs less confirmation than a
/// nearly-full one).
fn plain_heading(ctx: &BlockBoundaryContext) -> bool {
    let max_len = ctx.config.short_line_chars * 2 / 3;
    let len = ctx.current_len();
    if len >= max_len {
        return false;
    }

    let shortness = 1.0 - len as f32 / max_len as f32;
    let gap_factor = ctx.config.plain_heading_gap_max
        - (ctx.config.plain_heading_gap_max - ctx.config.plain_heading_gap_min) * shortness;

    !ctx.current.text.trim_end().ends_with('.')
        && ctx.current.right() <= ctx.column_x + (1.0 - ctx.config.plain_trailing_ratio) * ctx.column_width()
        && ctx.next_len() > ctx.config.long_line_chars
        && ctx.next.starts_capitalized()
        && ctx.gap >= gap_factor * ctx.profile.mean
}

/// Group one column's lines into blocks.
///
/// `order` holds indices into `lines`, normally a column's member list; it
/// is re-sorted by `(y, x)` defensively. The final line of the input always
/// lands in exactly one block, including when the last pair also detects a
/// boundary.
pub fn build_blocks(
    lines: &[PositionedLine],
    order: &[usize],
    profile: &GapProfile,
    block_config: &BlockConfig,
    boundary_config: &BoundaryConfig,
) -> Vec<Block> {
    let mut order: Vec<usize> = order.to_vec();
    order.sort_by(|&a, &b| {
        safe_float_cmp(lines[a].y, lines[b].y).then_with(|| safe_float_cmp(lines[a].x, lines[b].x))
    });

    if order.is_empty() {
        return Vec::new();
    }

    let column_x = order
        .iter()
        .map(|&i| lines[i].x)
        .fold(f32::INFINITY, f32::min);
    let column_max_x = order
        .iter()
        .map(|&i| lines[i].right())
        .fold(f32::NEG_INFINITY, f32::max);

    // Pre-compute the pairwise gaps so rules can peek at neighbors
    let gaps: Vec<f32> = order
        .windows(2)
        .map(|pair| {
            let gap = lines[pair[1]].y - lines[pair[0]].y;
            if gap <= 0.0 {
                // Fragments sharing a baseline continue the same visual line
                block_config.zero_gap_substitute
            } else {
                gap
            }
        })
        .collect();

    let mut blocks = Vec::new();
    let mut open = OpenBlock::seeded(lines, order[0]);

    for (pair_idx, pair) in order.windows(2).enumerate() {
        let current = &lines[pair[0]];
        let next = &lines[pair[1]];
        let gap = gaps[pair_idx];
        let state = open.state();

        let ctx = BoundaryContext {
            current,
            next,
            gap,
            profile,
            block: &state,
            prev_gap: pair_idx.checked_sub(1).map(|i| gaps[i]),
            next_gap: gaps.get(pair_idx + 1).copied(),
            config: boundary_config,
        };

        let statistical = is_paragraph_boundary(&ctx);
        let contextual = if statistical {
            None
        } else {
            let block_ctx = BlockBoundaryContext {
                current,
                next,
                gap,
                profile,
                block: &state,
                column_x,
                column_max_x,
                config: block_config,
            };
            BLOCK_RULES.iter().find(|rule| (rule.check)(&block_ctx))
        };

        if statistical || contextual.is_some() {
            if let Some(rule) = contextual {
                log::trace!("block rule {} closed block at gap {:.2}", rule.name, gap);
            }
            blocks.push(open.close(Some(gap)));
            open = OpenBlock::seeded(lines, pair[1]);
        } else {
            open.push(lines, pair[1], gap);
        }
    }

    // The final line is always in the open block, boundary on the last
    // pair or not
    blocks.push(open.close(None));
    blocks
}

/// A block under construction.
struct OpenBlock {
    lines: Vec<usize>,
    start_y: f32,
    end_y: f32,
    gap_sum: f32,
    gap_count: usize,
    char_count: usize,
    font_size_sum: f32,
    in_list_item: bool,
}

impl OpenBlock {
    fn seeded(lines: &[PositionedLine], index: usize) -> Self {
        let line = &lines[index];
        Self {
            lines: vec![index],
            start_y: line.y,
            end_y: line.y,
            gap_sum: 0.0,
            gap_count: 0,
            char_count: line.text.chars().count(),
            font_size_sum: line.font_size,
            in_list_item: line.starts_list_marker(),
        }
    }

    fn push(&mut self, lines: &[PositionedLine], index: usize, gap: f32) {
        let line = &lines[index];
        self.lines.push(index);
        self.end_y = line.y;
        self.gap_sum += gap;
        self.gap_count += 1;
        self.char_count += line.text.chars().count();
        self.font_size_sum += line.font_size;
    }

    fn average_gap(&self) -> f32 {
        if self.gap_count > 0 {
            self.gap_sum / self.gap_count as f32
        } else {
            0.0
        }
    }

    fn state(&self) -> BlockState {
        BlockState {
            char_count: self.char_count,
            line_count: self.lines.len(),
            average_gap: self.average_gap(),
            average_font_size: self.font_size_sum / self.lines.len() as f32,
            in_list_item: self.in_list_item,
        }
    }

    fn close(self, boundary_gap: Option<f32>) -> Block {
        Block {
            start_y: self.start_y,
            end_y: self.end_y,
            average_gap: self.average_gap(),
            boundary_gap,
            lines: self.lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GapConfig, MetricsConfig};
    use crate::layout::metrics::DocumentMetrics;

    fn metrics() -> DocumentMetrics {
        DocumentMetrics::fallback(&MetricsConfig::default())
    }

    fn profile_for(lines: &[PositionedLine]) -> GapProfile {
        let refs: Vec<&PositionedLine> = lines.iter().collect();
        GapProfile::from_lines(&refs, &metrics(), &GapConfig::default())
    }

    fn line(y: f32, text: &str, size: f32) -> PositionedLine {
        PositionedLine::new(0, 72.0, y, 400.0, text, size)
    }

    fn blocks_of(lines: &[PositionedLine]) -> Vec<Block> {
        let order: Vec<usize> = (0..lines.len()).collect();
        let profile = profile_for(lines);
        build_blocks(
            lines,
            &order,
            &profile,
            &BlockConfig::default(),
            &BoundaryConfig::default(),
        )
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        let profile = profile_for(&[]);
        let blocks = build_blocks(
            &[],
            &[],
            &profile,
            &BlockConfig::default(),
            &BoundaryConfig::default(),
        );
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_single_line_single_block() {
        let lines = vec![line(0.0, "Only line.", 12.0)];
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines, vec![0]);
        assert!(blocks[0].boundary_gap.is_none());
    }

    #[test]
    fn test_homogeneous_spacing_one_block() {
        // 20 lines with gap 20.0 +- 0.1: the profile is homogeneous and
        // nothing short of a 3x outlier may break
        let lines: Vec<PositionedLine> = (0..20)
            .map(|i| {
                let jitter = if i % 2 == 0 { -0.05 } else { 0.05 };
                line(
                    i as f32 * 20.0 + jitter,
                    "body text continues without a break here",
                    12.0,
                )
            })
            .collect();
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 20);
    }

    #[test]
    fn test_last_line_always_placed() {
        // Boundary on the very last pair: the final line still lands in a
        // block of its own
        let lines = vec![
            line(0.0, "body text flows along here nicely", 12.0),
            line(20.0, "and keeps going with more words", 12.0),
            line(40.0, "until the paragraph finally ends.", 12.0),
            line(140.0, "Orphan.", 12.0),
        ];
        let blocks = blocks_of(&lines);
        let placed: usize = blocks.iter().map(|b| b.lines.len()).sum();
        assert_eq!(placed, 4);
        assert_eq!(blocks.last().unwrap().lines, vec![3]);
    }

    #[test]
    fn test_zero_gap_treated_as_continuation() {
        let lines = vec![
            line(0.0, "left fragment", 12.0),
            line(0.0, "right fragment of the same visual line", 12.0),
            line(20.0, "next line below", 12.0),
        ];
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_blank_line_rule() {
        // Gap of 8x the font size between two otherwise ordinary lines
        let lines = vec![
            line(0.0, "first paragraph text body", 12.0),
            line(20.0, "more of the first paragraph", 12.0),
            line(140.0, "second paragraph begins", 12.0),
            line(160.0, "and continues on", 12.0),
        ];
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec![0, 1]);
        assert_eq!(blocks[1].lines, vec![2, 3]);
        assert_eq!(blocks[0].boundary_gap, Some(120.0));
    }

    #[test]
    fn test_font_shift_rule() {
        let lines = vec![
            line(0.0, "Chapter Title", 24.0),
            line(40.0, "Body text at regular size.", 12.0),
            line(55.0, "More body text here.", 12.0),
        ];
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec![0]);
    }

    #[test]
    fn test_bold_heading_rule_fires() {
        let mut heading = line(0.0, "Overview", 12.0);
        heading.width = 80.0;
        heading.is_bold = true;
        let lines = vec![
            heading,
            line(
                16.0,
                "The overview section begins with a long opening sentence that runs on",
                12.0,
            ),
            line(36.0, "and continues at the same size and weight", 12.0),
        ];

        // Same font size throughout, tight homogeneous-ish spacing: only
        // the bold-heading rule separates the heading
        let blocks = blocks_of(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines, vec![0]);
    }

    #[test]
    fn test_rules_are_named() {
        let names: Vec<&str> = BLOCK_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "gap-outlier",
                "blank-line",
                "font-shift",
                "short-block-font-shift",
                "paragraph-to-heading",
                "bold-heading",
                "plain-heading",
            ]
        );
    }

    #[test]
    fn test_bounding_box_spans_members() {
        let lines = vec![
            line(0.0, "first paragraph text body", 12.0),
            line(20.0, "more of the first paragraph", 12.0),
        ];
        let blocks = blocks_of(&lines);
        let bbox = blocks[0].bounding_box(&lines).unwrap();
        assert_eq!(bbox.top(), 0.0);
        assert_eq!(bbox.bottom(), 32.0);
        assert_eq!(bbox.left(), 72.0);
        assert_eq!(bbox.right(), 472.0);
    }

    #[test]
    fn test_blocks_partition_in_order() {
        let lines = vec![
            line(0.0, "alpha paragraph text", 12.0),
            line(20.0, "continues along", 12.0),
            line(120.0, "beta paragraph text", 12.0),
            line(140.0, "continues as well", 12.0),
            line(240.0, "gamma paragraph text", 12.0),
        ];
        let blocks = blocks_of(&lines);

        let flattened: Vec<usize> = blocks.iter().flat_map(|b| b.lines.clone()).collect();
        assert_eq!(flattened, vec![0, 1, 2, 3, 4]);
    }
}
