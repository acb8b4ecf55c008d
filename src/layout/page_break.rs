//! # Page Break Decisions
//!
//! Where a paragraph splits when it reaches the bottom of a page. Collage
//! units never split; they are passed in as unbreakable.

/// What to do with a block that may not fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the whole block on the current page.
    Place,
    /// Start a new page and place the block there.
    MoveToNextPage,
    /// Place the first `lines_on_current_page` lines here, the rest on the
    /// following page(s).
    Split { lines_on_current_page: usize },
}

/// Decide how a block of lines with the given heights is placed when
/// `remaining_height` is left on the page.
///
/// At least `min_orphan_lines` lines must stay on the current page and at
/// least `min_widow_lines` must move to the next, unless the block is
/// shorter than that.
pub fn decide_break(
    remaining_height: f64,
    line_heights: &[f64],
    is_breakable: bool,
    min_orphan_lines: usize,
    min_widow_lines: usize,
) -> BreakDecision {
    let total: f64 = line_heights.iter().sum();
    if total <= remaining_height {
        return BreakDecision::Place;
    }
    if !is_breakable {
        return BreakDecision::MoveToNextPage;
    }

    let mut used = 0.0;
    let fit_count = line_heights
        .iter()
        .take_while(|&&h| {
            used += h;
            used <= remaining_height
        })
        .count();

    let total_lines = line_heights.len();
    if fit_count < min_orphan_lines && fit_count < total_lines {
        return BreakDecision::MoveToNextPage;
    }

    let carried = total_lines - fit_count;
    if carried > 0 && carried < min_widow_lines {
        let adjusted = fit_count.saturating_sub(min_widow_lines - carried);
        if adjusted < min_orphan_lines.max(1) {
            return BreakDecision::MoveToNextPage;
        }
        return BreakDecision::Split {
            lines_on_current_page: adjusted,
        };
    }

    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }
    BreakDecision::Split {
        lines_on_current_page: fit_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        assert_eq!(
            decide_break(100.0, &[16.0, 16.0, 16.0], true, 2, 2),
            BreakDecision::Place
        );
    }

    #[test]
    fn collage_moves_whole() {
        assert_eq!(
            decide_break(50.0, &[300.0], false, 2, 2),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn splits_where_lines_stop_fitting() {
        assert_eq!(
            decide_break(55.0, &[20.0, 30.0, 40.0], true, 1, 1),
            BreakDecision::Split {
                lines_on_current_page: 2
            }
        );
    }

    #[test]
    fn single_orphan_moves_paragraph() {
        assert_eq!(
            decide_break(20.0, &[16.0, 16.0, 16.0], true, 2, 2),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn widow_pulls_a_line_forward() {
        // 3 of 4 fit, which would strand one line on the next page.
        assert_eq!(
            decide_break(50.0, &[16.0, 16.0, 16.0, 16.0], true, 2, 2),
            BreakDecision::Split {
                lines_on_current_page: 2
            }
        );
    }

    #[test]
    fn three_line_paragraph_cannot_split_two_ways() {
        // Two fit, but that leaves a widow and pulling back leaves an orphan.
        assert_eq!(
            decide_break(40.0, &[16.0, 16.0, 16.0], true, 2, 2),
            BreakDecision::MoveToNextPage
        );
    }
}
