//! Fitting variable-length labels into a fixed character budget.
//!
//! Lengths are counted in extended grapheme clusters, so a truncated label
//! never splits an accented letter or an emoji sequence.

use unicode_segmentation::UnicodeSegmentation;

pub const ELLIPSIS: &str = "⋯";

/// Which end of the text survives truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Keep the start, cut the end: `Some long tit⋯`.
    #[default]
    End,
    /// Keep the end, cut the start: `⋯/projects/bar`.
    Start,
}

/// Number of user-perceived characters in `text`.
pub fn width(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Shorten `text` to at most `limit` graphemes, marking the cut with
/// [`ELLIPSIS`].
pub fn truncate(text: &str, limit: usize, side: Side) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let keep = limit - 1;
    match side {
        Side::End => format!("{}{}", graphemes[..keep].concat(), ELLIPSIS),
        Side::Start => format!(
            "{}{}",
            ELLIPSIS,
            graphemes[graphemes.len() - keep..].concat()
        ),
    }
}

/// A shared budget for a primary and a secondary label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    pub total: usize,
    /// Most the primary label may take while the secondary needs the room.
    pub primary_cap: usize,
    pub separator: String,
    pub secondary_side: Side,
}

impl Budget {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            primary_cap: total,
            separator: " - ".to_string(),
            secondary_side: Side::End,
        }
    }

    pub fn primary_cap(mut self, cap: usize) -> Self {
        self.primary_cap = cap;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn secondary_side(mut self, side: Side) -> Self {
        self.secondary_side = side;
        self
    }

    /// Fit both labels, returning the truncated primary and secondary.
    ///
    /// The primary gets up to `primary_cap`, or more when the secondary is
    /// short enough to leave room. The secondary gets everything the primary
    /// and the separator leave over; it is empty when nothing is left.
    pub fn fit_parts(&self, primary: &str, secondary: &str) -> (String, String) {
        let separator = width(&self.separator);
        let secondary_len = width(secondary);

        let spare = if secondary_len == 0 {
            self.total
        } else {
            self.total.saturating_sub(separator + secondary_len)
        };
        let primary_limit = self.primary_cap.max(spare).min(self.total);
        let primary = truncate(primary, primary_limit, Side::End);

        let remaining = self
            .total
            .saturating_sub(width(&primary))
            .saturating_sub(separator);
        if secondary_len == 0 || remaining == 0 {
            return (primary, String::new());
        }

        (primary, truncate(secondary, remaining, self.secondary_side))
    }

    /// Fit both labels and join them with the separator.
    pub fn fit(&self, primary: &str, secondary: &str) -> String {
        match self.fit_parts(primary, secondary) {
            (primary, secondary) if secondary.is_empty() => primary,
            (primary, secondary) if primary.is_empty() => secondary,
            (primary, secondary) => format!("{}{}{}", primary, self.separator, secondary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("abc", 3, Side::End), "abc");
        assert_eq!(truncate("abc", 10, Side::Start), "abc");
    }

    #[test]
    fn test_truncate_end_and_start() {
        assert_eq!(truncate("abcdefgh", 5, Side::End), "abcd⋯");
        assert_eq!(truncate("/home/me/projects/bar", 8, Side::Start), "⋯cts/bar");
        assert_eq!(truncate("abcdef", 1, Side::End), "⋯");
        assert_eq!(truncate("abcdef", 0, Side::End), "");
    }

    #[test]
    fn test_truncate_counts_graphemes() {
        let text = "e\u{301}e\u{301}e\u{301}e\u{301}";
        let cut = truncate(text, 3, Side::End);
        assert_eq!(cut, "e\u{301}e\u{301}⋯");
        assert_eq!(width(&cut), 3);
    }

    #[test]
    fn test_fit_truncates_secondary_to_fill_budget() {
        let budget = Budget::new(10);
        let line = budget.fit("ab", "abcdefgh");
        assert_eq!(line, "ab - abcd⋯");
        assert_eq!(width(&line), 10);
    }

    #[test]
    fn test_fit_primary_fills_budget() {
        let budget = Budget::new(10);
        assert_eq!(budget.fit("abcdefghij", "anything"), "abcdefghij");
        assert_eq!(budget.fit("abcdefghijklm", "x"), "abcdefghi⋯");
    }

    #[test]
    fn test_fit_short_primary_gives_room_to_secondary() {
        let budget = Budget::new(20).primary_cap(10);
        let (primary, secondary) = budget.fit_parts("Band", "A Rather Long Song Title");
        assert_eq!(primary, "Band");
        assert_eq!(width(&secondary), 20 - 4 - 3);
        assert!(secondary.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_fit_short_secondary_gives_room_to_primary() {
        let budget = Budget::new(20).primary_cap(10);
        let (primary, secondary) = budget.fit_parts("An Artist With A Long Name", "Hi");
        assert_eq!(secondary, "Hi");
        assert_eq!(width(&primary), 20 - 3 - 2);
    }

    #[test]
    fn test_fit_caps_primary_when_both_long() {
        let budget = Budget::new(20).primary_cap(10);
        let line = budget.fit("An Artist With A Long Name", "A Rather Long Song Title");
        assert_eq!(line, "An Artist⋯ - A Rath⋯");
        assert_eq!(width(&line), 20);
    }

    #[test]
    fn test_fit_empty_secondary() {
        assert_eq!(Budget::new(10).fit("title", ""), "title");
        assert_eq!(Budget::new(10).fit("", "only"), "only");
    }

    #[test]
    fn test_fit_start_side_for_paths() {
        let budget = Budget::new(16).separator(": ").secondary_side(Side::Start);
        assert_eq!(budget.fit("ctx", "/very/long/namespace"), "ctx: ⋯/namespace");
    }
}
