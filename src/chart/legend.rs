//! Two-column legend layout with word-wrapped labels.
//!
//! Positions are expressed in text lines so the layout stays independent of fonts; the element
//! layer multiplies them by the rendered line height.

use genpdf::style::Color;

use super::pie::PieLayout;

/// One legend entry: a swatch and its wrapped label.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    /// Swatch color, matching the pie slice.
    pub color: Color,
    /// Label text split into lines no wider than the character budget.
    pub lines: Vec<String>,
    /// Number of lines above this entry in its column.
    pub line_offset: usize,
}

/// Position in a legend that is drawn over several pages: the next entry of each column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LegendCursor([usize; 2]);

/// The part of a legend that fits into a given number of lines.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendWindow<'a> {
    /// Entries to draw as (column, entry, first line relative to the window top).
    pub entries: Vec<(usize, &'a LegendEntry, usize)>,
    /// Where the following window starts; `None` once every entry is drawn.
    pub next: Option<LegendCursor>,
}

/// Legend entries split into two columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegendLayout {
    columns: [Vec<LegendEntry>; 2],
}

impl LegendLayout {
    /// Lays out one entry per slice, labelled `"<label> (<percentage>%)"`.
    ///
    /// The first `ceil(n / 2)` entries go into the left column. Each entry starts below the
    /// last line of the previous entry in the same column.
    pub fn from_pie(pie: &PieLayout, max_chars: usize) -> Self {
        let labelled = pie.slices().iter().map(|slice| {
            (
                slice.color,
                format!("{} ({:.1}%)", slice.label, slice.percentage),
            )
        });
        Self::from_labels(labelled, max_chars)
    }

    /// Lays out arbitrary (color, label) pairs in the given order.
    pub fn from_labels<I>(labels: I, max_chars: usize) -> Self
    where
        I: IntoIterator<Item = (Color, String)>,
    {
        let labels: Vec<_> = labels.into_iter().collect();
        let split = labels.len().div_ceil(2);

        let mut columns: [Vec<LegendEntry>; 2] = Default::default();
        for (index, (color, label)) in labels.into_iter().enumerate() {
            let column = &mut columns[usize::from(index >= split)];
            let line_offset = column
                .last()
                .map(|entry: &LegendEntry| entry.line_offset + entry.lines.len())
                .unwrap_or(0);
            column.push(LegendEntry {
                color,
                lines: wrap_label(&label, max_chars),
                line_offset,
            });
        }

        Self { columns }
    }

    /// Returns the left and right columns.
    pub fn columns(&self) -> &[Vec<LegendEntry>; 2] {
        &self.columns
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Returns `true` when the legend has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Height of the taller column, in lines.
    pub fn height_in_lines(&self) -> usize {
        self.columns
            .iter()
            .filter_map(|column| column.last())
            .map(|entry| entry.line_offset + entry.lines.len())
            .max()
            .unwrap_or(0)
    }

    /// Selects the entries from `cursor` on that fit into `capacity` lines.
    ///
    /// Both columns advance together: the window starts at the highest pending entry and an
    /// entry is only taken when all of its lines fit. At least one entry is taken per window, so
    /// repeated calls always finish.
    pub fn window(&self, cursor: LegendCursor, capacity: usize) -> LegendWindow<'_> {
        let base = self
            .columns
            .iter()
            .zip(cursor.0)
            .filter_map(|(column, next)| column.get(next))
            .map(|entry| entry.line_offset)
            .min();
        let Some(base) = base else {
            return LegendWindow {
                entries: Vec::new(),
                next: None,
            };
        };

        let mut next = cursor.0;
        let mut entries = Vec::new();
        for (index, column) in self.columns.iter().enumerate() {
            for entry in column.iter().skip(cursor.0[index]) {
                let top = entry.line_offset - base;
                if top + entry.lines.len() > capacity {
                    break;
                }
                entries.push((index, entry, top));
                next[index] += 1;
            }
        }

        if entries.is_empty() {
            if let Some((index, entry)) = self
                .columns
                .iter()
                .enumerate()
                .filter_map(|(index, column)| {
                    column.get(cursor.0[index]).map(|entry| (index, entry))
                })
                .find(|(_, entry)| entry.line_offset == base)
            {
                entries.push((index, entry, 0));
                next[index] += 1;
            }
        }

        let finished = self
            .columns
            .iter()
            .zip(next)
            .all(|(column, next)| next >= column.len());
        LegendWindow {
            entries,
            next: (!finished).then_some(LegendCursor(next)),
        }
    }
}

/// Greedy word wrap to at most `max_chars` characters per line.
///
/// Words longer than the budget are split across lines. Always returns at least one line.
pub fn wrap_label(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }

        let word_len = chars.len();
        if word_len == 0 {
            continue;
        }
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::color_for_rank;

    fn labels(texts: &[&str]) -> Vec<(Color, String)> {
        texts
            .iter()
            .enumerate()
            .map(|(rank, text)| (color_for_rank(rank), text.to_string()))
            .collect()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_label("Native Hawaiian or Other Pacific Islander (0.2%)", 20),
            ["Native Hawaiian or", "Other Pacific", "Islander (0.2%)"]
        );
    }

    #[test]
    fn splits_words_longer_than_budget() {
        assert_eq!(wrap_label("abcdefghij xy", 4), ["abcd", "efgh", "ij", "xy"]);
        assert_eq!(wrap_label("ab abcdefgh", 4), ["ab", "abcd", "efgh"]);
    }

    #[test]
    fn empty_label_still_occupies_a_line() {
        assert_eq!(wrap_label("", 10), [""]);
        assert_eq!(wrap_label("   ", 10), [""]);
    }

    #[test]
    fn first_column_takes_the_larger_half() {
        let legend = LegendLayout::from_labels(labels(&["a", "b", "c", "d", "e"]), 10);
        let [left, right] = legend.columns();
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 2);
        assert_eq!(left[0].color, color_for_rank(0));
        assert_eq!(right[0].color, color_for_rank(3));
    }

    #[test]
    fn wrapped_entries_push_following_entries_down() {
        let legend = LegendLayout::from_labels(
            labels(&["a very long label that wraps", "short", "x", "y"]),
            10,
        );
        let [left, right] = legend.columns();
        assert_eq!(left[0].lines.len(), 3);
        assert_eq!(left[1].line_offset, 3);
        assert_eq!(right[1].line_offset, 1);
        assert_eq!(legend.height_in_lines(), 4);

        for column in legend.columns() {
            for pair in column.windows(2) {
                assert!(pair[1].line_offset >= pair[0].line_offset + pair[0].lines.len());
            }
        }
    }

    #[test]
    fn window_holding_every_line_takes_the_whole_legend() {
        let legend = LegendLayout::from_labels(labels(&["a", "b", "c", "d", "e"]), 10);
        let window = legend.window(LegendCursor::default(), legend.height_in_lines());
        assert_eq!(window.entries.len(), 5);
        assert_eq!(window.next, None);
    }

    #[test]
    fn long_legend_is_split_into_windows_without_repeats() {
        let texts: Vec<String> = (0..200).map(|i| format!("School number {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let legend = LegendLayout::from_labels(labels(&refs), 28);

        let mut cursor = Some(LegendCursor::default());
        let mut drawn = Vec::new();
        let mut windows = 0;
        while let Some(current) = cursor {
            let window = legend.window(current, 40);
            assert!(!window.entries.is_empty());
            for &(_, entry, top) in &window.entries {
                assert!(top + entry.lines.len() <= 40);
                drawn.push(entry.lines.join(" "));
            }
            cursor = window.next;
            windows += 1;
        }

        assert_eq!(windows, 3);
        drawn.sort();
        let mut expected = texts.clone();
        expected.sort();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn oversized_entry_still_makes_progress() {
        let legend = LegendLayout::from_labels(labels(&["abcdefghijklmno", "x"]), 3);

        let first = legend.window(LegendCursor::default(), 2);
        assert_eq!(first.entries.len(), 1);
        assert_eq!(first.entries[0].0, 1);
        let next = first.next.expect("left entry still pending");

        let second = legend.window(next, 2);
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.entries[0].1.lines.len(), 5);
        assert_eq!(second.next, None);

        let forced = legend.window(LegendCursor::default(), 0);
        assert_eq!(forced.entries.len(), 1);
        assert!(forced.next.is_some());
    }

    #[test]
    fn empty_legend_has_no_height() {
        let legend = LegendLayout::from_labels(Vec::new(), 10);
        assert!(legend.is_empty());
        assert_eq!(legend.height_in_lines(), 0);
    }
}
