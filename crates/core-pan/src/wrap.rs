//! Word-wrap reflow of a fixed cell layout.
//!
//! A word is a run of non-blank cells. Scanning left to right, every time the
//! output reaches a column boundary one of three things happens:
//!
//! * the next input cell is blank: it and every blank after it are dropped,
//!   the next row starts with the following word;
//! * the word straddling the boundary began after the start of the current
//!   row: its cells already emitted on this row are overwritten with blanks and
//!   the word is emitted again from the start of the next row;
//! * otherwise (the word began at the row start, so it is longer than a row,
//!   or it begins exactly at the boundary) the cell is emitted as-is.
//!
//! Padding blanks inherit the text offset of the cell before them, which keeps
//! the cell-to-text map non-decreasing.

use core_cells::{Cell, is_blank};

use crate::viewport::CursorRange;

/// Output of one reflow pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedLayout {
    pub cells: Vec<Cell>,
    pub cell_to_text: Vec<usize>,
    /// Fixed-layout cursor bounds relocated into `cells`.
    pub cursor: CursorRange,
    /// Number of words moved down to the next row.
    pub words_moved: usize,
}

/// Locates fixed cursor bounds in the wrapped output as cells are emitted.
struct CursorTracker {
    fixed: CursorRange,
    wrapped: CursorRange,
}

impl CursorTracker {
    fn new(fixed: CursorRange) -> Self {
        Self {
            fixed,
            wrapped: CursorRange::UNSET,
        }
    }

    fn record(&mut self, fixed_index: usize, wrapped_index: usize) {
        let f = fixed_index as isize;
        let w = wrapped_index as isize;
        if self.wrapped.start < 0 && self.fixed.start >= 0 && f >= self.fixed.start {
            self.wrapped.start = w;
        }
        if self.wrapped.end < 0 && self.fixed.end >= 0 && f >= self.fixed.end {
            self.wrapped.end = w;
        }
    }

    /// Bounds recorded inside a word that is about to be moved.
    fn forget_from(&mut self, wrapped_index: usize) {
        let w = wrapped_index as isize;
        if self.wrapped.start >= w {
            self.wrapped.start = -1;
        }
        if self.wrapped.end >= w {
            self.wrapped.end = -1;
        }
    }

    fn finish(mut self, wrapped_len: usize) -> CursorRange {
        let len = wrapped_len as isize;
        if self.wrapped.start < 0 && self.fixed.start >= 0 {
            self.wrapped.start = len;
        }
        if self.wrapped.end < 0 && self.fixed.end >= 0 {
            self.wrapped.end = len;
        }
        self.wrapped
    }
}

/// Reflow `cells` into rows of `columns` cells so words do not cross a row
/// boundary unless they are longer than a row.
///
/// `cell_to_text` must be parallel to `cells`. With `columns == 0` the layout
/// is copied unchanged.
pub fn wrap_cells(
    cells: &[Cell],
    cell_to_text: &[usize],
    columns: usize,
    cursor: CursorRange,
) -> WrappedLayout {
    debug_assert_eq!(cells.len(), cell_to_text.len());
    let len = cells.len().min(cell_to_text.len());

    let mut out_cells: Vec<Cell> = Vec::with_capacity(len);
    let mut out_map: Vec<usize> = Vec::with_capacity(len);
    let mut tracker = CursorTracker::new(cursor);
    let mut words_moved = 0;
    // Wrapped index of the first cell of the current word.
    let mut word_start = 0usize;
    let mut i = 0usize;

    while i < len {
        let w = out_cells.len();
        if columns != 0 && w != 0 && w % columns == 0 {
            if is_blank(cells[i]) {
                while i < len && is_blank(cells[i]) {
                    i += 1;
                }
                word_start = w;
                continue;
            }
            let line_start = w - columns;
            let straddles = out_cells.last().is_some_and(|c| !is_blank(*c));
            if straddles && word_start > line_start && word_start < w {
                for j in word_start..w {
                    out_cells[j] = 0;
                    out_map[j] = out_map[j - 1];
                }
                i -= w - word_start;
                tracker.forget_from(word_start);
                word_start = w;
                words_moved += 1;
                continue;
            }
        } else if is_blank(cells[i]) {
            word_start = w + 1;
        }
        tracker.record(i, w);
        out_cells.push(cells[i]);
        out_map.push(cell_to_text[i]);
        i += 1;
    }

    let cursor = tracker.finish(out_cells.len());
    WrappedLayout {
        cells: out_cells,
        cell_to_text: out_map,
        cursor,
        words_moved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn identity(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn aligned_words_are_untouched() {
        let cells = [1, 2, 3, 0, 4, 5, 6, 0];
        let out = wrap_cells(&cells, &identity(8), 4, CursorRange::UNSET);
        assert_eq!(out.cells, cells.to_vec());
        assert_eq!(out.cell_to_text, identity(8));
        assert_eq!(out.words_moved, 0);
    }

    #[test]
    fn straddling_word_moves_to_next_row() {
        let cells = [1, 0, 2, 3, 4, 0, 5];
        let out = wrap_cells(&cells, &identity(7), 4, CursorRange::UNSET);
        assert_eq!(out.cells, vec![1, 0, 0, 0, 2, 3, 4, 0, 5]);
        // Padding inherits the offset of the blank before the word.
        assert_eq!(out.cell_to_text, vec![0, 1, 1, 1, 2, 3, 4, 5, 6]);
        assert_eq!(out.words_moved, 1);
    }

    #[test]
    fn long_word_splits() {
        let cells = [1, 2, 3, 4, 5, 6];
        let out = wrap_cells(&cells, &identity(6), 4, CursorRange::UNSET);
        assert_eq!(out.cells, cells.to_vec());
        assert_eq!(out.words_moved, 0);
    }

    #[test]
    fn blanks_at_row_start_are_trimmed() {
        let cells = [1, 2, 3, 4, 0, 0, 5];
        let out = wrap_cells(&cells, &identity(7), 4, CursorRange::UNSET);
        assert_eq!(out.cells, vec![1, 2, 3, 4, 5]);
        assert_eq!(out.cell_to_text, vec![0, 1, 2, 3, 6]);
    }

    #[test]
    fn word_after_leading_blank_wraps() {
        let cells = [0, 1, 2, 3, 4];
        let out = wrap_cells(&cells, &identity(5), 4, CursorRange::UNSET);
        assert_eq!(out.cells, vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn cursor_follows_moved_word() {
        let cells = [1, 0, 2, 3, 4, 0, 5];
        let out = wrap_cells(&cells, &identity(7), 4, CursorRange::new(3, 5));
        // Fixed 3 (cell `3`) now sits at 5, fixed 5 (the blank) at 7.
        assert_eq!(out.cursor, CursorRange::new(5, 7));
    }

    #[test]
    fn cursor_on_trimmed_blank_lands_on_next_cell() {
        let cells = [1, 2, 3, 4, 0, 0, 5];
        let out = wrap_cells(&cells, &identity(7), 4, CursorRange::new(4, 7));
        assert_eq!(out.cursor, CursorRange::new(4, 5));
    }

    #[test]
    fn unset_cursor_stays_unset() {
        let out = wrap_cells(&[1, 2], &identity(2), 4, CursorRange::UNSET);
        assert_eq!(out.cursor, CursorRange::UNSET);
    }

    #[test]
    fn zero_columns_copies() {
        let cells = [1, 0, 2];
        let out = wrap_cells(&cells, &identity(3), 0, CursorRange::new(1, 2));
        assert_eq!(out.cells, cells.to_vec());
        assert_eq!(out.cursor, CursorRange::new(1, 2));
    }
}
