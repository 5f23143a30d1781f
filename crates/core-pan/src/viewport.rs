//! Display geometry, viewport window and cursor range.
//!
//! Rows and cursor bounds are signed: the pan loop parks the viewport on the
//! `{-1, -1}` sentinel before stepping forward, and an unset cursor is
//! `{-1, -1}` as well. Anything derived from them for indexing goes through
//! the clamping helpers here so a stray negative never reaches a slice.

/// `n` as a signed row or index, saturating at `isize::MAX`.
pub(crate) fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

/// Physical (or virtual) braille display capacity. `(0, 0)` means no display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplaySize {
    pub rows: usize,
    pub columns: usize,
}

impl DisplaySize {
    pub const NONE: Self = Self {
        rows: 0,
        columns: 0,
    };

    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Total cell capacity.
    pub fn cells(&self) -> usize {
        self.rows.saturating_mul(self.columns)
    }

    pub fn is_attached(&self) -> bool {
        self.cells() != 0
    }

    /// `ceil(len / columns)`, zero when there are no columns.
    pub fn line_count(&self, len: usize) -> usize {
        if self.columns == 0 {
            0
        } else {
            len.div_ceil(self.columns)
        }
    }
}

/// Inclusive row window into the active layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first_row: isize,
    pub last_row: isize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Viewport {
    /// Parking position used while `pan_to_position` steps forward.
    pub const INVALID: Self = Self {
        first_row: -1,
        last_row: -1,
    };

    pub fn new(first_row: isize, last_row: isize) -> Self {
        Self {
            first_row,
            last_row,
        }
    }

    /// First page for a display of `rows` rows.
    pub fn first_page(rows: usize) -> Self {
        Self::new(0, signed(rows) - 1)
    }

    pub fn is_invalid(&self) -> bool {
        self.first_row < 0
    }

    /// Number of rows covered (0 when reversed).
    pub fn row_count(&self) -> usize {
        self.last_row
            .saturating_sub(self.first_row)
            .saturating_add(1)
            .max(0) as usize
    }

    /// Half-open cell range `[first_row * columns, (last_row + 1) * columns)`,
    /// both ends clamped at zero and saturating at `usize::MAX`.
    pub fn cell_range(&self, columns: usize) -> std::ops::Range<usize> {
        let start = (self.first_row.max(0) as usize).saturating_mul(columns);
        let end = (self.last_row.saturating_add(1).max(0) as usize).saturating_mul(columns);
        start..end.max(start)
    }
}

/// Cursor span in cell indices, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorRange {
    pub start: isize,
    pub end: isize,
}

impl Default for CursorRange {
    fn default() -> Self {
        Self::UNSET
    }
}

impl CursorRange {
    pub const UNSET: Self = Self { start: -1, end: -1 };

    pub fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    /// Cells the overlay may touch in a buffer of `len` cells, or `None`
    /// unless the span is ordered and lies inside the buffer.
    pub fn overlay_span(&self, len: usize) -> Option<std::ops::Range<usize>> {
        if self.start < 0 || self.end < self.start {
            return None;
        }
        let (start, end) = (self.start as usize, self.end as usize);
        if start >= len || end > len {
            return None;
        }
        Some(start..end)
    }
}
