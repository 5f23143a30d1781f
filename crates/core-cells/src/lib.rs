//! Braille cell bit layout.
//!
//! A cell is one byte holding an 8-dot pattern laid out as a 2 column by
//! 4 row dot grid. Bit `n` is dot `n + 1`:
//!
//! ```text
//!          col 0    col 1
//! row 0    dot 1    dot 4      bit 0   bit 3
//! row 1    dot 2    dot 5      bit 1   bit 4
//! row 2    dot 3    dot 6      bit 2   bit 5
//! row 3    dot 7    dot 8      bit 6   bit 7
//! ```
//!
//! Rows 0..=2 carry the six main dots; row 3 holds the two extension dots
//! used by 8-dot braille and by the cursor overlay.
//!
//! Everything that manipulates dots goes through the named masks and the
//! `(col, row)` accessors below so the spacing transform and cursor overlay
//! can be audited against the table above rather than against bit literals.

use bitflags::bitflags;

/// One braille cell (dot pattern).
pub type Cell = u8;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dots: u8 {
        const DOT1 = 0b0000_0001;
        const DOT2 = 0b0000_0010;
        const DOT3 = 0b0000_0100;
        const DOT4 = 0b0000_1000;
        const DOT5 = 0b0001_0000;
        const DOT6 = 0b0010_0000;
        const DOT7 = 0b0100_0000;
        const DOT8 = 0b1000_0000;
    }
}

/// Dots 1-6 (dot-rows 0..=2).
pub const SIX_DOT_MASK: Dots = Dots::DOT1
    .union(Dots::DOT2)
    .union(Dots::DOT3)
    .union(Dots::DOT4)
    .union(Dots::DOT5)
    .union(Dots::DOT6);

/// Dots 7 and 8 (dot-row 3).
pub const EXTENSION_DOTS: Dots = Dots::DOT7.union(Dots::DOT8);

/// Pattern raised under every cell covered by the cursor.
pub const CURSOR_DOTS: Dots = EXTENSION_DOTS;

/// Number of dot columns in one cell.
pub const DOT_COLUMNS: usize = 2;
/// Number of dot rows in one cell.
pub const DOT_ROWS: usize = 4;

// Indexed [col][row].
const DOT_GRID: [[Dots; DOT_ROWS]; DOT_COLUMNS] = [
    [Dots::DOT1, Dots::DOT2, Dots::DOT3, Dots::DOT7],
    [Dots::DOT4, Dots::DOT5, Dots::DOT6, Dots::DOT8],
];

/// Dot at grid coordinate `(col, row)`. Out-of-grid coordinates map to no dot.
pub fn dot(col: usize, row: usize) -> Dots {
    if col < DOT_COLUMNS && row < DOT_ROWS {
        DOT_GRID[col][row]
    } else {
        Dots::empty()
    }
}

/// An all-zero cell separates words.
#[inline]
pub fn is_blank(cell: Cell) -> bool {
    cell == 0
}

/// Whether the dot at `(col, row)` is raised in `cell`.
pub fn dot_at(cell: Cell, col: usize, row: usize) -> bool {
    let d = dot(col, row);
    !d.is_empty() && Dots::from_bits_retain(cell).contains(d)
}

/// Return `cell` with the dot at `(col, row)` raised or lowered.
pub fn with_dot(cell: Cell, col: usize, row: usize, raised: bool) -> Cell {
    let mut dots = Dots::from_bits_retain(cell);
    dots.set(dot(col, row), raised);
    dots.bits()
}

/// Raise (`show == true`) or clear the cursor overlay dots.
pub fn apply_cursor(cell: Cell, show: bool) -> Cell {
    let dots = Dots::from_bits_retain(cell);
    if show {
        (dots | CURSOR_DOTS).bits()
    } else {
        (dots - CURSOR_DOTS).bits()
    }
}

/// Cell columns and rows one spaced character occupies.
pub const BLOCK_COLUMNS: usize = 2;
pub const BLOCK_ROWS: usize = 2;

// Dots of a character carried by each cell of its block.
const QUADRANT_COLUMNS: usize = DOT_COLUMNS / BLOCK_COLUMNS;
const QUADRANT_ROWS: usize = DOT_ROWS / BLOCK_ROWS;

/// Fixed layout after the multi-row spacing transform, with its own
/// cell-to-text map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpacedLayout {
    pub cells: Vec<Cell>,
    pub cell_to_text: Vec<usize>,
}

/// Index of the top-left cell of the block holding character `index` in a
/// spaced layout `columns` cells wide. Identity when no block fits a row.
pub fn spaced_index(index: usize, columns: usize) -> usize {
    let per_row = columns / BLOCK_COLUMNS;
    if per_row == 0 {
        return index;
    }
    (index / per_row)
        .saturating_mul(BLOCK_ROWS)
        .saturating_mul(columns)
        .saturating_add((index % per_row) * BLOCK_COLUMNS)
}

/// Space the characters of a multi-row display so neighbours never touch.
///
/// Each character is re-encoded onto a 2x2 block of display cells, blocks
/// flowing left to right, `columns / 2` per block row. Every cell of the
/// block carries one quadrant of the character (one dot column, two dot
/// rows) in its dots 1 and 2:
///
/// ```text
/// character       block
/// 1 4             [1 2] [4 5]      top-left, top-right
/// 2 5             [3 7] [6 8]      bottom-left, bottom-right
/// 3 6
/// 7 8
/// ```
///
/// Dot column 1 and dot rows 2..=3 of every output cell stay blank, which
/// puts one blank dot column between horizontally adjacent cells and two
/// blank dot-rows between vertically adjacent display rows. All eight dots
/// survive. The output ends after the last block's bottom-right cell.
///
/// Each output cell maps to the text offset of the latest character placed
/// at or before it in row order, so the map stays non-decreasing even though
/// a block row interleaves characters across two display rows.
///
/// Returns `None` (cells left untouched by the caller) unless both `rows` and
/// `columns` are even and non-zero.
pub fn space_multiline(
    cells: &[Cell],
    cell_to_text: &[usize],
    rows: usize,
    columns: usize,
) -> Option<SpacedLayout> {
    if rows == 0 || columns == 0 || rows % BLOCK_ROWS != 0 || columns % BLOCK_COLUMNS != 0 {
        return None;
    }
    let Some(last) = cells.len().checked_sub(1) else {
        return Some(SpacedLayout::default());
    };
    let len = spaced_index(last, columns)
        .checked_add(columns.checked_mul(BLOCK_ROWS - 1)?)?
        .checked_add(BLOCK_COLUMNS)?;

    let mut out = vec![0; len];
    let mut owner: Vec<Option<usize>> = vec![None; len];
    for (i, &cell) in cells.iter().enumerate() {
        let origin = spaced_index(i, columns);
        for col in 0..DOT_COLUMNS {
            for row in 0..DOT_ROWS {
                let index = origin + (row / QUADRANT_ROWS) * columns + col / QUADRANT_COLUMNS;
                let Some(slot) = out.get_mut(index) else {
                    continue;
                };
                if dot_at(cell, col, row) {
                    *slot = with_dot(*slot, col % QUADRANT_COLUMNS, row % QUADRANT_ROWS, true);
                }
                owner[index] = Some(i);
            }
        }
    }

    let mut reached = 0;
    let spaced_map = owner
        .iter()
        .map(|placed| {
            if let Some(i) = *placed {
                reached = reached.max(i);
            }
            cell_to_text
                .get(reached)
                .or(cell_to_text.last())
                .copied()
                .unwrap_or(0)
        })
        .collect();
    Some(SpacedLayout {
        cells: out,
        cell_to_text: spaced_map,
    })
}
