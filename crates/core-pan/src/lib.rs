//! Braille viewport pan/wrap engine.
//!
//! `PanStrategy` keeps two layouts of the same translated content:
//!
//! * the **fixed** layout: cells as produced by the translator, re-encoded
//!   onto spaced 2x2 cell blocks on multi-row displays (see
//!   `core_cells::space_multiline`);
//! * the **wrapped** layout: the fixed cells reflowed so words do not cross a
//!   row boundary (see [`wrap`]).
//!
//! A [`Viewport`] (inclusive row window) selects what the display shows from
//! whichever layout is active. Each layout carries a cell-to-text map giving,
//! for every cell, the char index in the text buffer of the first character
//! that produced it; the maps let callers align braille and print.
//!
//! Contract:
//! - Every public operation is total. Degenerate geometry (no rows, no
//!   columns) and out-of-range cursors degrade to empty or single-row output,
//!   never to a panic: braille output must keep flowing.
//! - Both layouts are replaced wholesale by `set_content`. The only in-place
//!   mutation is the cursor overlay applied by
//!   [`PanStrategy::current_braille_viewport_contents`].
//! - The wrapped cursor is recomputed by the wrap pass only. After
//!   `set_cursor`, re-run `set_content` before relying on it in wrapped mode.
//! - Single owner, synchronous. Use [`SharedPanStrategy`] to hand the engine to
//!   more than one thread.
//!
//! Logging policy: events carry sizes and indices only, never text content.

pub mod metrics;
pub mod shared;
pub mod viewport;
pub mod wrap;

use core_cells::{Cell, SpacedLayout, apply_cursor, space_multiline, spaced_index};
use core_config::Config;
use tracing::{debug, trace, warn};

pub use core_config::PanMode;
pub use metrics::{PanMetrics, PanMetricsSnapshot};
pub use shared::SharedPanStrategy;
pub use viewport::{CursorRange, DisplaySize, Viewport};
use viewport::signed;
pub use wrap::{WrappedLayout, wrap_cells};

/// Alignment anchor between braille cells and text for the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceOffsets {
    pub braille_offset: usize,
    pub text_offset: usize,
}

#[derive(Debug)]
pub struct PanStrategy {
    display: DisplaySize,
    mode: PanMode,
    spacing_enabled: bool,
    show_cursor_default: bool,

    text: String,
    text_chars: usize,
    // Translator output as received; re-layout after a geometry or mode
    // change starts from these so spacing is never applied twice.
    source_cells: Vec<Cell>,
    source_cell_to_text: Vec<usize>,

    fixed_cells: Vec<Cell>,
    fixed_cell_to_text: Vec<usize>,
    wrapped_cells: Vec<Cell>,
    wrapped_cell_to_text: Vec<usize>,

    viewport: Viewport,
    cursor: CursorRange,
    wrapped_cursor: CursorRange,

    metrics: PanMetrics,
}

impl Default for PanStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PanStrategy {
    /// No display, no content, fixed layout.
    pub fn new() -> Self {
        Self {
            display: DisplaySize::NONE,
            mode: PanMode::Fixed,
            spacing_enabled: true,
            show_cursor_default: true,
            text: String::new(),
            text_chars: 0,
            source_cells: Vec::new(),
            source_cell_to_text: Vec::new(),
            fixed_cells: Vec::new(),
            fixed_cell_to_text: Vec::new(),
            wrapped_cells: Vec::new(),
            wrapped_cell_to_text: Vec::new(),
            viewport: Viewport::default(),
            cursor: CursorRange::UNSET,
            wrapped_cursor: CursorRange::UNSET,
            metrics: PanMetrics::default(),
        }
    }

    pub fn with_display(size: DisplaySize, mode: PanMode) -> Self {
        let mut pan = Self::new();
        pan.mode = mode;
        pan.set_display_size(size.rows, size.columns);
        pan
    }

    /// Build from resolved configuration (call `Config::apply_context` first
    /// when hardware geometry is known).
    pub fn from_config(cfg: &Config) -> Self {
        let mut pan = Self::new();
        pan.mode = cfg.file.pan.strategy;
        pan.spacing_enabled = cfg.effective.spacing;
        pan.show_cursor_default = cfg.file.cursor.show;
        pan.set_display_size(cfg.effective.rows, cfg.effective.columns);
        pan
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    /// Store the new geometry and re-derive both layouts from the last
    /// translator output, panning back to the start.
    pub fn set_display_size(&mut self, rows: usize, columns: usize) {
        debug!(target: "pan.layout", rows, columns, "display_size_set");
        self.display = DisplaySize::new(rows, columns);
        self.relayout();
    }

    // Lay the stored translator output out again and pan to the start.
    fn relayout(&mut self) {
        let text = std::mem::take(&mut self.text);
        let cells = std::mem::take(&mut self.source_cells);
        let map = std::mem::take(&mut self.source_cell_to_text);
        self.set_content(text, cells, map, 0);
    }

    /// Select the wrapped (`true`) or fixed layout and pan to the start.
    pub fn set_pan_strategy(&mut self, wrapped: bool) {
        self.set_mode(PanMode::from_wrapped(wrapped));
    }

    /// Switch layouts and pan to the start. A real switch re-lays out the
    /// content, since spacing only ever applies to the fixed layout.
    pub fn set_mode(&mut self, mode: PanMode) {
        if mode == self.mode {
            self.pan_to_position(0);
            return;
        }
        self.mode = mode;
        self.relayout();
    }

    /// Enable or disable the multi-row spacing transform. Takes effect on the
    /// next `set_content`.
    pub fn set_multirow_spacing(&mut self, enabled: bool) {
        self.spacing_enabled = enabled;
    }

    /// Replace the content and lay it out again.
    ///
    /// `cell_to_text` should be parallel to `cells`; a mismatched map is
    /// truncated, or extended with its last entry, to fit. `target_position`
    /// is a translator cell offset the viewport will overlap afterwards; when
    /// the fixed layout is spaced it is moved to the block holding that cell.
    pub fn set_content(
        &mut self,
        text: impl Into<String>,
        cells: Vec<Cell>,
        mut cell_to_text: Vec<usize>,
        target_position: usize,
    ) {
        PanMetrics::bump(&self.metrics.content_sets, 1);
        self.viewport = Viewport::first_page(self.display.rows);
        self.wrapped_cell_to_text.clear();
        self.wrapped_cells.clear();

        self.text = text.into();
        self.text_chars = self.text.chars().count();
        self.source_cells = cells;
        if cell_to_text.len() != self.source_cells.len() {
            warn!(
                target: "pan.layout",
                cells = self.source_cells.len(),
                map = cell_to_text.len(),
                "cell_to_text_length_mismatch"
            );
            let fill = cell_to_text.last().copied().unwrap_or(0);
            cell_to_text.resize(self.source_cells.len(), fill);
        }
        self.source_cell_to_text = cell_to_text;
        let target_position = match self.layout_spaced() {
            Some(spaced) => {
                self.fixed_cells = spaced.cells;
                self.fixed_cell_to_text = spaced.cell_to_text;
                spaced_index(target_position, self.display.columns)
            }
            None => {
                self.fixed_cells = self.source_cells.clone();
                self.fixed_cell_to_text = self.source_cell_to_text.clone();
                target_position
            }
        };

        let wrapped = wrap_cells(
            &self.fixed_cells,
            &self.fixed_cell_to_text,
            self.display.columns,
            self.cursor,
        );
        PanMetrics::bump(&self.metrics.rewraps, wrapped.words_moved as u64);
        self.wrapped_cells = wrapped.cells;
        self.wrapped_cell_to_text = wrapped.cell_to_text;
        self.wrapped_cursor = wrapped.cursor;

        debug!(
            target: "pan.layout",
            fixed_cells = self.fixed_cells.len(),
            wrapped_cells = self.wrapped_cells.len(),
            words_moved = wrapped.words_moved,
            rows = self.display.rows,
            columns = self.display.columns,
            wrapped_mode = self.mode.is_wrapped(),
            target_position,
            "content_set"
        );
        self.pan_to_position(target_position);
    }

    // Spaced fixed layout, or `None` when the translator cells are used as-is.
    fn layout_spaced(&self) -> Option<SpacedLayout> {
        let DisplaySize { rows, columns } = self.display;
        if self.source_cells.is_empty()
            || self.mode.is_wrapped()
            || rows <= 1
            || !self.spacing_enabled
        {
            return None;
        }
        let spaced = space_multiline(&self.source_cells, &self.source_cell_to_text, rows, columns);
        if spaced.is_some() {
            PanMetrics::bump(&self.metrics.spacing_applied, 1);
        } else {
            PanMetrics::bump(&self.metrics.spacing_skipped, 1);
            debug!(target: "pan.layout", rows, columns, "multiline_spacing_skipped");
        }
        spaced
    }

    // ---------------------------------------------------------------------
    // Cursor
    // ---------------------------------------------------------------------

    /// Store the fixed-layout cursor span (`end` exclusive). The wrapped
    /// cursor is refreshed by the next `set_content`.
    pub fn set_cursor(&mut self, start: isize, end: isize) {
        trace!(target: "pan.cursor", start, end, "cursor_set");
        self.cursor = CursorRange::new(start, end);
    }

    pub fn cursor(&self) -> CursorRange {
        self.cursor
    }

    pub fn wrapped_cursor(&self) -> CursorRange {
        self.wrapped_cursor
    }

    // ---------------------------------------------------------------------
    // Panning
    // ---------------------------------------------------------------------

    /// Pan forward one display's worth of rows. Returns `false`, leaving the
    /// viewport alone, when no rows follow.
    pub fn next(&mut self) -> bool {
        let moved = self.step_forward();
        if moved {
            PanMetrics::bump(&self.metrics.pans_next, 1);
            trace!(
                target: "pan.viewport",
                first_row = self.viewport.first_row,
                last_row = self.viewport.last_row,
                "pan_next"
            );
        } else {
            PanMetrics::bump(&self.metrics.pan_rejected, 1);
        }
        moved
    }

    fn step_forward(&mut self) -> bool {
        let line_count = signed(self.line_count());
        let rows = signed(self.display.rows);
        let new_start = self.viewport.last_row.saturating_add(1);
        let new_end = new_start
            .saturating_add(rows)
            .saturating_sub(1)
            .min(line_count - 1);
        if new_end >= new_start {
            self.viewport = Viewport::new(new_start, new_end);
            true
        } else {
            false
        }
    }

    /// Pan backward one display's worth of rows. Returns `false` at the top.
    ///
    /// Panning back into the first page yields `last_row = min(rows,
    /// line_count)`, which can cover one row more than the display holds.
    pub fn previous(&mut self) -> bool {
        let line_count = signed(self.line_count());
        let rows = signed(self.display.rows);
        let first = self.viewport.first_row;
        if first > 0 {
            let (new_start, new_end) = if first < rows {
                (0, rows.min(line_count))
            } else {
                (first - rows, first - 1)
            };
            if new_start <= new_end {
                self.viewport = Viewport::new(new_start, new_end);
                PanMetrics::bump(&self.metrics.pans_previous, 1);
                trace!(
                    target: "pan.viewport",
                    first_row = new_start,
                    last_row = new_end,
                    "pan_previous"
                );
                return true;
            }
        }
        PanMetrics::bump(&self.metrics.pan_rejected, 1);
        false
    }

    /// Move the viewport so it covers `position`, a cell offset in the active
    /// layout's row grid. Pages are stepped from the start so the window
    /// always lands on the same row boundaries `next` produces.
    pub fn pan_to_position(&mut self, position: usize) {
        if !self.display.is_attached() {
            let p = signed(position);
            self.viewport = Viewport::new(p, p);
            return;
        }
        self.viewport = Viewport::INVALID;
        while self.step_forward() {
            if self.viewport.cell_range(self.display.columns).end > position {
                break;
            }
        }
        if self.viewport.is_invalid() {
            // Nothing to show: park on the first page.
            self.viewport = Viewport::first_page(self.display.rows);
        }
        trace!(
            target: "pan.viewport",
            position,
            first_row = self.viewport.first_row,
            last_row = self.viewport.last_row,
            "pan_to_position"
        );
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Cells under the viewport.
    ///
    /// This is a command as well as a query: before slicing, the cursor
    /// overlay dots are raised (`show_cursor`) or cleared across the active
    /// cursor span **in the stored layout**. Alternating calls make the cursor
    /// blink; the stored buffer keeps whatever the last call left.
    pub fn current_braille_viewport_contents(&mut self, show_cursor: bool) -> Vec<Cell> {
        let columns = self.display.columns;
        let (buf, cursor) = match self.mode {
            PanMode::Fixed => (&mut self.fixed_cells, self.cursor),
            PanMode::Wrapped => (&mut self.wrapped_cells, self.wrapped_cursor),
        };
        if let Some(span) = cursor.overlay_span(buf.len()) {
            for cell in &mut buf[span] {
                *cell = apply_cursor(*cell, show_cursor);
            }
        }
        let range = self.viewport.cell_range(columns);
        let end = range.end.min(buf.len());
        let start = range.start.min(end);
        buf[start..end].to_vec()
    }

    /// `current_braille_viewport_contents` with the configured cursor
    /// visibility (shown unless configuration says otherwise).
    pub fn current_braille_viewport_contents_default(&mut self) -> Vec<Cell> {
        self.current_braille_viewport_contents(self.show_cursor_default)
    }

    /// Text behind the cells under the viewport. The end is pushed past every
    /// trailing cell that maps to the same character, so a character whose
    /// braille spills past the viewport is still included whole.
    pub fn current_text_viewport_contents(&self) -> String {
        let map = self.cell_to_text();
        let range = self.viewport.cell_range(self.display.columns);
        let start = map.get(range.start).copied().unwrap_or(self.text_chars);
        let end = match range.end.checked_sub(1) {
            None => map.first().copied().unwrap_or(self.text_chars),
            Some(mut index) if index < map.len() => {
                let anchor = map[index];
                while index < map.len() && map[index] == anchor {
                    index += 1;
                }
                map.get(index).copied().unwrap_or(self.text_chars)
            }
            Some(_) => self.text_chars,
        };
        self.text_slice(start, end)
    }

    // Char-indexed substring; bounds clamp and swap when reversed.
    fn text_slice(&self, a: usize, b: usize) -> String {
        let a = a.min(self.text_chars);
        let b = b.min(self.text_chars);
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        self.text.chars().skip(from).take(to - from).collect()
    }

    pub fn offsets_for_slices(&self) -> SliceOffsets {
        let braille_offset = self.viewport.cell_range(self.display.columns).start;
        let text_offset = self
            .cell_to_text()
            .get(braille_offset)
            .copied()
            .unwrap_or(self.text_chars);
        SliceOffsets {
            braille_offset,
            text_offset,
        }
    }

    pub fn fixed_line_count(&self) -> usize {
        self.display.line_count(self.fixed_cells.len())
    }

    pub fn wrapped_line_count(&self) -> usize {
        self.display.line_count(self.wrapped_cells.len())
    }

    /// Line count of the active layout.
    pub fn line_count(&self) -> usize {
        match self.mode {
            PanMode::Fixed => self.fixed_line_count(),
            PanMode::Wrapped => self.wrapped_line_count(),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn display_size(&self) -> DisplaySize {
        self.display
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn mode(&self) -> PanMode {
        self.mode
    }

    pub fn is_wrapped(&self) -> bool {
        self.mode.is_wrapped()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fixed_cells(&self) -> &[Cell] {
        &self.fixed_cells
    }

    pub fn wrapped_cells(&self) -> &[Cell] {
        &self.wrapped_cells
    }

    pub fn fixed_cell_to_text(&self) -> &[usize] {
        &self.fixed_cell_to_text
    }

    pub fn wrapped_cell_to_text(&self) -> &[usize] {
        &self.wrapped_cell_to_text
    }

    /// Cell-to-text map of the active layout.
    pub fn cell_to_text(&self) -> &[usize] {
        match self.mode {
            PanMode::Fixed => &self.fixed_cell_to_text,
            PanMode::Wrapped => &self.wrapped_cell_to_text,
        }
    }

    pub fn metrics(&self) -> &PanMetrics {
        &self.metrics
    }
}
